pub mod anime_map;
pub use anime_map::{AnimeMapTable, MappingEntry};

pub mod resolver;
pub use resolver::{ResolveError, Resolver};

pub mod maintenance;
pub use maintenance::{MaintenanceService, OptimizeReport};
