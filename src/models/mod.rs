pub mod identity;

pub use identity::{ContentType, IdentityRecord, MediaType, Provider};
