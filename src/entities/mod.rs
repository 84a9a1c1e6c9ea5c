pub mod id_map;
