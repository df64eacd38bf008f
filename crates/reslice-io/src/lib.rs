//! File persistence for coordinate maps and session configuration.

pub mod config;
pub mod coordinate_map;

pub use config::{read_session_config, write_session_config};
pub use coordinate_map::{read_coordinate_map, read_linear_map, write_coordinate_map, write_linear_map};
