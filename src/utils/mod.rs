pub mod chunkpipe_toml;
pub mod config;
pub mod logger;

pub use config::*;
pub use logger::{Colors, setup_logging};
