//! Configuration for mksprite
//!
//! Provides types and parsing for the `mksprite.toml` settings file.

pub mod loader;
pub mod schema;

pub use loader::{
    check, find_config, find_config_from, load_config, merge_cli_overrides, CliOverrides,
    ConfigError, CONFIG_FILE_NAME,
};
pub use schema::*;
