//! Configuration file parsing
//!
//! Supports `<config_dir>/config.toml` with `[tabs]`, `[editor]` and
//! `[storage]` sections.

pub mod settings;
pub mod types;

pub use settings::{
    default_config_dir, init_config_dir, load_settings, resolve_log_dir, resolve_state_dir,
};
pub use types::*;
