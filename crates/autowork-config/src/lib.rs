//! Configuration surface for Autowork binaries.
//!
//! Owns the on-disk layout of the config directory, the `config.json` model with
//! its validation rules, and the interactive wizard behind `autowork config`.

pub mod config_paths;
pub mod config_wizard;
pub mod watcher_config;

pub use config_paths::{resolve_config_dir, AutoworkPaths, DEFAULT_CONFIG_DIR_NAME};
pub use config_wizard::{run_config_wizard, WizardDefaults};
pub use watcher_config::{load_config, save_config, AutoworkConfig};
