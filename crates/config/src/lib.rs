//! Configuration loading, validation, env substitution, and persistence.
//!
//! Config files: `herald.toml`, `herald.yaml`, `herald.yml` or `herald.json`
//! Searched in `./` then `~/.config/herald/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        clear_config_dir, config_dir, discover_and_load, find_config_file,
        find_or_default_config_path, load_config, save_config, set_config_dir,
        update_destinations,
    },
    schema::{ChannelsConfig, GotifyConfig, HeraldConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
