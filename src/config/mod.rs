//! Layered configuration for the command-line tool
//!
//! Settings are merged with figment from, in increasing priority: the embedded
//! `default-config.toml`, `~/.config/parallelize/config.{toml,json,yaml,yml}`,
//! `parallelize.{toml,json,yaml,yml}` in the working directory, an explicit
//! `--config FILE`, `PARALLELIZE_*` environment variables and command-line flags.

pub mod core;
pub mod smart_load;

pub use self::core::{ParallelizeConfig, Settings, SettingsOverrides};
