use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use super::smart_load;
use crate::parallel::{DispatchConfig, Dispatcher, ParallelError, ProgressMode};

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const REPO_CONFIG_FILES: [&str; 4] = [
    "parallelize.toml",
    "parallelize.json",
    "parallelize.yaml",
    "parallelize.yml",
];

const ENV_PREFIX: &str = "PARALLELIZE_";

/// Effective settings after all configuration layers are merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker count; unset means every logical CPU
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    pub chunk_size: usize,
    pub progress: ProgressMode,
    /// Pass each item's position to the task
    pub enumerate: bool,
    /// Evaluate on the calling thread
    pub sequential: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let dispatch = DispatchConfig::default();
        Self {
            workers: dispatch.workers,
            chunk_size: dispatch.chunk_size,
            progress: dispatch.progress,
            enumerate: false,
            sequential: false,
        }
    }
}

impl Settings {
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            workers: self.workers,
            chunk_size: self.chunk_size,
            progress: self.progress,
        }
    }

    /// Build the dispatcher these settings describe
    pub fn dispatcher(&self) -> std::result::Result<Dispatcher, ParallelError> {
        if self.sequential {
            Dispatcher::sequential(self.dispatch_config())
        } else {
            Dispatcher::new(self.dispatch_config())
        }
    }
}

/// Command-line values layered over every other source; unset fields are skipped
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enumerate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential: Option<bool>,
}

pub struct ParallelizeConfig {
    figment: Figment,
}

impl ParallelizeConfig {
    /// Merge every configuration layer, lowest priority first:
    /// embedded defaults, user config, repository config, `custom_config`,
    /// `PARALLELIZE_*` environment variables, then `cli_overrides`.
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        for extension in ["toml", "json", "yaml", "yml"] {
            let path = format!("{}.{extension}", Self::user_config_base_path());
            figment = figment.merge(smart_load::auto(path));
        }
        for name in REPO_CONFIG_FILES {
            figment = figment.merge(smart_load::auto(name));
        }

        if let Some(path) = custom_config {
            if !Path::new(path).is_file() {
                anyhow::bail!("config file not found: {path}");
            }
            tracing::debug!(path, "loading custom config");
            figment = figment.merge(smart_load::auto(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(Self { figment })
    }

    /// Extract and validate the merged settings
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .context("invalid parallelize configuration")?;
        settings.dispatch_config().validate()?;
        Ok(settings)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/parallelize/config"),
            Err(_) => "~/.config/parallelize/config".to_string(),
        }
    }
}
