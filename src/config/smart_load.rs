use std::path::Path;

use figment::providers::{Data, Format, Json, Toml, Yaml};
use figment::value::{Dict, Map};
use figment::{Metadata, Profile, Provider};

/// Configuration file formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by a file extension, if it is a known one
    pub fn from_extension(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }
}

/// Provider for a config file, choosing the format from its extension.
///
/// Files with an unknown extension are sniffed; TOML is the fallback.
pub fn auto<P: AsRef<Path>>(path: P) -> impl Provider {
    let path = path.as_ref();
    let format = ConfigFormat::from_extension(path).unwrap_or_else(|| {
        let detected = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| detect_format_from_content(&content));
        tracing::debug!(path = %path.display(), ?detected, "config file has no known extension");
        detected.unwrap_or(ConfigFormat::Toml)
    });

    match format {
        ConfigFormat::Toml => SmartProvider::Toml(Toml::file(path)),
        ConfigFormat::Json => SmartProvider::Json(Json::file(path)),
        ConfigFormat::Yaml => SmartProvider::Yaml(Yaml::file(path)),
    }
}

/// Wrapper enum to handle different provider types
enum SmartProvider {
    Toml(Data<Toml>),
    Json(Data<Json>),
    Yaml(Data<Yaml>),
}

impl Provider for SmartProvider {
    fn metadata(&self) -> Metadata {
        match self {
            SmartProvider::Toml(p) => p.metadata(),
            SmartProvider::Json(p) => p.metadata(),
            SmartProvider::Yaml(p) => p.metadata(),
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        match self {
            SmartProvider::Toml(p) => p.data(),
            SmartProvider::Json(p) => p.data(),
            SmartProvider::Yaml(p) => p.data(),
        }
    }
}

/// Guess the format of a flat settings file from its content
fn detect_format_from_content(content: &str) -> Option<ConfigFormat> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(ConfigFormat::Json);
    }

    let mut lines = trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    match lines.next() {
        Some(line) if line == "---" || line.split_once(':').is_some_and(|(key, _)| !key.contains('=')) => {
            Some(ConfigFormat::Yaml)
        }
        Some(line) if line.contains('=') || line.starts_with('[') => Some(ConfigFormat::Toml),
        _ => None,
    }
}
