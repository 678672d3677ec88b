use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::revision_service::PromptSettings;

pub const DEFAULT_SERVICE_URL: &str = "https://openai.xiaopei0206.workers.dev";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path or http(s) URL of the JSON sentence list
    pub sentences: String,
    /// Overrides the default progress file location
    pub progress_file: Option<PathBuf>,
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub prompt: PromptSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentences: "sentences.json".to_string(),
            progress_file: None,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout_secs: 60,
            prompt: PromptSettings::default(),
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Reads `file_path`; a missing file yields the defaults.
pub fn load_config_from_file(file_path: &Path) -> Result<Config, ConfigError> {
    match fs::read_to_string(file_path) {
        Ok(contents) => toml::from_str::<Config>(&contents).map_err(|source| ConfigError::Parse {
            path: file_path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(
                "No config at {}; using defaults",
                file_path.display()
            );
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: file_path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "sentences = \"https://example.com/s.json\"\n[prompt]\nsource_language = \"Japanese\"\n",
        )
        .unwrap();
        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.sentences, "https://example.com/s.json");
        assert_eq!(config.prompt.source_language, "Japanese");
        assert_eq!(config.prompt.target_language, "English");
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sentences = [").unwrap();
        assert!(matches!(
            load_config_from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
