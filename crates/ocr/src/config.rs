use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tesseract::{DEFAULT_EXECUTABLE, DEFAULT_LANGUAGE};
use crate::upload::DEFAULT_MAX_IMAGE_SIZE;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

/// Receipt image recognition settings.
///
/// ```toml
/// enabled = true
/// max_image_size = 10485760
/// timeout_secs = 30
///
/// [provider]
/// kind = "tesseract"
/// language = "chi_sim+eng"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub enabled: bool,
    /// Largest accepted upload, in bytes.
    pub max_image_size: usize,
    /// Upper bound on one provider call; at least one second.
    pub timeout_secs: u64,
    pub provider: ProviderConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            provider: ProviderConfig::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        if config.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1"));
        }
        Ok(config)
    }

    /// Read the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProviderConfig {
    /// Remote service answering with plain recognized text.
    HttpText {
        #[serde(default)]
        endpoint: String,
    },
    /// Remote service answering with already structured items.
    HttpStructured {
        #[serde(default)]
        endpoint: String,
    },
    Tesseract {
        #[serde(default = "default_executable")]
        executable: String,
        #[serde(default = "default_language")]
        language: String,
        #[serde(default = "default_preprocess")]
        preprocess: bool,
    },
    /// Fixed text, for demos and tests.
    Mock {
        #[serde(default)]
        text: String,
    },
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::HttpText { endpoint: String::new() }
    }
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_preprocess() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = RecognitionConfig::from_toml("").unwrap();
        assert_eq!(cfg, RecognitionConfig::default());
        assert!(cfg.enabled);
        assert_eq!(cfg.max_image_size, 10_485_760);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.provider, ProviderConfig::HttpText { endpoint: String::new() });
    }

    #[test]
    fn tesseract_fields_default() {
        let cfg = RecognitionConfig::from_toml("[provider]\nkind = \"tesseract\"\n").unwrap();
        assert_eq!(
            cfg.provider,
            ProviderConfig::Tesseract {
                executable: "tesseract".to_string(),
                language: "chi_sim+eng".to_string(),
                preprocess: true,
            }
        );
    }

    #[test]
    fn full_config() {
        let text = r#"
enabled = false
max_image_size = 2048
timeout_secs = 5

[provider]
kind = "http-structured"
endpoint = "http://127.0.0.1:9000/ocr"
"#;
        let cfg = RecognitionConfig::from_toml(text).unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.max_image_size, 2048);
        assert_eq!(cfg.timeout(), Duration::from_secs(5));
        assert_eq!(
            cfg.provider,
            ProviderConfig::HttpStructured { endpoint: "http://127.0.0.1:9000/ocr".to_string() }
        );
    }

    #[test]
    fn unknown_provider_kind_is_an_error() {
        let err = RecognitionConfig::from_toml("[provider]\nkind = \"cloud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = RecognitionConfig::from_toml("timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(err.to_string(), "Invalid config: timeout_secs must be at least 1");

        let cfg = RecognitionConfig { timeout_secs: 0, ..Default::default() };
        assert_eq!(cfg.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RecognitionConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, RecognitionConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("billsnap.toml");
        std::fs::write(&path, "[provider]\nkind = \"mock\"\ntext = \"a 1月1日 10:00 -1\"\n").unwrap();
        let cfg = RecognitionConfig::load(&path).unwrap();
        assert_eq!(cfg.provider, ProviderConfig::Mock { text: "a 1月1日 10:00 -1".to_string() });
    }
}
