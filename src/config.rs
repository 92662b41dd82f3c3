use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};

use crate::ibroadcast_rs::{ApiConfig, CLIENT_NAME, DEFAULT_API_URL, DEFAULT_UPLOAD_URL};
use crate::library::FieldPolicy;
use crate::services::ibroadcast::SessionOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// iBroadcast account email address
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// The checksum list and upload endpoints are undocumented
    #[serde(default = "default_true")]
    pub allow_undocumented_apis: bool,
    /// Fail instead of guessing when the library map lacks a field
    #[serde(default)]
    pub strict_field_map: bool,
    /// Extensions to upload; asked from the server when unset
    #[serde(default)]
    pub upload_extensions: Option<Vec<String>>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
}

fn default_device_name() -> String {
    CLIENT_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            device_name: default_device_name(),
            allow_undocumented_apis: true,
            strict_field_map: false,
            upload_extensions: None,
            api_url: default_api_url(),
            upload_url: default_upload_url(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("ibroadcast-manager").join("config.toml"))
    }

    /// Load the default config file, or the built-in defaults if there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the config path unless a file is already there
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("Could not determine the config directory")?;
        if path.exists() {
            tracing::info!("Config file already exists: {}", path.display());
            return Ok(path);
        }
        Self::default().write_to(&path)?;
        Ok(path)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn api_config(&self) -> Result<ApiConfig> {
        ApiConfig::new(&self.api_url, &self.upload_url, &self.device_name)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            field_policy: if self.strict_field_map {
                FieldPolicy::Strict
            } else {
                FieldPolicy::Fallback
            },
            allow_undocumented_apis: self.allow_undocumented_apis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_file;

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_dir, path) = temp_file("config.toml", b"");
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_from_file() {
        let (_dir, path) = temp_file(
            "config.toml",
            br#"
username = "me@example.com"
device_name = "desktop"
strict_field_map = true
allow_undocumented_apis = false
upload_extensions = [".mp3", ".flac"]
"#,
        );
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.username.as_deref(), Some("me@example.com"));
        assert_eq!(config.password, None);
        assert_eq!(config.device_name, "desktop");
        assert_eq!(
            config.upload_extensions,
            Some(vec![".mp3".to_string(), ".flac".to_string()])
        );
        assert_eq!(config.api_url, DEFAULT_API_URL);

        let options = config.session_options();
        assert_eq!(options.field_policy, FieldPolicy::Strict);
        assert!(!options.allow_undocumented_apis);
    }

    #[test]
    fn test_invalid_file() {
        let (_dir, path) = temp_file("config.toml", b"username = [");
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            username: Some("me@example.com".to_string()),
            ..Config::default()
        };

        config.write_to(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_api_config_uses_urls() {
        let config = Config {
            api_url: "http://localhost:8080/s/JSON/".to_string(),
            ..Config::default()
        };
        let api = config.api_config().unwrap();
        assert_eq!(api.api_url.as_str(), "http://localhost:8080/s/JSON/");
        assert_eq!(api.device_name, CLIENT_NAME);
    }
}
