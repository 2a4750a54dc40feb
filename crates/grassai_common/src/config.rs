//! grassai configuration
//!
//! Optional TOML configuration read from ~/.config/grassai/config.toml.
//! Every field has a default, so a missing file or a partial file is fine.
//! CLI flags always override what is configured here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "grassai";
const CONFIG_FILE: &str = "config.toml";

/// Ollama service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Base URL of the Ollama HTTP API
    #[serde(default = "default_url")]
    pub url: String,

    /// Model passed to /api/generate
    #[serde(default = "default_model")]
    pub model: String,

    /// Bound on a single generate call (seconds, valid: 5-600)
    #[serde(default = "default_generate_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1:latest".to_string()
}

fn default_generate_timeout() -> u64 {
    120
}

impl OllamaSettings {
    /// Clamp timeout_secs to the valid range (5-600)
    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.clamp(5, 600)
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            model: default_model(),
            timeout_secs: default_generate_timeout(),
        }
    }
}

/// Settings for executing suggested commands (-e flag)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteSettings {
    /// Abort the remaining suggested commands after the first failure
    #[serde(default = "default_stop_on_failure")]
    pub stop_on_failure: bool,

    /// Bound on one executed command (seconds)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_stop_on_failure() -> bool {
    true
}

fn default_command_timeout() -> u64 {
    60
}

impl Default for ExecuteSettings {
    fn default() -> Self {
        Self {
            stop_on_failure: default_stop_on_failure(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaSettings,

    #[serde(default)]
    pub execute: ExecuteSettings,
}

impl Config {
    /// Path of the user config file, if a config directory exists
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the user config, falling back to defaults when the file is
    /// missing or unreadable. A malformed file is reported, not fatal.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path (used by tests)
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };

        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert_eq!(config.ollama.model, "llama3.1:latest");
        assert_eq!(config.ollama.timeout_secs, 120);
        assert!(config.execute.stop_on_failure);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/grassai/config.toml"));
        assert_eq!(config.ollama.model, "llama3.1:latest");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[ollama]\nmodel = \"qwen2.5:3b\"").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.ollama.model, "qwen2.5:3b");
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert_eq!(config.execute.command_timeout_secs, 60);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "ollama = not valid toml [").unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.ollama.model, "llama3.1:latest");
    }

    #[test]
    fn test_timeout_clamped() {
        let settings = OllamaSettings {
            timeout_secs: 100_000,
            ..Default::default()
        };
        assert_eq!(settings.effective_timeout_secs(), 600);

        let settings = OllamaSettings {
            timeout_secs: 1,
            ..Default::default()
        };
        assert_eq!(settings.effective_timeout_secs(), 5);
    }
}
