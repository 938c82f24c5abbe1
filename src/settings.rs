use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConvertError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Where statement exports are downloaded to.
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    /// Card filter used for Isracard exports when none is given.
    #[serde(default)]
    pub card_number: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            card_number: String::new(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledgerize")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir_string() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
        .to_string_lossy()
        .to_string()
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<PathBuf> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ConvertError::Settings(e.to_string()))?;
    let path = settings_path();
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(path)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

/// Relative inputs that do not exist in the working directory are looked up
/// in the data directory.
pub fn resolve_input(file: &str, settings: &Settings) -> PathBuf {
    let path = PathBuf::from(shellexpand_path(file));
    if path.is_absolute() || path.exists() {
        return path;
    }
    let candidate = Path::new(&settings.data_dir).join(&path);
    if candidate.exists() {
        candidate
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            card_number: "4321".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let loaded = load_settings_from(&path);
        assert_eq!(loaded.card_number, "4321");
        assert_eq!(loaded.data_dir, "/tmp/test");
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert!(s.card_number.is_empty());
        assert!(s.data_dir.ends_with("Downloads"));
    }

    #[test]
    fn test_load_returns_defaults_when_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let s = load_settings_from(&path);
        assert!(s.card_number.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"card_number": "1111"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.card_number, "1111");
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_resolve_input_falls_back_to_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stmt-ledgerize-test.csv"), "a\n").unwrap();
        let settings = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            card_number: String::new(),
        };
        assert_eq!(
            resolve_input("stmt-ledgerize-test.csv", &settings),
            dir.path().join("stmt-ledgerize-test.csv")
        );
        assert_eq!(
            resolve_input("absent-ledgerize-test.csv", &settings),
            PathBuf::from("absent-ledgerize-test.csv")
        );
    }
}
