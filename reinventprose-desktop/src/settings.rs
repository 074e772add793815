//! Application settings persistence for ReinventProse.
//!
//! Stores user preferences (library file, export folder, export language) in
//! a JSON file at an OS-appropriate location. The pane layout lives in the
//! same directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides [`AppSettings::database_path`] when set.
pub const DATABASE_ENV_VAR: &str = "REINVENTPROSE_DB";

const DATABASE_FILE_NAME: &str = "reinventprose_v2_data.db";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// The SQLite library opened at start-up.
    pub database_path: String,
    /// Folder proposed in the export dialog.
    pub export_directory: String,
    /// `es` or `en`; selects the fixed words written into exports.
    pub export_language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        let documents = default_documents_directory();
        Self {
            database_path: documents.join(DATABASE_FILE_NAME).to_string_lossy().to_string(),
            export_directory: documents.to_string_lossy().to_string(),
            export_language: "es".to_string(),
        }
    }
}

impl AppSettings {
    /// The library to open, honouring the `REINVENTPROSE_DB` override.
    pub fn resolved_database_path(&self) -> PathBuf {
        resolve_database_path(self, std::env::var_os(DATABASE_ENV_VAR).map(PathBuf::from))
    }
}

fn resolve_database_path(settings: &AppSettings, env_override: Option<PathBuf>) -> PathBuf {
    env_override
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(&settings.database_path))
}

/// Returns the directory holding `settings.json` and `layout.json`.
///
/// - macOS / Linux: `~/.config/reinventprose`
/// - Windows: `%APPDATA%/ReinventProse`
pub fn config_directory() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("ReinventProse")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("reinventprose")
    }
}

pub fn settings_file_path() -> PathBuf {
    config_directory().join("settings.json")
}

pub fn layout_file_path() -> PathBuf {
    config_directory().join("layout.json")
}

/// Where the window reads and writes its settings and pane layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub settings_file: PathBuf,
    pub layout_file: PathBuf,
}

impl ConfigPaths {
    /// The per-user files under [`config_directory`].
    pub fn user() -> Self {
        Self {
            settings_file: settings_file_path(),
            layout_file: layout_file_path(),
        }
    }

    /// Both files inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings_file: dir.join("settings.json"),
            layout_file: dir.join("layout.json"),
        }
    }
}

/// Returns the default data directory: `~/Documents/ReinventProse`.
pub fn default_documents_directory() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Documents")
        })
        .join("ReinventProse")
}

/// Loads settings from disk; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> AppSettings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt settings file {}: {e}", path.display());
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    }
}

/// Saves settings to disk, creating parent directories as needed.
pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings directory: {e}"))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, json).map_err(|e| format!("Failed to write settings: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert!(settings.database_path.ends_with(DATABASE_FILE_NAME));
        assert_eq!(settings.export_language, "es");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = AppSettings {
            database_path: "/tmp/books.db".to_string(),
            export_directory: "/tmp/out".to_string(),
            export_language: "en".to_string(),
        };
        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"exportLanguage":"en"}"#).unwrap();
        let settings = load_settings_from(&path);
        assert_eq!(settings.export_language, "en");
        assert_eq!(settings.database_path, AppSettings::default().database_path);
    }

    #[test]
    fn test_corrupt_or_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings_from(&path), AppSettings::default());
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings_from(&path), AppSettings::default());
    }

    #[test]
    fn test_config_paths_in_dir() {
        let dir = tempdir().unwrap();
        let paths = ConfigPaths::in_dir(dir.path());
        assert_eq!(paths.settings_file, dir.path().join("settings.json"));
        assert_eq!(paths.layout_file, dir.path().join("layout.json"));
        assert_eq!(ConfigPaths::user().settings_file, settings_file_path());
    }

    #[test]
    fn test_env_override_wins_unless_empty() {
        let settings = AppSettings::default();
        assert_eq!(
            resolve_database_path(&settings, Some(PathBuf::from("/data/other.db"))),
            PathBuf::from("/data/other.db")
        );
        assert_eq!(
            resolve_database_path(&settings, Some(PathBuf::new())),
            PathBuf::from(&settings.database_path)
        );
        assert_eq!(
            resolve_database_path(&settings, None),
            PathBuf::from(&settings.database_path)
        );
    }
}
