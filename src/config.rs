//! Project configuration (`deck.yaml`)
//!
//! Every field has a default so a partial file is valid; unknown keys are
//! ignored.

use crate::deck::Deck;
use crate::schema::Outline;
use crate::{EngineConfig, Error, Result, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the project configuration, relative to the project root.
pub const CONFIG_FILE: &str = "deck.yaml";

/// Top-level project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Stable deck identifier; scopes persisted navigation state
    pub id: String,
    pub title: String,
    /// Built-in theme name
    pub theme: String,
    /// URL the dev server (or a static build) serves the deck at
    pub deck_url: String,
    /// Explicit slide count; when absent the outline decides
    pub slide_count: Option<usize>,
    pub export: ExportConfig,
    pub paths: PathsConfig,
    pub commands: CommandsConfig,
    pub publish: PublishConfig,
    pub api: ApiConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: "deck".to_string(),
            title: "Untitled deck".to_string(),
            theme: "slate".to_string(),
            deck_url: "http://localhost:5173/".to_string(),
            slide_count: None,
            export: ExportConfig::default(),
            paths: PathsConfig::default(),
            commands: CommandsConfig::default(),
            publish: PublishConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Browser settings used while exporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub viewport: Viewport,
    pub timeout_ms: u64,
    pub settle_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            viewport: engine.viewport,
            timeout_ms: engine.timeout_ms,
            settle_ms: engine.settle_ms,
        }
    }
}

/// Project directories, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub sources: PathBuf,
    pub assets: PathBuf,
    pub generated: PathBuf,
    /// Bundler output directory
    pub dist: PathBuf,
    /// Static site directory written by `export-static`
    pub site: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: PathBuf::from("sources"),
            assets: PathBuf::from("assets"),
            generated: PathBuf::from("generated"),
            dist: PathBuf::from("dist"),
            site: PathBuf::from("site"),
        }
    }
}

/// Bundler commands, run through the platform shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub dev: String,
    pub build: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            dev: "npm run dev".to_string(),
            build: "npm run build".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub remote: String,
    pub branch: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            branch: "gh-pages".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address the dev API listens on
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:4174".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Engine settings for exports.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            viewport: self.export.viewport,
            timeout_ms: self.export.timeout_ms,
            settle_ms: self.export.settle_ms,
            ..EngineConfig::default()
        }
    }

    /// Resolve the deck: the configured slide count, else the number of
    /// slides in `outline.json` under `root`.
    pub fn deck(&self, root: &Path) -> Result<Deck> {
        let slide_count = match self.slide_count {
            Some(n) => n,
            None => {
                let path = root.join("outline.json");
                let data = std::fs::read_to_string(&path).map_err(|e| {
                    Error::ConfigError(format!(
                        "slide_count is not set and {} is unreadable: {}",
                        path.display(),
                        e
                    ))
                })?;
                let outline: Outline = serde_json::from_str(&data)?;
                outline.slides.len()
            }
        };
        Ok(Deck::new(self.id.clone(), self.deck_url.clone(), slide_count))
    }
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> ProjectConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return ProjectConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<ProjectConfig>(&contents) {
            Ok(config) => {
                log::info!("load_config: Loaded deck '{}' (theme {})", config.id, config.theme);
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                ProjectConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}, using defaults", e);
            ProjectConfig::default()
        }
    }
}

/// Save configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &ProjectConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::ConfigError(format!("Failed to create config directory {:?}: {}", parent, e)))?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| Error::ConfigError(format!("Failed to serialize config to YAML: {}", e)))?;

    std::fs::write(path, yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to write config file {:?}: {}", path, e)))?;

    log::info!("save_config: Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config = load_config(Path::new("/nonexistent/path/deck.yaml"));
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn test_roundtrip_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = ProjectConfig {
            id: "q3-review".to_string(),
            theme: "paper".to_string(),
            slide_count: Some(7),
            ..ProjectConfig::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        std::fs::write(&path, "id: board\nexport:\n  settle_ms: 10\n").unwrap();
        let config = load_config(&path);
        assert_eq!(config.id, "board");
        assert_eq!(config.export.settle_ms, 10);
        assert_eq!(config.export.viewport.width, 1920);
        assert_eq!(config.engine_config().settle_ms, 10);

        std::fs::write(&path, "id: [unterminated").unwrap();
        assert_eq!(load_config(&path), ProjectConfig::default());
    }

    #[test]
    fn test_deck_counts_outline_slides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("outline.json"),
            r#"{"slides":[{"id":"a","type":"title-hero","intent":"x"},{"id":"b","type":"closing","intent":"y"}]}"#,
        )
        .unwrap();
        let deck = ProjectConfig::default().deck(dir.path()).unwrap();
        assert_eq!(deck.slide_count, 2);

        let explicit = ProjectConfig {
            slide_count: Some(5),
            ..ProjectConfig::default()
        };
        assert_eq!(explicit.deck(Path::new("/nonexistent")).unwrap().slide_count, 5);
        assert!(ProjectConfig::default().deck(Path::new("/nonexistent")).is_err());
    }
}
