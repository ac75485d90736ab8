//! Application configuration management.
//!
//! This module handles the persistent configuration for segmark: where the
//! annotation table lives, the fixed segment window length, and the
//! enumerated class label set. Configuration is stored in the user's config
//! directory (typically ~/.config/segmark/config.toml). A class's id is its
//! index in the `classes` list, so reordering the list renumbers the labels
//! stored from then on.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::constants::DEFAULT_WINDOW_MS;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_annotations_file")]
    pub annotations_file: String,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_classes")]
    pub classes: Vec<String>,
}

fn default_annotations_file() -> String {
    "annotations.csv".to_string()
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW_MS
}

fn default_classes() -> Vec<String> {
    vec![
        "Male".to_string(),
        "Female".to_string(),
        "Engine_rev".to_string(),
        "No_sound".to_string(),
        "Music".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            annotations_file: default_annotations_file(),
            window_ms: default_window_ms(),
            classes: default_classes(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("segmark")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("segmark")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Location of the annotation table, with `~` expanded.
    pub fn annotations_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.annotations_file).as_ref())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "annotations_file" => {
                if value.is_empty() {
                    return Err("annotations_file cannot be empty".into());
                }
                self.annotations_file = value.to_string();
            }
            "window_ms" => {
                let window_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a positive integer")?;
                if window_ms == 0 {
                    return Err("window_ms must be greater than zero".into());
                }
                self.window_ms = window_ms;
            }
            "classes" => {
                let classes: Vec<String> = value
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                if classes.is_empty() {
                    return Err("Class list cannot be empty".into());
                }
                self.classes = classes;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}
