use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::finder::FinderOptions;

const APP_DIR: &str = "fastssh";
const SETTINGS_FILE: &str = "fastssh.toml";

pub const DEFAULT_ADDRESS_BOOK: &str = ".fastsshrc";
pub const DEFAULT_SCRIPT_FILE: &str = ".fast_login.sh";
pub const DEFAULT_INTERPRETER: &str = "expect";
pub const DEFAULT_EXPECT_TIMEOUT: u32 = 30;
pub const DEFAULT_FINDER_HEIGHT: u16 = 30;

/// Persistent user settings, stored as TOML in the config directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Address book file name, relative to the home directory.
    pub address_book: String,
    /// Generated login script file name, relative to the home directory.
    pub script_file: String,
    pub interpreter: String,
    /// Seconds `expect` waits for the password prompt.
    pub expect_timeout: u32,
    /// Finder height in percent of the terminal.
    pub finder_height: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address_book: DEFAULT_ADDRESS_BOOK.to_string(),
            script_file: DEFAULT_SCRIPT_FILE.to_string(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            expect_timeout: DEFAULT_EXPECT_TIMEOUT,
            finder_height: DEFAULT_FINDER_HEIGHT,
        }
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    settings_file: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(APP_DIR);
        Self::with_dir(config_dir)
    }

    pub fn with_dir(config_dir: PathBuf) -> Result<Self> {
        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        }

        Ok(Self {
            settings_file: config_dir.join(SETTINGS_FILE),
        })
    }

    pub fn load_settings(&self) -> Result<Settings> {
        // If settings file doesn't exist, create it with default values
        if !self.settings_file.exists() {
            self.save_settings(&Settings::default())?;
        }

        let content =
            fs::read_to_string(&self.settings_file).context("Failed to read settings file")?;

        let mut settings: Settings =
            toml::from_str(&content).context("Failed to parse settings file")?;

        settings.finder_height = settings.finder_height.clamp(1, 100);
        if settings.interpreter.trim().is_empty() {
            settings.interpreter = DEFAULT_INTERPRETER.to_string();
        }

        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let toml = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.settings_file, toml).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_file
    }
}

/// Everything a run needs, resolved once at startup and handed to each
/// component.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub address_book: PathBuf,
    pub script_path: PathBuf,
    pub interpreter: String,
    pub expect_timeout: u32,
    pub finder: FinderOptions,
}

impl AppConfig {
    /// `file` overrides the settings' address book; relative names resolve
    /// against `home`.
    pub fn resolve(home: &Path, settings: &Settings, file: Option<&str>) -> Self {
        let book = file.unwrap_or(&settings.address_book);
        Self {
            address_book: home.join(book),
            script_path: home.join(&settings.script_file),
            interpreter: settings.interpreter.clone(),
            expect_timeout: settings.expect_timeout,
            finder: FinderOptions {
                height_percent: settings.finder_height,
                ..FinderOptions::default()
            },
        }
    }
}
