//! Configuration file parsing and data locations

use log::debug;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::VitalLogError;

const APP_DIR: &str = "vitallog";
const CONFIG_FILE: &str = "config.txt";
const DATABASE_FILE: &str = "vitallog.db";

const DEFAULT_CONFIG: &str = "\
# VitalLog configuration
#
# Lines are \"key value\"; everything after # is ignored.
#
# Database file (default: vitallog.db in the data directory)
# database_path /path/to/vitallog.db
#
# Directory for backups and reports (default: Documents folder)
# export_dir /path/to/exports
";

/// Configuration loaded from config.txt
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub database_path: Option<String>,
    pub export_dir: Option<String>,
    /// Keys this version does not know
    pub extra: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VitalLogError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut config = Config::default();

        for line in reader.lines() {
            let line = line?;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, rest)) = Self::parse_line(line) {
                // Value ends at a trailing comment
                let value = rest.split('#').next().unwrap_or("").trim();
                if value.is_empty() {
                    continue;
                }
                match key {
                    "database_path" => config.database_path = Some(value.to_string()),
                    "export_dir" => config.export_dir = Some(value.to_string()),
                    other => {
                        debug!("Unknown config key: {}", other);
                        config.extra.insert(other.to_string(), value.to_string());
                    }
                }
            }
        }

        Ok(config)
    }

    /// Split "key value" at the first whitespace
    fn parse_line(line: &str) -> Option<(&str, &str)> {
        let mut parts = line.splitn(2, |c: char| c.is_whitespace());
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();

        if key.is_empty() || value.is_empty() {
            return None;
        }

        Some((key, value))
    }

    /// Write a commented template
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<(), VitalLogError> {
        fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_export_dir)
    }
}

/// `<OS data dir>/vitallog`, or `./vitallog` when the OS has none
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}

pub fn config_file_path() -> PathBuf {
    get_data_dir().join(CONFIG_FILE)
}

/// Documents folder, then home, then the current directory
pub fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn ensure_data_dir() -> Result<PathBuf, VitalLogError> {
    let dir = get_data_dir();
    fs::create_dir_all(&dir)?;
    Ok(dir)
}
