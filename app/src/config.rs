use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Where the config was loaded from. Kept for error messages only,
    /// so it is not part of the file format.
    #[serde(skip)]
    pub path: PathBuf,

    /// Scan archives inspected by `check-e57`.
    pub e57_files: Vec<String>,

    /// Point files loaded by `diagnose-slabs`, concatenated in list order.
    /// Entries may contain glob patterns.
    pub xyz_filenames: Vec<String>,

    /// Bottom floor slab thickness in meters.
    pub bfs_thickness: f64,

    /// Top floor slab thickness in meters.
    pub tfs_thickness: f64,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.path = path.to_path_buf();
        Ok(config)
    }

    pub fn first_e57_file(&self) -> Result<&str, ConfigError> {
        match self.e57_files.first() {
            Some(file) => Ok(file),
            None => Err(ConfigError::EmptyList {
                path: self.path.clone(),
                field: "e57_files",
            }),
        }
    }

    pub fn xyz_files(&self) -> Result<&[String], ConfigError> {
        if self.xyz_filenames.is_empty() {
            return Err(ConfigError::EmptyList {
                path: self.path.clone(),
                field: "xyz_filenames",
            });
        }
        Ok(&self.xyz_filenames)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config {} lists no {field}", .path.display())]
    EmptyList { path: PathBuf, field: &'static str },
}
