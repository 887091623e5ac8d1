//! # Configuration
//!
//! Application settings are loaded with [`confique`], layered in priority order:
//! 1. **Environment variables**: `KUEBIKO_BACKEND`, `KUEBIKO_DATA_DIR`, `KUEBIKO_FILE_EXT`.
//! 2. **Config file**: `kuebiko.toml` in the data directory.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backend` | `file` | `file` or `memory` |
//! | `data_dir` | OS data dir | Where the file backend keeps notes |
//! | `file_ext` | `.txt` | Extension for note body files |
//!
//! The file backend receives these as DAO parameters through
//! [`KuebikoConfig::to_dao_params`].

use crate::dao::{DaoParameter, DaoParams};
use crate::error::{KuebikoError, Result};
use confique::Config;
use directories::ProjectDirs;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILENAME: &str = "kuebiko.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Memory,
}

impl FromStr for Backend {
    type Err = KuebikoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            other => Err(KuebikoError::Configuration(format!(
                "Unknown backend [{}], expected \"file\" or \"memory\".",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::File => f.write_str("file"),
            Backend::Memory => f.write_str("memory"),
        }
    }
}

/// Configuration for kuebiko, stored in `kuebiko.toml`.
#[derive(Config, Debug, Clone, PartialEq, Eq)]
pub struct KuebikoConfig {
    /// Storage backend: "file" or "memory".
    #[config(env = "KUEBIKO_BACKEND", default = "file")]
    pub backend: String,

    /// Directory for the file backend. Defaults to the OS data directory.
    #[config(env = "KUEBIKO_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Extension for note body files (e.g. ".txt", ".md").
    #[config(env = "KUEBIKO_FILE_EXT", default = ".txt")]
    pub file_ext: String,
}

impl Default for KuebikoConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            data_dir: None,
            file_ext: ".txt".to_string(),
        }
    }
}

impl KuebikoConfig {
    /// Loads env overrides on top of `kuebiko.toml` in `config_dir`, if present.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config = Self::builder()
            .env()
            .file(config_dir.as_ref().join(CONFIG_FILENAME))
            .load()?;
        Ok(config)
    }

    /// Finds the data directory and loads `kuebiko.toml` from it.
    ///
    /// The directory is `dir` when given, otherwise whatever the environment
    /// layer says, otherwise [`default_data_dir`]. The file can't move the
    /// directory it lives in, so only the environment layer is consulted for it.
    pub fn locate(dir: Option<&Path>) -> Result<Self> {
        let base_dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => match Self::builder().env().load()?.data_dir {
                Some(dir) => dir,
                None => default_data_dir()?,
            },
        };

        let mut config = Self::load(&base_dir)?;
        if dir.is_some() || config.data_dir.is_none() {
            config.data_dir = Some(base_dir);
        }
        Ok(config)
    }

    pub fn backend(&self) -> Result<Backend> {
        self.backend.parse()
    }

    /// The file extension, normalized to start with a dot.
    pub fn file_ext(&self) -> String {
        if self.file_ext.starts_with('.') {
            self.file_ext.clone()
        } else {
            format!(".{}", self.file_ext)
        }
    }

    /// The configured directory, falling back to the OS data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn to_dao_params(&self) -> Result<DaoParams> {
        let dir = self.data_dir()?;
        Ok(DaoParams::new()
            .with(DaoParameter::Directory, dir.to_string_lossy())
            .with(DaoParameter::FileExtension, self.file_ext()))
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "kuebiko", "kuebiko")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            KuebikoError::Configuration("Could not determine a data directory".to_string())
        })
}
