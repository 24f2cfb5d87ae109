// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that snipsync uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! caller to figure out.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Snipsync configuration layout.
///
/// # General Layout
///
/// The configuration is composed of a general section, and one optional
/// section per remote backend. The general section names the primary snippet
/// file, any auxiliary snippet directories, the sort order of listed
/// snippets, and which remote backend to sync the primary snippet file with.
/// Only the section of the selected backend is ever consulted.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Config {
    /// General settings.
    pub general: GeneralSettings,

    /// Settings for the file backend.
    pub file: Option<FileRemoteSettings>,
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        config.general.snippet_file = expand_path(&config.general.snippet_file)?;
        config.general.snippet_dirs = config
            .general
            .snippet_dirs
            .iter()
            .map(|dir| expand_path(dir))
            .collect::<Result<Vec<_>>>()?;
        if let Some(file) = config.file.as_mut() {
            file.path = expand_path(&file.path)?;
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// General configuration settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    /// Primary snippet file. This is the only file that gets synced.
    pub snippet_file: PathBuf,

    /// Directories scanned for additional snippet files.
    #[serde(default)]
    pub snippet_dirs: Vec<PathBuf>,

    /// Sort order of snippets, e.g., "recency", "-command".
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Remote backend to sync the primary snippet file with.
    #[serde(default)]
    pub backend: Backend,

    /// Sync right after a new snippet is added.
    #[serde(default)]
    pub auto_sync: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            snippet_file: PathBuf::new(),
            snippet_dirs: Vec::new(),
            sort_by: default_sort_by(),
            backend: Backend::default(),
            auto_sync: false,
        }
    }
}

fn default_sort_by() -> String {
    "recency".into()
}

/// Remote backend selector.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote copy lives at a plain file path, e.g., a shared mount.
    #[default]
    File,
}

impl Display for Backend {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::File => fmt.write_str("file"),
        }
    }
}

/// File backend settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct FileRemoteSettings {
    /// Path of the remote copy of the primary snippet file.
    pub path: PathBuf,
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
