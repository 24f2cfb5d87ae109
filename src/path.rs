// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations for the configuration file and the primary
//! snippet file. None of these functions check if the path returned actually
//! exists.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the configuration directory.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/snipsync`, falling back to
/// `~/.config/snipsync` on platforms without a configuration directory.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_dir() -> Result<PathBuf> {
    match dirs::config_dir() {
        Some(path) => Ok(path.join("snipsync")),
        None => home_dir().map(|path| path.join(".config").join("snipsync")),
    }
}

/// Determine default absolute path to the configuration file.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_config_file() -> Result<PathBuf> {
    default_config_dir().map(|path| path.join("config.toml"))
}

/// Determine default absolute path to the primary snippet file.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_snippet_file() -> Result<PathBuf> {
    default_config_dir().map(|path| path.join("snippet.toml"))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
