// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote backends.
//!
//! A remote backend holds a single copy of the primary snippet file, along
//! with the time it was last updated. Snipsync only ever needs two things from
//! a remote backend: fetch the current copy, and replace it. Which backend is
//! used gets decided once through [`open_remote`]. Nothing past that point
//! cares which backend it talks to.

use crate::config::{Backend, Config, FileRemoteSettings};

use chrono::{DateTime, Utc};
use std::{
    fs::{metadata, read_to_string, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Point-in-time copy of the primary snippet file held by a remote backend.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Serialized snippet file content.
    pub content: String,

    /// Time the remote copy was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Construct new snapshot.
    pub fn new(content: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            updated_at,
        }
    }
}

/// Layer of indirection for remote backend access.
pub trait RemoteClient {
    /// Fetch current remote copy of primary snippet file.
    fn fetch_snapshot(&self) -> Result<Snapshot>;

    /// Replace remote copy of primary snippet file.
    fn push_snippet(&self, content: &str) -> Result<()>;
}

impl<R> RemoteClient for Box<R>
where
    R: RemoteClient + ?Sized,
{
    fn fetch_snapshot(&self) -> Result<Snapshot> {
        (**self).fetch_snapshot()
    }

    fn push_snippet(&self, content: &str) -> Result<()> {
        (**self).push_snippet(content)
    }
}

/// Select remote backend based on configuration.
///
/// # Errors
///
/// - Return [`RemoteError::Unconfigured`] if the settings section of the
///   selected backend is missing.
pub fn open_remote(config: &Config) -> Result<Box<dyn RemoteClient>> {
    match config.general.backend {
        Backend::File => {
            let settings = config.file.as_ref().ok_or(RemoteError::Unconfigured {
                backend: Backend::File,
            })?;
            Ok(Box::new(FileRemote::from_settings(settings)))
        }
    }
}

/// Remote copy kept at a plain file path.
///
/// Meant for shared mounts or folders synced by some other tool. The
/// modification time of the file acts as the update time of the remote copy.
/// A missing file is treated as an empty remote copy that was last updated at
/// the Unix epoch, so any existing local snippet file wins the first sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRemote {
    path: PathBuf,
}

impl FileRemote {
    /// Construct new file backend.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Construct new file backend from its configuration settings.
    pub fn from_settings(settings: &FileRemoteSettings) -> Self {
        Self::new(&settings.path)
    }

    /// Path of remote copy.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl RemoteClient for FileRemote {
    #[instrument(skip(self), level = "debug")]
    fn fetch_snapshot(&self) -> Result<Snapshot> {
        let updated_at = match metadata(&self.path) {
            Ok(meta) => meta.modified().map_err(|err| RemoteError::ReadRemote {
                source: err,
                path: self.path.clone(),
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no remote copy at {:?} yet", self.path.display());
                return Ok(Snapshot::new("", DateTime::<Utc>::UNIX_EPOCH));
            }
            Err(err) => {
                return Err(RemoteError::ReadRemote {
                    source: err,
                    path: self.path.clone(),
                });
            }
        };

        let content = read_to_string(&self.path).map_err(|err| RemoteError::ReadRemote {
            source: err,
            path: self.path.clone(),
        })?;

        Ok(Snapshot::new(content, updated_at.into()))
    }

    #[instrument(skip(self, content), level = "debug")]
    fn push_snippet(&self, content: &str) -> Result<()> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            mkdirp::mkdirp(parent).map_err(|err| RemoteError::WriteRemote {
                source: err,
                path: self.path.clone(),
            })?;
        }

        write(&self.path, content).map_err(|err| RemoteError::WriteRemote {
            source: err,
            path: self.path.clone(),
        })
    }
}

/// Remote backend error types.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Selected backend has no settings section.
    #[error("backend \"{backend}\" selected, but no [{backend}] section is configured")]
    Unconfigured { backend: Backend },

    /// Remote copy cannot be read.
    #[error("failed to read remote copy at {:?}", path.display())]
    ReadRemote {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Remote copy cannot be written.
    #[error("failed to write remote copy at {:?}", path.display())]
    WriteRemote {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Any other backend failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Friendly result alias :3
pub type Result<T, E = RemoteError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneralSettings;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{fs::File, time::SystemTime};

    #[sealed_test]
    fn fetch_missing_remote_copy() -> anyhow::Result<()> {
        let remote = FileRemote::new("share/snippet.toml");

        let result = remote.fetch_snapshot()?;
        assert_eq!(result, Snapshot::new("", DateTime::<Utc>::UNIX_EPOCH));

        Ok(())
    }

    #[sealed_test]
    fn push_then_fetch_remote_copy() -> anyhow::Result<()> {
        let remote = FileRemote::new("share/nested/snippet.toml");
        remote.push_snippet("[[snippets]]\ncommand = \"ls\"\n")?;

        let stamp = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")?.with_timezone(&Utc);
        File::options()
            .write(true)
            .open(remote.path())?
            .set_modified(SystemTime::from(stamp))?;

        let result = remote.fetch_snapshot()?;
        assert_eq!(
            result,
            Snapshot::new("[[snippets]]\ncommand = \"ls\"\n", stamp)
        );

        Ok(())
    }

    #[test]
    fn open_remote_without_settings() {
        let config = Config {
            general: GeneralSettings::default(),
            file: None,
        };

        let result = open_remote(&config);
        assert!(matches!(
            result,
            Err(RemoteError::Unconfigured {
                backend: Backend::File
            })
        ));
    }
}
