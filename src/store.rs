// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Snippet store management.
//!
//! Snipsync gathers snippets from one or more snippet files into a single
//! collection. The __snippet store__ knows where those files live, and how to
//! route each snippet back to the file it came from.
//!
//! # Snippet Store Layout
//!
//! The snippet store is composed of exactly one __primary snippet file__,
//! and zero or more __snippet directories__. The primary snippet file must
//! always exist. It is the only file that gets synced with a remote backend.
//! Snippet directories are scanned recursively for files with a ".toml"
//! extension. Every such file is treated as an additional snippet file that
//! is only ever aggregated locally.
//!
//! New snippets without an origin always land in the primary snippet file.
//! A snippet file reachable both as the primary snippet file and through a
//! snippet directory is only read once.
//!
//! Saving writes each snippet file in collection order. Callers that load,
//! edit, then save should use [`SnippetStore::load_unordered`] so the
//! configured sort order is not baked into the files.

use crate::{
    config::GeneralSettings,
    snippet::{SnippetError, Snippets},
};

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{canonicalize, metadata, read_to_string, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Locations and ordering of all snippet files.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnippetStore {
    snippet_file: PathBuf,
    snippet_dirs: Vec<PathBuf>,
    sort_by: String,
}

impl SnippetStore {
    /// Construct new snippet store.
    pub fn new(
        snippet_file: impl Into<PathBuf>,
        snippet_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
        sort_by: impl Into<String>,
    ) -> Self {
        Self {
            snippet_file: snippet_file.into(),
            snippet_dirs: snippet_dirs.into_iter().map(Into::into).collect(),
            sort_by: sort_by.into(),
        }
    }

    /// Construct new snippet store from general configuration settings.
    pub fn from_settings(settings: &GeneralSettings) -> Self {
        Self::new(
            &settings.snippet_file,
            &settings.snippet_dirs,
            settings.sort_by.as_str(),
        )
    }

    /// Path to primary snippet file.
    pub fn snippet_file(&self) -> &Path {
        self.snippet_file.as_path()
    }

    /// Load snippets from snippet files.
    ///
    /// Always loads the primary snippet file. Snippets from every snippet file
    /// inside snippet directories are included if `include_dirs` is set.
    /// Snippets keep file-then-in-file order before the configured ordering
    /// gets applied.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::SnippetFileNotFound`] if primary snippet file
    ///   does not exist.
    /// - Return [`StoreError::SnippetDirNotFound`] if a snippet directory does
    ///   not exist.
    /// - Return [`StoreError::Stat`] if a path cannot be inspected.
    /// - Return [`StoreError::ScanSnippetDir`] if a snippet directory cannot
    ///   be scanned.
    /// - Return [`StoreError::ReadSnippetFile`] if a snippet file cannot be
    ///   read.
    /// - Return [`StoreError::Parse`] if a snippet file is malformed.
    #[instrument(skip(self), level = "debug")]
    pub fn load(&self, include_dirs: bool) -> Result<Snippets> {
        let mut snippets = self.load_unordered(include_dirs)?;
        snippets.order(&self.sort_by);

        Ok(snippets)
    }

    /// Load snippets in file-then-in-file order.
    ///
    /// Same as [`SnippetStore::load`], but skips the configured ordering.
    ///
    /// # Errors
    ///
    /// - Return the same errors as [`SnippetStore::load`].
    #[instrument(skip(self), level = "debug")]
    pub fn load_unordered(&self, include_dirs: bool) -> Result<Snippets> {
        let mut snippet_files = Vec::new();

        match metadata(&self.snippet_file) {
            Ok(_) => snippet_files.push(self.snippet_file.clone()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::SnippetFileNotFound {
                    path: self.snippet_file.clone(),
                });
            }
            Err(err) => {
                return Err(StoreError::Stat {
                    source: err,
                    path: self.snippet_file.clone(),
                });
            }
        }

        if include_dirs {
            for dir in &self.snippet_dirs {
                snippet_files.extend(scan_snippet_dir(dir)?);
            }
        }

        // INVARIANT: Each snippet file is read once, however it was reached.
        let mut seen = BTreeSet::new();
        let mut unique = Vec::with_capacity(snippet_files.len());
        for path in snippet_files {
            let real = canonicalize(&path).map_err(|err| StoreError::Stat {
                source: err,
                path: path.clone(),
            })?;
            if seen.insert(real) {
                unique.push(path);
            } else {
                debug!("skip duplicate snippet file {:?}", path.display());
            }
        }

        let mut snippets = Snippets::new();
        for path in unique {
            debug!("load snippet file {:?}", path.display());
            let content = read_to_string(&path).map_err(|err| StoreError::ReadSnippetFile {
                source: err,
                path: path.clone(),
            })?;

            let loaded = Snippets::from_text(&content).map_err(|err| StoreError::Parse {
                source: err,
                path: path.clone(),
            })?;

            // INVARIANT: Every loaded snippet remembers where it came from.
            snippets.extend(loaded.into_iter().map(|mut snippet| {
                snippet.set_origin(&path);
                snippet
            }));
        }

        Ok(snippets)
    }

    /// Save snippets back into the snippet files they came from.
    ///
    /// Snippets are grouped by origin. Snippets without an origin go to the
    /// primary snippet file. Each group entirely replaces the content of its
    /// snippet file. Files that no snippet points to are left alone. Files
    /// already written are not restored if a later file fails.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Serialize`] if a group cannot be encoded.
    /// - Return [`StoreError::WriteSnippetFile`] if a snippet file cannot be
    ///   created or written to.
    #[instrument(skip(self, snippets), level = "debug")]
    pub fn save(&self, snippets: &Snippets) -> Result<()> {
        let mut groups: BTreeMap<&Path, Snippets> = BTreeMap::new();
        for snippet in snippets {
            let origin = snippet.origin().unwrap_or(self.snippet_file.as_path());
            groups.entry(origin).or_default().push(snippet.clone());
        }

        for (path, group) in groups {
            let content = group.to_text().map_err(|err| StoreError::Serialize {
                source: err,
                path: path.to_path_buf(),
            })?;

            write_snippet_file(path, content)?;
            info!("saved {} snippets to {:?}", group.len(), path.display());
        }

        Ok(())
    }
}

/// Collect all snippet files under target directory, sorted by path.
fn scan_snippet_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    match metadata(dir) {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StoreError::SnippetDirNotFound {
                path: dir.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(StoreError::Stat {
                source: err,
                path: dir.to_path_buf(),
            });
        }
    }

    // INVARIANT: Directory name is matched literally, not as a pattern.
    let pattern = format!(
        "{}/**/*.toml",
        glob::Pattern::escape(dir.to_string_lossy().as_ref())
    );
    let paths = glob::glob(&pattern).map_err(|err| StoreError::ScanSnippetDir {
        source: Box::new(err),
        path: dir.to_path_buf(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| StoreError::ScanSnippetDir {
            source: Box::new(err),
            path: dir.to_path_buf(),
        })?;

        if path.is_file() {
            files.push(path);
        }
    }

    Ok(files)
}

/// Overwrite snippet file, creating missing parent directories.
pub(crate) fn write_snippet_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent).map_err(|err| StoreError::WriteSnippetFile {
            source: err,
            path: path.to_path_buf(),
        })?;
    }

    write(path, content).map_err(|err| StoreError::WriteSnippetFile {
        source: err,
        path: path.to_path_buf(),
    })
}

/// All possible error types for snippet store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Primary snippet file does not exist.
    #[error(
        "snippet file not found at {:?}\n\
         Please run 'snipsync init' or set general.snippet_file to an existing file",
        path.display()
    )]
    SnippetFileNotFound { path: PathBuf },

    /// Snippet directory does not exist.
    #[error(
        "snippet directory not found at {:?}\n\
         Please fix or remove this entry from general.snippet_dirs",
        path.display()
    )]
    SnippetDirNotFound { path: PathBuf },

    /// Path cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Snippet directory cannot be scanned for snippet files.
    #[error("failed to scan snippet directory {:?}", path.display())]
    ScanSnippetDir {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        path: PathBuf,
    },

    /// Snippet file cannot be read from.
    #[error("failed to read snippet file {:?}", path.display())]
    ReadSnippetFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Snippet file content is malformed.
    #[error("failed to parse snippet file {:?}", path.display())]
    Parse {
        #[source]
        source: SnippetError,
        path: PathBuf,
    },

    /// Snippets cannot be encoded for target snippet file.
    #[error("failed to encode snippets for {:?}", path.display())]
    Serialize {
        #[source]
        source: SnippetError,
        path: PathBuf,
    },

    /// Snippet file cannot be created or written to.
    #[error("failed to write snippet file {:?}", path.display())]
    WriteSnippetFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
