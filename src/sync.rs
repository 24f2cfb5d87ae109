// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Primary snippet file reconciliation.
//!
//! Snipsync keeps the primary snippet file consistent with exactly one remote
//! copy held by a remote backend. Snippet directories never take part in
//! syncing.
//!
//! # Conflict Resolution
//!
//! The modification time of the primary snippet file is the only record of
//! when the local copy last changed. It is compared against the update time
//! of the remote copy, both in UTC, and whichever side is newer wins outright:
//!
//! | Local file               | Action                                    |
//! |--------------------------|-------------------------------------------|
//! | missing or empty         | pull remote copy verbatim                 |
//! | older than remote copy   | pull remote copy, unless content matches  |
//! | newer than remote copy   | push primary snippet file                 |
//! | same time as remote copy | nothing                                   |
//!
//! Timestamps must match exactly to count as the same time. There is no
//! merging of concurrent edits. Writes replace the whole file and are not
//! atomic.

pub mod remote;

use crate::{
    config::Config,
    store::{write_snippet_file, SnippetStore, StoreError},
    sync::remote::{open_remote, RemoteClient, RemoteError, Snapshot},
};

use chrono::{DateTime, Utc};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::metadata,
    io::ErrorKind,
    path::PathBuf,
};
use tracing::{debug, info, instrument};

/// Relation between primary snippet file and remote copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Primary snippet file is missing or empty.
    NoLocal,

    /// Remote copy was updated after primary snippet file.
    LocalOlder,

    /// Primary snippet file was modified after remote copy.
    LocalNewer,

    /// Both sides carry the exact same timestamp.
    InSync,
}

impl SyncState {
    /// Classify primary snippet file against remote copy.
    ///
    /// Takes the modification time of the primary snippet file, or `None` if
    /// it is missing or empty.
    pub fn classify(local: Option<DateTime<Utc>>, remote: DateTime<Utc>) -> Self {
        match local {
            None => Self::NoLocal,
            Some(local) if local > remote => Self::LocalNewer,
            Some(local) if remote > local => Self::LocalOlder,
            Some(_) => Self::InSync,
        }
    }
}

/// Result of a single sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Primary snippet file was pushed to remote backend.
    Uploaded,

    /// Remote copy was written to primary snippet file.
    Downloaded,

    /// Remote copy was newer, but matched primary snippet file already.
    AlreadyUpToDate,

    /// Nothing to do.
    InSync,
}

impl Display for SyncOutcome {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Uploaded => fmt.write_str("Upload success"),
            Self::Downloaded => fmt.write_str("Download success"),
            Self::AlreadyUpToDate => fmt.write_str("Already up-to-date"),
            Self::InSync => fmt.write_str("Nothing to sync"),
        }
    }
}

/// Sync primary snippet file with a remote backend.
#[derive(Debug)]
pub struct Reconciler<'store, R = Box<dyn RemoteClient>>
where
    R: RemoteClient,
{
    store: &'store SnippetStore,
    remote: R,
}

impl<'store> Reconciler<'store> {
    /// Construct new reconciler with remote backend selected by configuration.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Remote`] if remote backend cannot be initialized.
    pub fn from_config(store: &'store SnippetStore, config: &Config) -> Result<Self> {
        let remote = open_remote(config).map_err(|err| SyncError::Remote {
            phase: RemotePhase::Initialize,
            source: err,
        })?;

        Ok(Self::new(store, remote))
    }
}

impl<'store, R> Reconciler<'store, R>
where
    R: RemoteClient,
{
    /// Construct new reconciler.
    pub fn new(store: &'store SnippetStore, remote: R) -> Self {
        Self { store, remote }
    }

    /// Access underlying remote backend.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Sync primary snippet file with remote copy.
    ///
    /// Fetches a fresh snapshot of the remote copy, and pulls or pushes based
    /// on which side is newer. See the [module docs](self) for the full rules.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Remote`] if remote copy cannot be fetched or
    ///   pushed.
    /// - Return [`SyncError::Stat`] if primary snippet file cannot be
    ///   inspected.
    /// - Return [`SyncError::Store`] if primary snippet file cannot be loaded
    ///   or serialized.
    /// - Return [`SyncError::WriteSnippetFile`] if remote copy cannot be
    ///   written to primary snippet file.
    #[instrument(skip(self), level = "debug")]
    pub fn auto_sync(&self) -> Result<SyncOutcome> {
        let snapshot = self
            .remote
            .fetch_snapshot()
            .map_err(|err| SyncError::Remote {
                phase: RemotePhase::Fetch,
                source: err,
            })?;

        let local = self.local_modified()?;
        let state = SyncState::classify(local, snapshot.updated_at);
        debug!(
            "local {local:?} against remote {:?} is {state:?}",
            snapshot.updated_at
        );

        let outcome = match state {
            SyncState::NoLocal => self.download(&snapshot)?,
            SyncState::LocalOlder => self.download_if_changed(&snapshot)?,
            SyncState::LocalNewer => self.upload()?,
            SyncState::InSync => SyncOutcome::InSync,
        };

        match outcome {
            SyncOutcome::InSync => debug!("{outcome}"),
            _ => info!("{outcome}"),
        }

        Ok(outcome)
    }

    /// Modification time of primary snippet file in UTC.
    ///
    /// Missing or empty files have no modification time.
    fn local_modified(&self) -> Result<Option<DateTime<Utc>>> {
        let path = self.store.snippet_file();
        let meta = match metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SyncError::Stat {
                    source: err,
                    path: path.to_path_buf(),
                })
            }
        };

        if meta.len() == 0 {
            return Ok(None);
        }

        let modified = meta.modified().map_err(|err| SyncError::Stat {
            source: err,
            path: path.to_path_buf(),
        })?;

        Ok(Some(modified.into()))
    }

    /// Push primary snippet file, excluding snippet directories.
    fn upload(&self) -> Result<SyncOutcome> {
        let body = self.local_text()?;
        self.remote
            .push_snippet(&body)
            .map_err(|err| SyncError::Remote {
                phase: RemotePhase::Push,
                source: err,
            })?;

        Ok(SyncOutcome::Uploaded)
    }

    /// Pull remote copy unless primary snippet file already matches it.
    fn download_if_changed(&self, snapshot: &Snapshot) -> Result<SyncOutcome> {
        // INVARIANT: Identical content must not touch local modification time.
        if self.local_text()? == snapshot.content {
            return Ok(SyncOutcome::AlreadyUpToDate);
        }

        self.download(snapshot)
    }

    /// Pull remote copy verbatim into primary snippet file.
    fn download(&self, snapshot: &Snapshot) -> Result<SyncOutcome> {
        write_snippet_file(self.store.snippet_file(), &snapshot.content)
            .map_err(SyncError::WriteSnippetFile)?;

        Ok(SyncOutcome::Downloaded)
    }

    fn local_text(&self) -> Result<String> {
        let snippets = self.store.load(false)?;
        snippets.to_text().map_err(|err| {
            SyncError::Store(StoreError::Serialize {
                source: err,
                path: self.store.snippet_file().to_path_buf(),
            })
        })
    }
}

/// Phase of remote backend interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemotePhase {
    Initialize,
    Fetch,
    Push,
}

impl Display for RemotePhase {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Initialize => fmt.write_str("initialize remote client"),
            Self::Fetch => fmt.write_str("fetch remote snippet"),
            Self::Push => fmt.write_str("upload snippet"),
        }
    }
}

/// All possible error types for syncing.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Remote backend interaction fails.
    #[error("failed to {phase}")]
    Remote {
        phase: RemotePhase,
        #[source]
        source: RemoteError,
    },

    /// Primary snippet file cannot be loaded or serialized.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Primary snippet file cannot be inspected.
    #[error("failed to inspect snippet file {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Remote copy cannot be written to primary snippet file.
    #[error("failed to save remote snippet")]
    WriteSnippetFile(#[source] StoreError),
}

/// Friendly result alias :3
pub type Result<T, E = SyncError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::{
        cell::RefCell,
        fs::{read_to_string, write, File},
        time::SystemTime,
    };

    const LOCAL: &str = "[[snippets]]\ndescription = \"local\"\ncommand = \"echo local\"\n";

    #[derive(Debug, Default)]
    struct MemoryRemote {
        snapshot: RefCell<Snapshot>,
        pushed: RefCell<Vec<String>>,
    }

    impl MemoryRemote {
        fn new(content: &str, updated_at: DateTime<Utc>) -> Self {
            Self {
                snapshot: RefCell::new(Snapshot::new(content, updated_at)),
                pushed: RefCell::default(),
            }
        }
    }

    impl RemoteClient for MemoryRemote {
        fn fetch_snapshot(&self) -> remote::Result<Snapshot> {
            Ok(self.snapshot.borrow().clone())
        }

        fn push_snippet(&self, content: &str) -> remote::Result<()> {
            self.pushed.borrow_mut().push(content.to_string());
            self.snapshot.borrow_mut().content = content.to_string();
            Ok(())
        }
    }

    struct BrokenRemote;

    impl RemoteClient for BrokenRemote {
        fn fetch_snapshot(&self) -> remote::Result<Snapshot> {
            Err(RemoteError::Other("connection refused".into()))
        }

        fn push_snippet(&self, _: &str) -> remote::Result<()> {
            Err(RemoteError::Other("connection refused".into()))
        }
    }

    struct ReadOnlyRemote(Snapshot);

    impl RemoteClient for ReadOnlyRemote {
        fn fetch_snapshot(&self) -> remote::Result<Snapshot> {
            Ok(self.0.clone())
        }

        fn push_snippet(&self, _: &str) -> remote::Result<()> {
            Err(RemoteError::Other("permission denied".into()))
        }
    }

    fn stamp() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    fn touch(path: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        File::options()
            .write(true)
            .open(path)?
            .set_modified(SystemTime::from(at))?;
        Ok(())
    }

    fn store() -> SnippetStore {
        SnippetStore::new("snippet.toml", ["work"], "recency")
    }

    #[test_case(None, SyncState::NoLocal; "missing local file")]
    #[test_case(Some(-10), SyncState::LocalOlder; "remote updated later")]
    #[test_case(Some(10), SyncState::LocalNewer; "local modified later")]
    #[test_case(Some(0), SyncState::InSync; "exact same time")]
    #[test]
    fn classify_sync_state(offset: Option<i64>, expect: SyncState) {
        use pretty_assertions::assert_eq;
        let local = offset.map(|secs| stamp() + TimeDelta::seconds(secs));
        assert_eq!(SyncState::classify(local, stamp()), expect);
    }

    #[test]
    fn classify_has_no_tolerance_window() {
        let local = stamp() + TimeDelta::nanoseconds(1);
        assert_eq!(SyncState::classify(Some(local), stamp()), SyncState::LocalNewer);
    }

    #[sealed_test]
    fn sync_without_local_file_pulls() -> anyhow::Result<()> {
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new("A", stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::Downloaded);
        assert_eq!(read_to_string("snippet.toml")?, "A");
        assert!(reconciler.remote().pushed.borrow().is_empty());

        Ok(())
    }

    #[sealed_test]
    fn sync_with_empty_local_file_pulls() -> anyhow::Result<()> {
        write("snippet.toml", "")?;
        touch("snippet.toml", stamp() + TimeDelta::seconds(60))?;
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new(LOCAL, stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::Downloaded);
        assert_eq!(read_to_string("snippet.toml")?, LOCAL);

        Ok(())
    }

    #[sealed_test]
    fn sync_with_newer_local_file_pushes_primary_only() -> anyhow::Result<()> {
        std::fs::create_dir_all("work")?;
        write("snippet.toml", LOCAL)?;
        write("work/aux.toml", "[[snippets]]\ncommand = \"echo aux\"\n")?;
        touch("snippet.toml", stamp() + TimeDelta::seconds(10))?;
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new("stale", stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::Uploaded);

        let expect = store.load(false)?.to_text()?;
        assert_eq!(*reconciler.remote().pushed.borrow(), vec![expect.clone()]);
        assert_eq!(reconciler.remote().snapshot.borrow().content, expect);
        assert!(!expect.contains("echo aux"));

        Ok(())
    }

    #[sealed_test]
    fn sync_with_older_identical_local_file_skips_write() -> anyhow::Result<()> {
        write("snippet.toml", LOCAL)?;
        let local_at = stamp() - TimeDelta::seconds(10);
        touch("snippet.toml", local_at)?;
        let store = store();
        let remote_content = store.load(false)?.to_text()?;
        let reconciler = Reconciler::new(&store, MemoryRemote::new(&remote_content, stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::AlreadyUpToDate);
        assert_eq!(read_to_string("snippet.toml")?, LOCAL);
        let modified: DateTime<Utc> = metadata("snippet.toml")?.modified()?.into();
        assert_eq!(modified, local_at);

        Ok(())
    }

    #[sealed_test]
    fn sync_with_older_changed_local_file_pulls() -> anyhow::Result<()> {
        write("snippet.toml", LOCAL)?;
        touch("snippet.toml", stamp() - TimeDelta::seconds(10))?;
        let remote_content = "[[snippets]]\ncommand = \"echo remote\"\n";
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new(remote_content, stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::Downloaded);
        assert_eq!(read_to_string("snippet.toml")?, remote_content);

        Ok(())
    }

    #[sealed_test]
    fn sync_at_same_time_does_nothing() -> anyhow::Result<()> {
        write("snippet.toml", LOCAL)?;
        touch("snippet.toml", stamp())?;
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new("different", stamp()));

        assert_eq!(reconciler.auto_sync()?, SyncOutcome::InSync);
        assert_eq!(read_to_string("snippet.toml")?, LOCAL);
        assert!(reconciler.remote().pushed.borrow().is_empty());

        Ok(())
    }

    #[sealed_test]
    fn sync_reports_fetch_phase() -> anyhow::Result<()> {
        write("snippet.toml", LOCAL)?;
        let store = store();
        let reconciler = Reconciler::new(&store, BrokenRemote);

        let result = reconciler.auto_sync();
        assert!(matches!(
            result,
            Err(SyncError::Remote {
                phase: RemotePhase::Fetch,
                ..
            })
        ));
        assert_eq!(read_to_string("snippet.toml")?, LOCAL);

        Ok(())
    }

    #[sealed_test]
    fn sync_with_malformed_local_file_fails_push() -> anyhow::Result<()> {
        write("snippet.toml", "[[snippets]\n")?;
        touch("snippet.toml", stamp() + TimeDelta::seconds(10))?;
        let store = store();
        let reconciler = Reconciler::new(&store, MemoryRemote::new("remote", stamp()));

        let result = reconciler.auto_sync();
        assert!(matches!(
            result,
            Err(SyncError::Store(StoreError::Parse { .. }))
        ));
        assert!(reconciler.remote().pushed.borrow().is_empty());

        Ok(())
    }

    #[sealed_test]
    fn sync_reports_push_phase() -> anyhow::Result<()> {
        write("snippet.toml", LOCAL)?;
        touch("snippet.toml", stamp() + TimeDelta::seconds(10))?;
        let store = store();
        let reconciler = Reconciler::new(&store, ReadOnlyRemote(Snapshot::new("stale", stamp())));

        let result = reconciler.auto_sync();
        assert!(matches!(
            result,
            Err(SyncError::Remote {
                phase: RemotePhase::Push,
                ..
            })
        ));
        assert_eq!(read_to_string("snippet.toml")?, LOCAL);

        Ok(())
    }

    #[test]
    fn reconciler_reports_initialize_phase() {
        let store = store();
        let config = Config::default();

        let result = Reconciler::from_config(&store, &config);
        assert!(matches!(
            result,
            Err(SyncError::Remote {
                phase: RemotePhase::Initialize,
                source: RemoteError::Unconfigured { .. },
            })
        ));
    }
}
