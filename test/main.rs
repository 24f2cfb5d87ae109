// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use snipsync::{config::Config, store::SnippetStore};
use std::{
    fs::{create_dir_all, write, File},
    path::{Path, PathBuf},
    time::SystemTime,
};

/// One machine sharing snippets through a common remote copy.
pub(crate) struct MachineFixture {
    config: Config,
}

impl MachineFixture {
    /// Lay out a machine under `root` that syncs with remote copy at `remote`.
    pub(crate) fn new(root: impl AsRef<Path>, remote: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        create_dir_all(root.join("snippets"))?;

        let config: Config = format!(
            r#"
            [general]
            snippet_file = "{root}/snippet.toml"
            snippet_dirs = ["{root}/snippets"]
            sort_by = "recency"
            backend = "file"

            [file]
            path = "{remote}"
            "#,
            root = root.display(),
            remote = remote.as_ref().display(),
        )
        .parse()?;

        Ok(Self { config })
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn store(&self) -> SnippetStore {
        SnippetStore::from_settings(&self.config.general)
    }

    pub(crate) fn snippet_file(&self) -> PathBuf {
        self.config.general.snippet_file.clone()
    }

    pub(crate) fn snippet_dir(&self) -> PathBuf {
        self.config.general.snippet_dirs[0].clone()
    }

    pub(crate) fn write_snippet_file(&self, contents: impl AsRef<str>) -> Result<()> {
        write(self.snippet_file(), contents.as_ref())?;
        Ok(())
    }
}

/// Fixed point in time that tests offset from.
pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    epoch() + TimeDelta::seconds(secs)
}

/// Set modification time of target file.
pub(crate) fn touch(path: impl AsRef<Path>, when: DateTime<Utc>) -> Result<()> {
    File::options()
        .write(true)
        .open(path.as_ref())?
        .set_modified(SystemTime::from(when))?;
    Ok(())
}
