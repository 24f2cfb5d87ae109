// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Snippet collection model.
//!
//! A __snippet__ is a reusable shell command along with a short description,
//! a set of tags, and an example of its expected output. Snippets are kept in
//! plain TOML files, one `[[snippets]]` table per snippet:
//!
//! ```toml
//! [[snippets]]
//! description = "list open ports"
//! command = "ss -tulpn"
//! tags = ["network"]
//! output = ""
//! ```
//!
//! # Origin Tracking
//!
//! A collection may be aggregated from several snippet files. Each snippet
//! remembers the file it was loaded from, i.e., its __origin__, so that it can
//! be routed back to that same file when the collection is saved. The origin
//! is bookkeeping only. It is never written into a snippet file.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::warn;

/// A single reusable command entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Snippet {
    /// Brief description of what the command does.
    #[serde(default)]
    pub description: String,

    /// Command to recall. May span multiple lines.
    pub command: String,

    /// Labels used to filter snippets.
    #[serde(default, alias = "tag")]
    pub tags: Vec<String>,

    /// Expected or example output of the command.
    #[serde(default)]
    pub output: String,

    #[serde(skip)]
    origin: Option<PathBuf>,
}

impl Snippet {
    /// Construct new snippet that belongs to the primary snippet file.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Set description of snippet.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set tags of snippet.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set expected output of snippet.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Snippet file this snippet was loaded from.
    ///
    /// Returns `None` if the snippet belongs to the primary snippet file.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Route snippet to target snippet file.
    pub fn set_origin(&mut self, origin: impl Into<PathBuf>) {
        self.origin = Some(origin.into());
    }

    /// Check if snippet carries any of the given tags.
    ///
    /// An untagged snippet never matches.
    pub fn has_any_tag(&self, tags: &[impl AsRef<str>]) -> bool {
        self.tags
            .iter()
            .any(|own| tags.iter().any(|tag| tag.as_ref() == own))
    }
}

/// Ordered collection of snippets.
///
/// Also serves as the layout of a snippet file.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Snippets {
    #[serde(default)]
    snippets: Vec<Snippet>,
}

impl Snippets {
    /// Construct new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse snippet file content.
    ///
    /// Unknown keys are ignored. Parsed snippets have no origin.
    ///
    /// # Errors
    ///
    /// - Return [`SnippetError::Deserialize`] if content is not valid TOML,
    ///   or does not follow the snippet file layout.
    /// - Return [`SnippetError::EmptyCommand`] if a snippet has no command.
    pub fn from_text(content: &str) -> Result<Self> {
        let snippets: Snippets = toml::de::from_str(content)?;

        // INVARIANT: Every snippet carries a command.
        if let Some(index) = snippets
            .snippets
            .iter()
            .position(|snippet| snippet.command.trim().is_empty())
        {
            return Err(SnippetError::EmptyCommand { index });
        }

        Ok(snippets)
    }

    /// Serialize entire collection into snippet file content.
    ///
    /// Origin of each snippet is ignored.
    ///
    /// # Errors
    ///
    /// - Return [`SnippetError::Serialize`] if collection cannot be encoded.
    pub fn to_text(&self) -> Result<String> {
        Ok(toml::ser::to_string_pretty(self)?)
    }

    /// Append snippet to end of collection.
    pub fn push(&mut self, snippet: Snippet) {
        self.snippets.push(snippet);
    }

    /// Append every snippet of another collection.
    pub fn extend(&mut self, snippets: impl IntoIterator<Item = Snippet>) {
        self.snippets.extend(snippets);
    }

    /// Iterate over snippets in current order.
    pub fn iter(&self) -> impl Iterator<Item = &Snippet> {
        self.snippets.iter()
    }

    /// Number of snippets in collection.
    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    /// Collection holds no snippets.
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Reorder snippets in place by sort order.
    ///
    /// Sort is stable. Unrecognized sort orders leave the current
    /// order untouched. See [`SortBy`] for the accepted forms.
    pub fn order(&mut self, sort_by: &str) {
        match sort_by.parse::<SortBy>() {
            Ok(sort_by) => self.order_by(sort_by),
            Err(error) => warn!("{error}, keeping load order"),
        }
    }

    /// Reorder snippets in place by parsed sort order.
    pub fn order_by(&mut self, sort_by: SortBy) {
        let SortBy { key, reversed } = sort_by;
        let field: fn(&Snippet) -> &str = match key {
            SortKey::Command => |snippet| snippet.command.as_str(),
            SortKey::Description => |snippet| snippet.description.as_str(),
            SortKey::Output => |snippet| snippet.output.as_str(),
            SortKey::Recency => {
                if reversed {
                    self.snippets.reverse();
                }
                return;
            }
        };

        // INVARIANT: Plain field keys sort descending, reversed ones ascending.
        if reversed {
            self.snippets.sort_by(|a, b| field(a).cmp(field(b)));
        } else {
            self.snippets.sort_by(|a, b| field(b).cmp(field(a)));
        }
    }

    /// Select snippets that carry at least one of the given tags.
    ///
    /// Matching is exact and case-sensitive. Untagged snippets are never
    /// selected. Order and origin of selected snippets are preserved.
    pub fn filter_by_tags(&self, tags: &[impl AsRef<str>]) -> Snippets {
        self.snippets
            .iter()
            .filter(|snippet| snippet.has_any_tag(tags))
            .cloned()
            .collect()
    }
}

impl FromIterator<Snippet> for Snippets {
    fn from_iter<I: IntoIterator<Item = Snippet>>(iter: I) -> Self {
        Self {
            snippets: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Snippet>> for Snippets {
    fn from(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }
}

impl From<Snippets> for Vec<Snippet> {
    fn from(snippets: Snippets) -> Self {
        snippets.snippets
    }
}

impl IntoIterator for Snippets {
    type Item = Snippet;
    type IntoIter = std::vec::IntoIter<Snippet>;

    fn into_iter(self) -> Self::IntoIter {
        self.snippets.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snippets {
    type Item = &'a Snippet;
    type IntoIter = std::slice::Iter<'a, Snippet>;

    fn into_iter(self) -> Self::IntoIter {
        self.snippets.iter()
    }
}

/// Sort order for snippet collections.
///
/// Written as an optional prefix followed by a key, e.g., "command",
/// "+description", "-recency". A "+" prefix is the same as no prefix. A "-"
/// prefix reverses the order.
///
/// | Key           | No prefix              | "-" prefix             |
/// |---------------|------------------------|------------------------|
/// | `command`     | descending             | ascending              |
/// | `description` | descending             | ascending              |
/// | `output`      | descending             | ascending              |
/// | `recency`     | load order             | reversed load order    |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SortBy {
    pub key: SortKey,
    pub reversed: bool,
}

/// Snippet field to sort by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Command,
    Description,
    Output,
    #[default]
    Recency,
}

impl FromStr for SortBy {
    type Err = SnippetError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let (reversed, key) = match data.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, data.strip_prefix('+').unwrap_or(data)),
        };

        let key = match key {
            "command" => SortKey::Command,
            "description" => SortKey::Description,
            "output" => SortKey::Output,
            "recency" => SortKey::Recency,
            _ => return Err(SnippetError::UnknownSortOrder(data.to_string())),
        };

        Ok(Self { key, reversed })
    }
}

impl Display for SortBy {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let key = match self.key {
            SortKey::Command => "command",
            SortKey::Description => "description",
            SortKey::Output => "output",
            SortKey::Recency => "recency",
        };

        if self.reversed {
            write!(fmt, "-{key}")
        } else {
            fmt.write_str(key)
        }
    }
}

/// Snippet model error types.
#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    /// Snippet file content is malformed.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Collection cannot be encoded.
    #[error("failed to encode snippets")]
    Serialize(#[from] toml::ser::Error),

    /// Snippet carries empty command.
    #[error("snippet number {} has an empty command", index + 1)]
    EmptyCommand { index: usize },

    /// Sort order is not recognized.
    #[error("unrecognized sort order {0:?}")]
    UnknownSortOrder(String),
}

/// Friendly result alias :3
pub type Result<T, E = SnippetError> = std::result::Result<T, E>;
