// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Personal command-snippet manager.
//!
//! Snipsync keeps reusable shell commands, along with a description, tags,
//! and expected output, in plain TOML snippet files. Snippets can be gathered
//! from a primary snippet file and any number of snippet directories into one
//! ordered collection. The primary snippet file can be synced with a single
//! remote copy, so the same snippets can be shared across machines.
//!
//! # See Also
//!
//! 1. [`store`] for how snippet files are gathered and saved.
//! 2. [`sync`] for how the primary snippet file is reconciled.

pub mod config;
pub mod path;
pub mod snippet;
pub mod store;
pub mod sync;
