//! Boundary to the version-control tools.
//!
//! Runs `git`/`hg` commands and exposes their raw output, parses log
//! output into commit records, and lists branches and files of a
//! working copy through `git2`. Everything here only feeds raw data to
//! the diff and graph crates.

pub mod command;
pub mod log;
pub mod repository;
