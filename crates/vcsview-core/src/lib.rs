//! Core types, configuration, and error handling for vcsview.
//!
//! This crate provides the shared foundation used by all other vcsview crates:
//! - [`VcsError`]: unified error type using `thiserror`
//! - [`ConstructionError`] and [`DiffError`]: per-unit issues reported as data
//! - [`VcsConfig`]: configuration loaded from `.vcsview.toml`
//! - Shared types: [`Commit`], [`CommitRecord`], [`ParentIds`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{DiffConfig, HistoryConfig, VcsConfig, WrapperConfig};
pub use error::{ConstructionError, DiffError, VcsError};
pub use types::{parse_date, Commit, CommitRecord, OutputFormat, ParentIds};

/// A convenience `Result` type for vcsview operations.
pub type Result<T> = std::result::Result<T, VcsError>;
