//! Commit history windows and lane assignment for graph rendering.
//!
//! Builds validated commit windows from raw records, then lays commits out
//! on lanes the way `log --graph` does: each commit gets a stable lane index
//! and a row of symbols describing how lanes pass through, branch off, or
//! merge back at that commit.

pub mod builder;
pub mod history;
pub mod render;
