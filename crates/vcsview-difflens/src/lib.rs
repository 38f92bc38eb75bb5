//! Unified diff parsing into an ordered hunk and line model.
//!
//! Consumes diff text already produced by an external tool (`git diff`,
//! `hg diff`) and turns each file section into a [`model::FileDiff`] with
//! per-line old/new numbering. Parsing never fails as a whole: problems are
//! reported per hunk or per file alongside the parsed model.

pub mod filter;
pub mod model;
pub mod parser;
