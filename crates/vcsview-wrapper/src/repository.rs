//! Working-copy accessor.
//!
//! Opens a git repository with `git2` for branch, ignore and file listing
//! queries, and goes through the command [`Wrapper`] for history and diff
//! text so the output matches what the tool itself prints.

use std::path::{Component, Path, PathBuf};

use git2::BranchType;
use serde::Serialize;
use tracing::debug;
use vcsview_core::{CommitRecord, VcsError};
use vcsview_difflens::parser::{parse_unified_diff, ParsedFileDiff};

use crate::command::{Param, VcsKind, Wrapper};
use crate::log::log_format;

/// A local branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Branch name.
    pub id: String,
    /// Id of the commit the branch points at.
    pub head: String,
    /// `true` for the checked-out branch.
    pub is_current: bool,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Link,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// File name.
    pub name: String,
    /// Entry kind.
    pub kind: FileKind,
}

/// A git working copy.
pub struct Repository {
    repo: git2::Repository,
    wrapper: Wrapper,
    project_path: PathBuf,
    context_lines: u32,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("project_path", &self.project_path)
            .field("wrapper", &self.wrapper)
            .field("context_lines", &self.context_lines)
            .finish()
    }
}

impl Repository {
    /// Open the working copy rooted at `dir`.
    ///
    /// `dir` must be the project directory itself, not its `.git`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::RepositoryNotFound`] if `dir` has no repository
    /// directory, or [`VcsError::Git`] if it cannot be opened.
    pub fn open(dir: &Path, wrapper: Wrapper) -> Result<Self, VcsError> {
        check_kind(&wrapper)?;
        let project_path = dir
            .canonicalize()
            .map_err(|_| VcsError::RepositoryNotFound(dir.to_path_buf()))?;
        if !project_path.join(wrapper.repository_dir_name()).is_dir() {
            return Err(VcsError::RepositoryNotFound(dir.to_path_buf()));
        }
        let repo = git2::Repository::open(&project_path)
            .map_err(|e| VcsError::Git(format!("failed to open repository: {e}")))?;
        debug!(path = %project_path.display(), "opened repository");
        Ok(Self {
            repo,
            wrapper,
            project_path,
            context_lines: 3,
        })
    }

    /// Find the working copy containing `dir`, searching parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::RepositoryNotFound`] if no working copy encloses
    /// `dir` or the repository is bare.
    pub fn discover(dir: &Path, wrapper: Wrapper) -> Result<Self, VcsError> {
        check_kind(&wrapper)?;
        let repo = git2::Repository::discover(dir)
            .map_err(|_| VcsError::RepositoryNotFound(dir.to_path_buf()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| VcsError::RepositoryNotFound(dir.to_path_buf()))?;
        let project_path = workdir.canonicalize()?;
        drop(repo);
        Self::open(&project_path, wrapper)
    }

    /// Request `lines` lines of context around each change in diffs.
    pub fn with_context_lines(mut self, lines: u32) -> Self {
        self.context_lines = lines;
        self
    }

    /// The command wrapper used for history and diffs.
    pub fn wrapper(&self) -> &Wrapper {
        &self.wrapper
    }

    /// Absolute project directory.
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Absolute repository metadata directory.
    pub fn repository_path(&self) -> PathBuf {
        self.project_path.join(self.wrapper.repository_dir_name())
    }

    /// Local branches sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Git`] if the branch list cannot be read.
    pub fn branches(&self) -> Result<Vec<Branch>, VcsError> {
        let iter = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(|e| VcsError::Git(format!("failed to list branches: {e}")))?;

        let mut branches = Vec::new();
        for item in iter {
            let (branch, _) = item.map_err(|e| VcsError::Git(format!("branch error: {e}")))?;
            let Some(name) = branch
                .name()
                .map_err(|e| VcsError::Git(format!("invalid branch name: {e}")))?
            else {
                continue;
            };
            let Some(target) = branch.get().target() else {
                continue;
            };
            branches.push(Branch {
                id: name.to_string(),
                head: target.to_string(),
                is_current: branch.is_head(),
            });
        }
        branches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(branches)
    }

    /// Check a path against the repository's ignore rules.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::PathOutsideRepository`] for paths outside the
    /// project, or [`VcsError::Git`] if the rules cannot be evaluated.
    pub fn is_path_ignored(&self, path: &Path) -> Result<bool, VcsError> {
        let relative = self.relative_path(path)?;
        self.repo
            .is_path_ignored(&relative)
            .map_err(|e| VcsError::Git(format!("failed to check ignore rules: {e}")))
    }

    /// List the entries of a project directory, without descending.
    ///
    /// The repository metadata directory is never listed.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::PathOutsideRepository`] if `sub_dir` escapes the
    /// project, or [`VcsError::Io`] if it is not a readable directory.
    pub fn list_files(&self, sub_dir: Option<&Path>) -> Result<Vec<FileEntry>, VcsError> {
        let dir = match sub_dir {
            Some(sub) => self.project_path.join(self.relative_path(sub)?),
            None => self.project_path.clone(),
        };
        let dir = dir.canonicalize()?;
        if !dir.starts_with(&self.project_path) {
            return Err(VcsError::PathOutsideRepository(dir));
        }
        if !dir.is_dir() || dir == self.repository_path() {
            return Err(VcsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            )));
        }

        let walker = ignore::WalkBuilder::new(&dir)
            .standard_filters(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let repo_dir = self.wrapper.repository_dir_name();
        let mut entries = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if entry.depth() == 0 {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            let kind = if file_type.is_symlink() {
                FileKind::Link
            } else if file_type.is_dir() {
                if name == repo_dir {
                    continue;
                }
                FileKind::Directory
            } else {
                FileKind::File
            };
            let path = match entry.path().strip_prefix(&self.project_path) {
                Ok(r) => r.to_path_buf(),
                Err(_) => continue,
            };
            entries.push(FileEntry { path, name, kind });
        }
        Ok(entries)
    }

    /// Fetch raw commit records, newest first in topological order.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Command`] if the log command fails.
    pub fn history(
        &self,
        limit: usize,
        skip: usize,
        path: Option<&str>,
        branch: Option<&str>,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        let mut params = vec![
            Param::arg("log"),
            Param::arg("--topo-order"),
            Param::option("--pretty", format!("format:{}", log_format(VcsKind::Git))),
            Param::option("--max-count", limit),
            Param::option("--skip", skip),
        ];
        if let Some(branch) = branch {
            params.push(Param::arg(branch));
        }
        push_path(&mut params, path);
        let lines = self.wrapper.execute(&params, Some(&self.project_path))?;
        Ok(crate::log::parse_log_records(&lines))
    }

    /// Diff of one commit against its first parent.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Command`] if the commit is unknown.
    pub fn commit_diff(
        &self,
        id: &str,
        path: Option<&str>,
    ) -> Result<Vec<ParsedFileDiff>, VcsError> {
        let mut params = vec![
            Param::arg("show"),
            Param::option("--format", ""),
            Param::arg("--no-color"),
            Param::arg(format!("-U{}", self.context_lines)),
            Param::arg("-m"),
            Param::arg("--first-parent"),
            Param::arg(id),
        ];
        push_path(&mut params, path);
        self.diff_with(&params)
    }

    /// Diff of the working tree against `rev`, or against the index when
    /// `rev` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Command`] if the revision is unknown.
    pub fn diff(
        &self,
        rev: Option<&str>,
        path: Option<&str>,
    ) -> Result<Vec<ParsedFileDiff>, VcsError> {
        let mut params = vec![
            Param::arg("diff"),
            Param::arg("--no-color"),
            Param::arg(format!("-U{}", self.context_lines)),
        ];
        if let Some(rev) = rev {
            params.push(Param::arg(rev));
        }
        push_path(&mut params, path);
        self.diff_with(&params)
    }

    fn diff_with(&self, params: &[Param]) -> Result<Vec<ParsedFileDiff>, VcsError> {
        let lines = self.wrapper.execute(params, Some(&self.project_path))?;
        Ok(parse_unified_diff(&lines.join("\n")))
    }

    fn relative_path(&self, path: &Path) -> Result<PathBuf, VcsError> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.project_path)
                .map_err(|_| VcsError::PathOutsideRepository(path.to_path_buf()))?
        } else {
            path
        };

        let mut depth: usize = 0;
        for component in relative.components() {
            match component {
                Component::ParentDir => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| VcsError::PathOutsideRepository(path.to_path_buf()))?;
                }
                Component::Normal(_) => depth += 1,
                _ => {}
            }
        }
        Ok(relative.to_path_buf())
    }
}

fn push_path(params: &mut Vec<Param>, path: Option<&str>) {
    if let Some(path) = path {
        params.push(Param::arg("--"));
        params.push(Param::arg(path));
    }
}

fn check_kind(wrapper: &Wrapper) -> Result<(), VcsError> {
    match wrapper.kind() {
        VcsKind::Git => Ok(()),
        other => Err(VcsError::Config(format!(
            "repository access is only available for git, not {other}"
        ))),
    }
}
