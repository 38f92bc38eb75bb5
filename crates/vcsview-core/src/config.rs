use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VcsError;

/// Top-level configuration loaded from `.vcsview.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use vcsview_core::VcsConfig;
///
/// let config = VcsConfig::default();
/// assert_eq!(config.wrapper.git_command, "git");
/// assert_eq!(config.history.limit, 50);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VcsConfig {
    /// Command wrapper settings.
    #[serde(default)]
    pub wrapper: WrapperConfig,
    /// History and graph settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Diff settings.
    #[serde(default)]
    pub diff: DiffConfig,
}

impl VcsConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Io`] if the file cannot be read, or
    /// [`VcsError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vcsview_core::VcsConfig;
    /// use std::path::Path;
    ///
    /// let config = VcsConfig::from_file(Path::new(".vcsview.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VcsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Toml`] if parsing fails, or [`VcsError::Config`]
    /// if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcsview_core::VcsConfig;
    ///
    /// let toml = r#"
    /// [history]
    /// limit = 10
    /// "#;
    /// let config = VcsConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.history.limit, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VcsError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), VcsError> {
        if self.wrapper.git_command.trim().is_empty() {
            return Err(VcsError::Config("wrapper.git_command must not be empty".into()));
        }
        if self.wrapper.hg_command.trim().is_empty() {
            return Err(VcsError::Config("wrapper.hg_command must not be empty".into()));
        }
        if self.history.limit == 0 {
            return Err(VcsError::Config("history.limit must be at least 1".into()));
        }
        Ok(())
    }
}

/// Settings for the external VCS command wrapper.
///
/// # Examples
///
/// ```
/// use vcsview_core::WrapperConfig;
///
/// let config = WrapperConfig::default();
/// assert_eq!(config.hg_command, "hg");
/// assert!(!config.ignore_errors);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperConfig {
    /// Executable used for git repositories.
    #[serde(default = "default_git_command")]
    pub git_command: String,
    /// Executable used for Mercurial repositories.
    #[serde(default = "default_hg_command")]
    pub hg_command: String,
    /// Treat non-zero exit codes as success.
    #[serde(default)]
    pub ignore_errors: bool,
}

fn default_git_command() -> String {
    "git".into()
}

fn default_hg_command() -> String {
    "hg".into()
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            git_command: default_git_command(),
            hg_command: default_hg_command(),
            ignore_errors: false,
        }
    }
}

/// History window defaults for `log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum commits per window.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Commits skipped before the window starts.
    #[serde(default)]
    pub skip: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            skip: 0,
        }
    }
}

/// Diff retrieval and filtering settings.
///
/// # Examples
///
/// ```
/// use vcsview_core::DiffConfig;
///
/// let config = DiffConfig::default();
/// assert_eq!(config.context_lines, 3);
/// assert!(config.skip_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Context lines requested from the tool (`-U<n>`).
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
    /// Glob patterns for files to leave out of diff output.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

fn default_context_lines() -> u32 {
    3
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
            skip_patterns: Vec::new(),
        }
    }
}
