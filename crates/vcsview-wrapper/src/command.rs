//! Console command wrapper for `git` and `hg`.
//!
//! Builds argument lists, runs them in a working directory and hands back
//! the raw output, either as text lines or as a lazy stream of byte chunks.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use vcsview_core::{VcsError, WrapperConfig};

/// Size of each chunk yielded by [`ByteChunks`].
pub const CHUNK_SIZE: usize = 8192;

/// Supported version-control tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    /// Git.
    Git,
    /// Mercurial.
    #[serde(rename = "hg")]
    Mercurial,
}

impl VcsKind {
    /// Name of the metadata directory inside a working copy.
    ///
    /// # Examples
    ///
    /// ```
    /// use vcsview_wrapper::command::VcsKind;
    ///
    /// assert_eq!(VcsKind::Git.repository_dir_name(), ".git");
    /// assert_eq!(VcsKind::Mercurial.repository_dir_name(), ".hg");
    /// ```
    pub fn repository_dir_name(self) -> &'static str {
        match self {
            VcsKind::Git => ".git",
            VcsKind::Mercurial => ".hg",
        }
    }

    /// The configured executable for this tool.
    pub fn command<'a>(self, config: &'a WrapperConfig) -> &'a str {
        match self {
            VcsKind::Git => &config.git_command,
            VcsKind::Mercurial => &config.hg_command,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsKind::Git => write!(f, "git"),
            VcsKind::Mercurial => write!(f, "hg"),
        }
    }
}

/// One command-line parameter.
///
/// # Examples
///
/// ```
/// use vcsview_wrapper::command::Param;
///
/// assert_eq!(Param::option("--skip", 10).render(), "--skip=10");
/// assert_eq!(Param::from("log").render(), "log");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Passed through verbatim.
    Arg(String),
    /// Rendered as `key=value`.
    Option {
        /// Option name including its dashes.
        key: String,
        /// Option value.
        value: String,
    },
}

impl Param {
    /// A positional parameter.
    pub fn arg(value: impl Into<String>) -> Self {
        Param::Arg(value.into())
    }

    /// A `key=value` parameter.
    pub fn option(key: impl Into<String>, value: impl ToString) -> Self {
        Param::Option {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// The argument as passed to the process.
    pub fn render(&self) -> String {
        match self {
            Param::Arg(value) => value.clone(),
            Param::Option { key, value } => format!("{key}={value}"),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::arg(value)
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Arg(value)
    }
}

/// Runs one version-control executable.
///
/// # Examples
///
/// ```
/// use vcsview_wrapper::command::{Param, VcsKind, Wrapper};
///
/// let git = Wrapper::new(VcsKind::Git, "git");
/// let line = git.command_line(&[
///     Param::arg("log"),
///     Param::option("--skip", 10),
///     Param::arg("-n"),
///     Param::arg("5"),
/// ]);
/// assert_eq!(line, "git log --skip=10 -n 5");
/// ```
#[derive(Debug, Clone)]
pub struct Wrapper {
    kind: VcsKind,
    program: String,
    ignore_errors: bool,
    version: Option<String>,
}

impl Wrapper {
    /// Wrap `program` as a tool of the given kind.
    pub fn new(kind: VcsKind, program: impl Into<String>) -> Self {
        Self {
            kind,
            program: program.into(),
            ignore_errors: false,
            version: None,
        }
    }

    /// Build a wrapper from the `[wrapper]` configuration section.
    pub fn from_config(kind: VcsKind, config: &WrapperConfig) -> Self {
        Self::new(kind, kind.command(config)).with_ignore_errors(config.ignore_errors)
    }

    /// Accept non-zero exit statuses instead of failing.
    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    /// Tool kind.
    pub fn kind(&self) -> VcsKind {
        self.kind
    }

    /// Executable name or path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Metadata directory name for this tool.
    pub fn repository_dir_name(&self) -> &'static str {
        self.kind.repository_dir_name()
    }

    /// Version reported by the last [`Wrapper::check_version`] call.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Render parameters into process arguments.
    pub fn build_command(&self, params: &[Param]) -> Vec<String> {
        params.iter().map(Param::render).collect()
    }

    /// The full command line, for messages and logs.
    pub fn command_line(&self, params: &[Param]) -> String {
        let mut line = self.program.clone();
        for arg in self.build_command(params) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    fn command(&self, params: &[Param], dir: Option<&Path>) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.build_command(params));
        if let Some(dir) = dir {
            debug!(dir = %dir.display(), "changing directory");
            command.current_dir(dir);
        }
        command
    }

    /// Run a command and return its standard output as lines.
    ///
    /// Output is decoded as UTF-8, replacing invalid sequences. A blank last
    /// line is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Io`] if the process cannot be started, or
    /// [`VcsError::Command`] if it exits with a non-zero status and errors
    /// are not ignored.
    pub fn execute(&self, params: &[Param], dir: Option<&Path>) -> Result<Vec<String>, VcsError> {
        let line = self.command_line(params);
        debug!(command = %line, ignore_errors = self.ignore_errors, "executing command");

        let output = self.command(params, dir).stderr(Stdio::piped()).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(output = %stdout, "command output");

        let mut lines: Vec<String> = stdout.lines().map(str::to_string).collect();
        if lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }

        let status = output.status.code().unwrap_or(-1);
        if !output.status.success() && !self.ignore_errors {
            debug!(
                status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "non-zero status code"
            );
            return Err(VcsError::Command {
                command: line,
                status,
            });
        }
        Ok(lines)
    }

    /// Run a command and stream its raw standard output.
    ///
    /// The returned iterator reads lazily and can be consumed once. The exit
    /// status is checked after the output is drained.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Io`] if the process cannot be started.
    pub fn execute_binary(
        &self,
        params: &[Param],
        dir: Option<&Path>,
    ) -> Result<ByteChunks, VcsError> {
        let line = self.command_line(params);
        debug!(command = %line, ignore_errors = self.ignore_errors, "executing binary command");

        let mut child = self
            .command(params, dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child.stdout.take();

        Ok(ByteChunks {
            child: Some(child),
            stdout,
            command: line,
            ignore_errors: self.ignore_errors,
        })
    }

    /// Ask the tool for its version and remember it.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Command`] if the tool fails, or
    /// [`VcsError::Parse`] if no version number appears in its output.
    pub fn check_version(&mut self) -> Result<&str, VcsError> {
        let lines = self.execute(&[Param::arg("--version")], None)?;
        let first = lines.first().map(String::as_str).unwrap_or_default();
        let version = parse_version(first)
            .ok_or_else(|| VcsError::Parse(format!("no version in `{first}`")))?;
        debug!(kind = %self.kind, version, "detected tool version");
        Ok(self.version.insert(version.to_string()).as_str())
    }
}

/// Extract the version number from a `--version` banner.
///
/// # Examples
///
/// ```
/// use vcsview_wrapper::command::parse_version;
///
/// assert_eq!(parse_version("git version 2.43.0"), Some("2.43.0"));
/// assert_eq!(parse_version("Mercurial Distributed SCM (version 6.5.2)"), Some("6.5.2"));
/// assert_eq!(parse_version("unknown"), None);
/// ```
pub fn parse_version(banner: &str) -> Option<&str> {
    banner
        .split_whitespace()
        .map(|token| token.trim_end_matches(')'))
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
}

/// Lazy stream of a command's raw output.
///
/// Yields chunks of at most [`CHUNK_SIZE`] bytes. After the last chunk the
/// process is reaped; a non-zero exit is yielded as a final error unless
/// errors are ignored.
#[derive(Debug)]
pub struct ByteChunks {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    command: String,
    ignore_errors: bool,
}

impl ByteChunks {
    /// Drain the stream into one buffer.
    ///
    /// # Errors
    ///
    /// Returns the first read or exit-status error.
    pub fn read_all(self) -> Result<Vec<u8>, VcsError> {
        let mut out = Vec::new();
        for chunk in self {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<(), VcsError> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait()?;
        debug!(command = %self.command, status = ?status.code(), "binary command finished");
        if !status.success() && !self.ignore_errors {
            return Err(VcsError::Command {
                command: self.command.clone(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

impl Iterator for ByteChunks {
    type Item = Result<Vec<u8>, VcsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(stdout) = self.stdout.as_mut() else {
            return self.finish().err().map(Err);
        };

        let mut buf = vec![0; CHUNK_SIZE];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => return self.finish().err().map(Err),
                Ok(n) => {
                    buf.truncate(n);
                    trace!(bytes = n, "read chunk");
                    return Some(Ok(buf));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.stdout = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl Drop for ByteChunks {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            self.stdout = None;
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
