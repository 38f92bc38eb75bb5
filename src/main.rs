use std::io::IsTerminal;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use vcsview_core::{CommitRecord, OutputFormat, VcsConfig};
use vcsview_difflens::filter::{select_paths, PathFilter};
use vcsview_difflens::model::{FileDiff, LineKind};
use vcsview_difflens::parser::ParsedFileDiff;
use vcsview_graph::builder::{build_graph, build_graph_window, GraphHistory};
use vcsview_graph::history::{build_history, RejectedRecord};
use vcsview_wrapper::command::{VcsKind, Wrapper};
use vcsview_wrapper::repository::{FileKind, Repository};

#[derive(Parser)]
#[command(
    name = "vcsview",
    version,
    about = "Structured diffs and commit graphs from git output",
    long_about = "vcsview turns raw version-control output into structured data.\n\n\
                   Unified diffs become files, hunks and numbered lines; commit logs\n\
                   become graph rows with stable lanes.\n\n\
                   Examples:\n  \
                     git diff | vcsview diff            Parse a diff from stdin\n  \
                     vcsview diff --repo . --rev HEAD~1 Diff the working tree against a revision\n  \
                     vcsview log --repo . --limit 20    Draw the commit graph\n  \
                     vcsview log --records log.json     Lay out commit records from a file\n  \
                     vcsview files --repo . src         List a project directory"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .vcsview.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable output (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging to stderr)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a unified diff into files, hunks and lines
    #[command(long_about = "Parse a unified diff into files, hunks and lines.\n\n\
        Reads from --file, from a repository with --repo, or from stdin.\n\
        Malformed hunks are dropped and reported; the rest of the diff is kept.\n\n\
        Examples:\n  git diff | vcsview diff\n  vcsview diff --repo . --rev main --path 'src/**'")]
    Diff {
        /// Diff file to read (default: stdin)
        #[arg(long, conflicts_with = "repo")]
        file: Option<PathBuf>,

        /// Repository to diff instead of reading input
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Revision to diff the working tree against (requires --repo)
        #[arg(long, requires = "repo")]
        rev: Option<String>,

        /// Show the diff of this commit instead of the working tree (requires --repo)
        #[arg(long, requires = "repo", conflicts_with = "rev")]
        commit: Option<String>,

        /// Only show files matching these globs
        #[arg(long)]
        path: Vec<String>,
    },
    /// Lay out commit history as a graph
    #[command(long_about = "Lay out commit history as a graph.\n\n\
        Reads history from a repository, or raw commit records (JSON array)\n\
        with --records. Invalid records are skipped and reported.\n\n\
        Examples:\n  vcsview log --repo . --limit 30\n  vcsview log --records commits.json --skip 10 --limit 10")]
    Log {
        /// Repository path (default: current directory)
        #[arg(long, conflicts_with = "records")]
        repo: Option<PathBuf>,

        /// Commits per window (default: from config, 50)
        #[arg(long)]
        limit: Option<usize>,

        /// Commits to skip before the window
        #[arg(long)]
        skip: Option<usize>,

        /// Branch to walk (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Only commits touching this path
        #[arg(long)]
        path: Option<String>,

        /// JSON file with commit records, newest first ("-" for stdin)
        #[arg(long)]
        records: Option<PathBuf>,
    },
    /// List local branches
    Branches {
        /// Repository path (default: current directory)
        #[arg(long)]
        repo: Option<PathBuf>,
    },
    /// List a project directory
    Files {
        /// Repository path (default: current directory)
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Subdirectory relative to the project root
        sub_dir: Option<PathBuf>,
    },
    /// Create a default .vcsview.toml configuration file
    #[command(long_about = "Create a default .vcsview.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .vcsview.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# vcsview configuration
# See: https://github.com/Meru143/vcsview

[wrapper]
# git_command = "git"
# hg_command = "hg"
# ignore_errors = false

[history]
# limit = 50
# skip = 0

[diff]
# context_lines = 3
# skip_patterns = ["*.lock", "*.min.js", "vendor/**"]
"#;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<VcsConfig> {
    let config = match path {
        Some(path) => VcsConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".vcsview.toml");
            if default_path.exists() {
                VcsConfig::from_file(default_path)?
            } else {
                VcsConfig::default()
            }
        }
    };
    Ok(config)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

fn open_repository(repo: Option<&Path>, config: &VcsConfig) -> Result<Repository> {
    let wrapper = Wrapper::from_config(VcsKind::Git, &config.wrapper);
    let dir = repo.unwrap_or_else(|| Path::new("."));
    let repository = Repository::discover(dir, wrapper)?;
    Ok(repository.with_context_lines(config.diff.context_lines))
}

fn paint(text: &str, code: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn print_file_diff(diff: &FileDiff, use_color: bool) {
    let stats = diff.stats();
    let header = format!(
        "{} (+{} -{})",
        diff.display_path(),
        stats.added,
        stats.removed
    );
    println!("{}", paint(&header, "1", use_color));
    if diff.file_is_new() {
        println!("  new file");
    } else if diff.file_removed() {
        println!("  removed");
    } else if diff.previous_path != diff.new_path {
        println!("  renamed from {}", diff.previous_path);
    }
    if diff.is_binary {
        println!("  binary content");
    }

    for hunk in &diff.hunks {
        println!("{}", paint(&hunk.header(), "36", use_color));
        for line in &hunk.lines {
            let old = line.old_line_no.map(|n| n.to_string()).unwrap_or_default();
            let new = line.new_line_no.map(|n| n.to_string()).unwrap_or_default();
            let body = format!("{}{}", line.kind.marker(), line.text);
            let body = match line.kind {
                LineKind::Added => paint(&body, "32", use_color),
                LineKind::Removed => paint(&body, "31", use_color),
                LineKind::Context => body,
            };
            println!("{old:>5} {new:>5} {body}");
            for marker in &line.markers {
                println!("            {marker}");
            }
        }
    }
    println!();
}

fn report_diff_issues(diffs: &[ParsedFileDiff]) {
    for parsed in diffs {
        for issue in &parsed.issues {
            eprintln!("warning: {}: {issue}", parsed.diff.display_path());
        }
    }
}

fn report_rejected(rejected: &[RejectedRecord]) {
    for record in rejected {
        eprintln!(
            "warning: skipped commit record #{} ({}): {}",
            record.index,
            if record.id.is_empty() { "no id" } else { record.id.as_str() },
            record.error
        );
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LogOutput<'a> {
    #[serde(flatten)]
    graph: &'a GraphHistory,
    rejected: &'a [RejectedRecord],
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help().into_diagnostic()?;
        }
        Some(Command::Diff {
            ref file,
            ref repo,
            ref rev,
            ref commit,
            ref path,
        }) => {
            let diffs = match repo {
                Some(repo) => {
                    let repository = open_repository(Some(repo.as_path()), &config)?;
                    match commit {
                        Some(id) => repository.commit_diff(id, None)?,
                        None => repository.diff(rev.as_deref(), None)?,
                    }
                }
                None => {
                    let input = read_input(file.as_deref())?;
                    if input.trim().is_empty() {
                        miette::bail!(miette::miette!(
                            help = "Pipe a diff to vcsview, e.g.: git diff | vcsview diff\n       Or use --file <path> or --repo <dir>",
                            "Empty diff input"
                        ));
                    }
                    vcsview_difflens::parser::parse_unified_diff(&input)
                }
            };

            let selected = select_paths(diffs, path)?;
            let filtered = PathFilter::from_config(&config.diff)?.skip(selected.kept);
            if cli.verbose && !filtered.skipped.is_empty() {
                eprintln!("Skipped {} file(s) by config", filtered.skipped.len());
            }
            let diffs = filtered.kept;
            report_diff_issues(&diffs);

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&diffs).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    if diffs.is_empty() {
                        println!("No changes.");
                    }
                    for parsed in &diffs {
                        print_file_diff(&parsed.diff, use_color);
                    }
                }
            }
        }
        Some(Command::Log {
            ref repo,
            limit,
            skip,
            ref branch,
            ref path,
            ref records,
        }) => {
            let limit = limit.unwrap_or(config.history.limit);
            let skip = skip.unwrap_or(config.history.skip);
            if limit == 0 {
                miette::bail!("--limit must be at least 1");
            }

            let (graph, rejected) = match records {
                Some(file) => {
                    let input = read_input(Some(file.as_path()))?;
                    let records: Vec<CommitRecord> = serde_json::from_str(&input)
                        .into_diagnostic()
                        .wrap_err("parsing commit records")?;
                    let history = build_history(records);
                    (
                        build_graph_window(history.commits, skip, limit),
                        history.rejected,
                    )
                }
                None => {
                    let repository = open_repository(repo.as_deref(), &config)?;
                    let records =
                        repository.history(limit, skip, path.as_deref(), branch.as_deref())?;
                    let history = build_history(records);
                    (build_graph(history.commits), history.rejected)
                }
            };
            report_rejected(&rejected);

            match cli.format {
                OutputFormat::Json => {
                    let output = LogOutput {
                        graph: &graph,
                        rejected: &rejected,
                    };
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    print!("{}", vcsview_graph::render::render_text(&graph));
                }
            }
        }
        Some(Command::Branches { ref repo }) => {
            let repository = open_repository(repo.as_deref(), &config)?;
            let branches = repository.branches()?;
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&branches).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    for branch in &branches {
                        let short: String = branch.head.chars().take(7).collect();
                        if branch.is_current {
                            let name = paint(&branch.id, "32", use_color);
                            println!("* {name} {short}");
                        } else {
                            println!("  {} {short}", branch.id);
                        }
                    }
                }
            }
        }
        Some(Command::Files {
            ref repo,
            ref sub_dir,
        }) => {
            let repository = open_repository(repo.as_deref(), &config)?;
            let entries = repository.list_files(sub_dir.as_deref())?;
            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&entries).into_diagnostic()?
                    );
                }
                OutputFormat::Text => {
                    for entry in &entries {
                        let ignored = repository.is_path_ignored(&entry.path).unwrap_or(false);
                        let name = match entry.kind {
                            FileKind::Directory => format!("{}/", entry.name),
                            FileKind::Link => format!("{}@", entry.name),
                            FileKind::File => entry.name.clone(),
                        };
                        if ignored {
                            println!("{}", paint(&name, "2", use_color));
                        } else {
                            println!("{name}");
                        }
                    }
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".vcsview.toml");
            if path.exists() {
                miette::bail!(".vcsview.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .vcsview.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vcsview", &mut std::io::stdout());
        }
    }

    Ok(())
}
