use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::fmt::Display;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// Template builder selection for `prepare`.
#[derive(Debug, Clone, ValueEnum, Copy, PartialEq)]
#[value(rename_all = "lowercase")]
pub enum BuilderArg {
    /// Any directory; only the project name is substituted.
    Generic,
    /// .NET solution directories (`.sln`).
    Dotsln,
    /// XML solution directories (`.slnx`).
    Dotslnx,
}

impl Display for BuilderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuilderArg::Generic => "generic",
            BuilderArg::Dotsln => "dotsln",
            BuilderArg::Dotslnx => "dotslnx",
        };
        write!(f, "{s}")
    }
}

/// Git handling for the generated project.
#[derive(Debug, Clone, ValueEnum, Copy, PartialEq, Default)]
#[value(rename_all = "lowercase")]
pub enum GitArg {
    /// Do not touch git at all.
    #[default]
    None,
    /// Initialize an empty repository.
    Init,
    /// Initialize, commit everything, and add the `--git-remote` origin.
    Full,
}

/// CLI arguments for Stencil.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a source directory into a template archive.
    Prepare(PrepareArgs),
    /// Generate a project from a template archive.
    Generate(GenerateArgs),
    /// List templates available in the configured repositories.
    List(ListArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct PrepareArgs {
    /// Source directory to turn into a template.
    #[arg(value_name = "SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Directory the template archive is written to.
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Template name; defaults to the source directory name.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Template author recorded in the manifest.
    #[arg(long)]
    pub author: Option<String>,

    /// Template description recorded in the manifest.
    #[arg(long)]
    pub description: Option<String>,

    /// Seed manifest file with slug declarations and path rules.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Builder to prepare with; auto-detected when omitted.
    #[arg(short, long, value_enum)]
    pub builder: Option<BuilderArg>,

    /// Paths excluded from the template (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub excluded: Vec<String>,

    /// Paths whose subtrees only get name substitution (repeatable).
    #[arg(long = "rename-only", value_name = "PATTERN")]
    pub rename_only: Vec<String>,

    /// Keep the scratch copy next to the archive for inspection.
    #[arg(long = "skip-cleaning")]
    pub skip_cleaning: bool,

    /// Report every change without writing an archive.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Replace an existing archive.
    #[arg(short, long)]
    pub force: bool,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    /// Template archive to generate from.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Destination directory for the generated project.
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Predefined slug values as `key=value` pairs (repeatable).
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    pub values: Vec<String>,

    /// Disable interactive prompts; defaults must cover every slug.
    #[arg(long = "non-interactive")]
    pub non_interactive: bool,

    /// Git handling for the generated project.
    #[arg(long = "git", value_enum, default_value_t = GitArg::None)]
    pub git: GitArg,

    /// Remote URL for `--git full`.
    #[arg(long = "git-remote", value_name = "URL")]
    pub git_remote: Option<String>,

    /// Replace an existing output directory.
    #[arg(short, long)]
    pub force: bool,

    /// Report every change without creating the project.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Settings file naming the repositories; defaults to the user config dir.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn parse_cli() -> Cli {
    Cli::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Cli::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Error,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
