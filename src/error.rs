use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse manifest. Original error: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    #[error("Failed to parse settings file. Original error: {0}")]
    SettingsParseError(#[from] serde_yaml::Error),

    #[error("Failed to build path matcher. Original error: {0}")]
    GlobSetParseError(#[from] globset::Error),

    #[error("Git operation failed. Original error: {0}")]
    Git2Error(#[from] git2::Error),

    #[error("Repository request failed. Original error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Represents validation failures in slug or manifest declarations
    #[error("Validation error: {0}.")]
    ValidationError(String),

    #[error("Cannot proceed: no template builder recognizes the directory '{directory}'.")]
    UnsupportedDirectoryError { directory: String },

    #[error(
        "Manifest schema version {version} is outside the supported range [{min}, {max}]."
    )]
    VersionUnsupportedError { version: u32, min: u32, max: u32 },

    /// A mandatory slug was left without a value.
    #[error("No value provided for required setting '{display_name}'.")]
    MissingRequiredValueError { display_name: String },

    #[error("Archive error: {0}.")]
    ArchiveError(String),

    #[error("Cannot proceed: output directory '{output_dir}' already exists. Use --force to overwrite it.")]
    OutputDirectoryExistsError { output_dir: String },

    #[error("Cannot proceed: template archive '{archive_path}' does not exist.")]
    ArchiveDoesNotExistError { archive_path: String },

    #[error("Cannot process the path: '{source_path}'. Original error: {e}")]
    ProcessError { source_path: String, e: String },

    #[error("Could not delete scratch directory '{directory}' after {attempts} attempt(s).")]
    ScratchCleanupError { directory: String, attempts: u32 },
}

/// Convenience type alias for Results with the Stencil Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal condition surfaced to the user without failing the operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A post-generation command exited non-zero or could not be started.
    CommandFailed { command: String, detail: String },
    /// A git step failed; project creation still counts as a success.
    GitOperation(String),
    /// One remote repository could not be listed; others still were.
    RepositoryAccess { repository: String, detail: String },
    /// A provided value matched no setting declared by the template.
    UnknownSetting { key: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::CommandFailed { command, detail } => {
                write!(f, "command '{command}' failed: {detail}")
            }
            Warning::GitOperation(detail) => write!(f, "git operation failed: {detail}"),
            Warning::RepositoryAccess { repository, detail } => {
                write!(f, "repository '{repository}' unreachable: {detail}")
            }
            Warning::UnknownSetting { key } => {
                write!(f, "provided value '{key}' matches no template setting")
            }
        }
    }
}

impl Warning {
    pub fn command_failed(command: &str, status: ExitStatus) -> Self {
        Warning::CommandFailed {
            command: command.to_string(),
            detail: format!("exit status {status}"),
        }
    }
}

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(crate::constants::exit_codes::FAILURE);
}
