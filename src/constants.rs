//! Constants used throughout the Stencil application

/// File name of the serialized manifest inside a template archive
pub const MANIFEST_FILE_NAME: &str = ".template.json";

/// File extension for template archives
pub const TEMPLATE_FILE_EXTENSION: &str = "ptt";

/// Suffix appended to the scratch working directory used while preparing
pub const SCRATCH_DIR_SUFFIX: &str = "_stencilgen";

/// Oldest manifest schema version this build can read
pub const MIN_SUPPORTED_SCHEMA: u32 = 1;

/// Newest manifest schema version this build can read
pub const MAX_SUPPORTED_SCHEMA: u32 = 2;

/// Schema version written by this build
pub const CURRENT_SCHEMA: u32 = 2;

/// Schema version of the application settings document, versioned
/// independently of the template manifest schema.
pub const CURRENT_SETTINGS_SCHEMA: u32 = 1;

/// Opening delimiter of a placeholder tag
pub const SLUG_OPEN: &str = "[[";

/// Closing delimiter of a placeholder tag
pub const SLUG_CLOSE: &str = "]]";

/// Slug key of the canonical project-name placeholder
pub const PROJECT_NAME_SLUG_KEY: &str = "ProjectName";

/// Key prefix for generated-identifier slugs; a zero-padded index follows
pub const GUID_SLUG_PREFIX: &str = "GUID";

/// Directory names never carried into a template or generated project
pub const ALWAYS_EXCLUDED_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Maximum directory depth when listing a remote template repository
pub const MAX_REPOSITORY_DEPTH: usize = 3;

/// Per-repository request timeout, in seconds
pub const REPOSITORY_TIMEOUT_SECS: u64 = 10;

/// Number of bytes probed when deciding whether a file is text
pub const TEXT_PROBE_BYTES: usize = 8192;

/// Bounded retry parameters for removing a directory right after archiving;
/// the OS may hold the archive's source handles open for a short while.
pub mod cleanup_retry {
    pub const MAX_ATTEMPTS: u32 = 10;
    pub const BASE_DELAY_MS: u64 = 100;
    pub const MAX_DELAY_MS: u64 = 3000;
}

/// Exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
