/// Handles argument parsing and command orchestration.
pub mod cli;

/// Defines custom error and warning types.
pub mod error;

/// Well-known names, limits and exit codes.
pub mod constants;

/// Slug data model and slug resolution.
pub mod slug;

/// Classifies a source tree into content-edit, rename-only and excluded paths.
pub mod scanner;

/// The per-run replacement table and its application.
pub mod table;

/// The manifest document packed into every template archive.
pub mod manifest;

/// Static registry of template builders.
pub mod builders;

/// Template archive packing, unpacking and checksums.
pub mod archive;

/// Turns a source tree into a template archive.
pub mod prepare;

/// Turns a template archive into a concrete project.
pub mod generate;

/// Remote template repository listing and download.
pub mod repository;

/// User-owned application settings.
pub mod settings;

/// Slug value acquisition, interactive and not.
pub mod prompt;

/// Post-generation command execution.
pub mod commands;

/// Best-effort git initialization for generated projects.
pub mod gitops;

/// A set of helpers for working with the file system.
pub mod ioutils;
