//! Classifies every entry of a directory tree for the substitution engine.
//!
//! Each file or directory lands in exactly one bucket: excluded (never
//! touched, pruned with its whole subtree), rename-only (name substituted,
//! content left alone) or content-edit (name and content substituted).

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::ALWAYS_EXCLUDED_DIRS;
use crate::error::{Error, Result};
use crate::ioutils::is_text_file;

/// Path-matching rules derived from a manifest's exclusion lists.
pub struct MatchRules {
    excluded: GlobSet,
    rename_only: GlobSet,
}

impl MatchRules {
    /// Builds matchers from manifest path lists. Matching is case-insensitive
    /// and name-based: a bare `bin` entry matches a `bin` entry anywhere in
    /// the tree, while `docs/assets` only matches that relative path.
    pub fn new(excluded: &[String], rename_only: &[String]) -> Result<Self> {
        let excluded_patterns: Vec<String> = excluded
            .iter()
            .map(String::as_str)
            .chain(ALWAYS_EXCLUDED_DIRS.iter().copied())
            .map(str::to_string)
            .collect();
        Ok(Self {
            excluded: build_globset(&excluded_patterns)?,
            rename_only: build_globset(rename_only)?,
        })
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excluded.is_match(relative)
    }

    pub fn is_rename_only(&self, relative: &Path) -> bool {
        self.rename_only.is_match(relative)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim_end_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        // Bare names match at any depth, paths only at their declared spot.
        let expanded = if trimmed.contains('/') {
            vec![trimmed.to_string()]
        } else {
            vec![trimmed.to_string(), format!("**/{trimmed}")]
        };
        for glob in expanded {
            builder.add(
                GlobBuilder::new(&glob)
                    .case_insensitive(true)
                    .literal_separator(true)
                    .build()?,
            );
        }
    }
    Ok(builder.build()?)
}

/// The result of one classification pass. All paths are relative to the
/// scanned root and sorted.
#[derive(Debug, Default)]
pub struct Classification {
    /// Files whose content and name are substituted.
    pub content_edit: Vec<PathBuf>,
    /// Files and directories whose name only is substituted.
    pub rename_only: Vec<PathBuf>,
    /// Pruned entries; nothing beneath them is ever visited.
    pub excluded: Vec<PathBuf>,
}

impl Classification {
    /// All paths whose base name participates in the rename pass.
    pub fn renameable(&self) -> impl Iterator<Item = &PathBuf> {
        self.content_edit.iter().chain(self.rename_only.iter())
    }
}

/// Walks `root` and classifies every entry beneath it.
///
/// Directories are visited before their children; an excluded directory is
/// pruned so exclusion is transitive. Files that fail the text probe are
/// demoted to rename-only so binary content is never edited. Unreadable
/// entries abort the whole pass: a partially classified tree must never be
/// substituted.
pub fn classify(root: &Path, rules: &MatchRules) -> Result<Classification> {
    let mut classification = Classification::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !rules.is_excluded(relative)
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            if e.io_error().is_some() {
                Error::IoError(e.into())
            } else {
                Error::ProcessError {
                    source_path: root.display().to_string(),
                    e: e.to_string(),
                }
            }
        })?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::ProcessError {
                source_path: entry.path().display().to_string(),
                e: e.to_string(),
            })?
            .to_path_buf();

        let inherited_rename_only = relative
            .ancestors()
            .skip(1)
            .filter(|a| !a.as_os_str().is_empty())
            .any(|a| rules.is_rename_only(a));

        if entry.file_type().is_dir() {
            classification.rename_only.push(relative);
        } else if inherited_rename_only
            || rules.is_rename_only(&relative)
            || !is_text_file(entry.path())?
        {
            classification.rename_only.push(relative);
        } else {
            classification.content_edit.push(relative);
        }
    }

    // Record the pruned roots for reporting; their contents stay unvisited.
    collect_excluded(root, root, rules, &mut classification.excluded)?;

    classification.content_edit.sort();
    classification.rename_only.sort();
    classification.excluded.sort();
    Ok(classification)
}

fn collect_excluded(
    dir: &Path,
    root: &Path,
    rules: &MatchRules,
    excluded: &mut Vec<PathBuf>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        if rules.is_excluded(&relative) {
            excluded.push(relative);
        } else if entry.file_type()?.is_dir() {
            collect_excluded(&path, root, rules, excluded)?;
        }
    }
    Ok(())
}
