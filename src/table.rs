//! The substitution engine: the per-run replacement table and its
//! application to file contents and file system names.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ioutils::{path_depth, path_to_str};
use crate::scanner::Classification;
use crate::slug::{Slug, SlugKind, SlugValue};

/// An ordered search-string to replacement-string mapping, built once per
/// prepare or generate run and immutable afterwards.
///
/// Entries are held sorted by descending search-string length. This is the
/// central correctness invariant: a longer match is always attempted before
/// any of its substrings, so no replacement is corrupted by a shorter
/// overlapping one.
#[derive(Debug)]
pub struct ReplacementTable {
    entries: Vec<(String, String)>,
}

impl ReplacementTable {
    fn from_entries(entries: Vec<(String, String)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (search, _) in &entries {
            if search.is_empty() {
                return Err(Error::ValidationError(
                    "replacement table contains an empty search string".into(),
                ));
            }
            if !seen.insert(search.clone()) {
                return Err(Error::ValidationError(format!(
                    "search string '{search}' is mapped twice"
                )));
            }
        }

        let mut entries = entries;
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Ok(Self { entries })
    }

    /// Builds the preparation-direction table: every declared search string
    /// of every slug maps to that slug's placeholder tag.
    pub fn tokenize(slugs: &[Slug]) -> Result<Self> {
        let mut entries = Vec::new();
        for slug in slugs {
            if slug.kind == SlugKind::RandomGuid && slug.search_strings.len() != 1 {
                return Err(Error::ValidationError(format!(
                    "generated-identifier slug '{}' must map exactly one source value",
                    slug.key
                )));
            }
            for search in &slug.search_strings {
                entries.push((search.clone(), slug.placeholder()));
            }
        }
        Ok(Self::from_entries(entries)?)
    }

    /// Builds the generation-direction table: each placeholder tag maps to
    /// its bound value. Generated-identifier slugs receive a fresh UUID on
    /// every call, never a persisted one.
    pub fn materialize(
        slugs: &[Slug],
        values: &IndexMap<String, SlugValue>,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for slug in slugs {
            let replacement = if slug.kind == SlugKind::RandomGuid {
                Uuid::new_v4().to_string()
            } else {
                let value = values.get(&slug.key).ok_or_else(|| {
                    Error::MissingRequiredValueError {
                        display_name: slug.display_name.clone(),
                    }
                })?;
                value.render(slug.kind)
            };
            entries.push((slug.placeholder(), replacement));
        }
        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Applies every entry, in table order, to the given text.
    pub fn apply_str(&self, input: &str) -> String {
        let mut output = input.to_string();
        for (search, replacement) in &self.entries {
            output = output.replace(search, replacement);
        }
        output
    }

    /// Applies the table to a classified tree: a content pass over every
    /// content-edit file, then a rename pass over every renameable path,
    /// deepest paths first so a parent rename never invalidates a pending
    /// child rename.
    ///
    /// With `dry_run` set every would-be write and rename lands in the
    /// report and the disk is left untouched. Any read, write or rename
    /// failure aborts the whole pass naming the failing path; callers are
    /// expected to operate on a disposable copy.
    pub fn apply(
        &self,
        root: &Path,
        classification: &Classification,
        dry_run: bool,
    ) -> Result<ChangeReport> {
        let mut report = ChangeReport::new(dry_run);

        for relative in &classification.content_edit {
            let path = root.join(relative);
            let content = std::fs::read_to_string(&path).map_err(|e| process_error(&path, e))?;
            let updated = self.apply_str(&content);
            if updated != content {
                if !dry_run {
                    std::fs::write(&path, updated).map_err(|e| process_error(&path, e))?;
                }
                report.edited.push(relative.clone());
            }
        }

        let mut renameable: Vec<&PathBuf> = classification.renameable().collect();
        renameable.sort_by(|a, b| {
            path_depth(b).cmp(&path_depth(a)).then_with(|| b.cmp(a))
        });

        for relative in renameable {
            let name = match relative.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let updated = self.apply_str(name);
            if updated == name {
                continue;
            }
            let renamed = match relative.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.join(&updated),
                _ => PathBuf::from(&updated),
            };
            if !dry_run {
                let from = root.join(relative);
                let to = root.join(&renamed);
                if to.exists() {
                    return Err(Error::ProcessError {
                        source_path: path_to_str(&to)?.to_string(),
                        e: format!("rename target already exists for '{}'", from.display()),
                    });
                }
                std::fs::rename(&from, &to).map_err(|e| process_error(&from, e))?;
            }
            report.renamed.push((relative.clone(), renamed));
        }

        Ok(report)
    }
}

fn process_error(path: &Path, e: std::io::Error) -> Error {
    Error::ProcessError { source_path: path.display().to_string(), e: e.to_string() }
}

/// Everything one apply pass changed, or would have changed under dry-run.
#[derive(Debug)]
pub struct ChangeReport {
    pub dry_run: bool,
    /// Files whose content changed, relative to the applied root.
    pub edited: Vec<PathBuf>,
    /// Renames performed, as (old relative path, new relative path).
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

impl ChangeReport {
    fn new(dry_run: bool) -> Self {
        Self { dry_run, edited: Vec::new(), renamed: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.edited.is_empty() && self.renamed.is_empty()
    }

    /// Human-readable one-line-per-change summary.
    pub fn lines(&self) -> Vec<String> {
        let prefix = if self.dry_run { "[DRY RUN] " } else { "" };
        let mut lines: Vec<String> = self
            .edited
            .iter()
            .map(|p| format!("{prefix}Edited '{}'", p.display()))
            .collect();
        lines.extend(
            self.renamed
                .iter()
                .map(|(from, to)| {
                    format!("{prefix}Renamed '{}' -> '{}'", from.display(), to.display())
                }),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{classify, MatchRules};
    use std::fs;
    use tempfile::TempDir;

    fn table(entries: &[(&str, &str)]) -> ReplacementTable {
        ReplacementTable::from_entries(
            entries.iter().map(|(s, r)| (s.to_string(), r.to_string())).collect(),
        )
        .unwrap()
    }

    #[test]
    fn longer_search_strings_win_over_their_substrings() {
        let table = table(&[("Widget", "[[A]]"), ("WidgetPro", "[[B]]")]);
        assert_eq!(table.apply_str("WidgetPro and Widget"), "[[B]] and [[A]]");
    }

    #[test]
    fn equal_length_entries_apply_in_stable_order() {
        let table = table(&[("bb", "2"), ("aa", "1")]);
        assert_eq!(table.apply_str("aabb"), "12");
        assert_eq!(table.entries()[0].0, "aa");
    }

    #[test]
    fn rejects_empty_and_duplicate_search_strings() {
        let empty = ReplacementTable::from_entries(vec![("".into(), "x".into())]);
        assert!(matches!(empty, Err(Error::ValidationError(_))));

        let duplicate = ReplacementTable::from_entries(vec![
            ("same".into(), "a".into()),
            ("same".into(), "b".into()),
        ]);
        assert!(matches!(duplicate, Err(Error::ValidationError(_))));
    }

    #[test]
    fn non_guid_application_is_idempotent() {
        let table = table(&[("[[ProjectName]]", "Contoso")]);
        let once = table.apply_str("Hello [[ProjectName]]!");
        let twice = table.apply_str(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn materialize_mints_a_fresh_guid_per_run() {
        let mut slug = Slug::new("GUID00", "GUID00", SlugKind::RandomGuid);
        slug.search_strings = vec!["unused".into()];
        let values = IndexMap::new();

        let first = ReplacementTable::materialize(&[slug.clone()], &values).unwrap();
        let second = ReplacementTable::materialize(&[slug], &values).unwrap();
        assert_ne!(first.entries()[0].1, second.entries()[0].1);
        assert_eq!(first.entries()[0].0, "[[GUID00]]");
    }

    #[test]
    fn materialize_fails_on_missing_required_value() {
        let slug = Slug::new("Author", "Author", SlugKind::String);
        let result = ReplacementTable::materialize(&[slug], &IndexMap::new());
        assert!(matches!(result, Err(Error::MissingRequiredValueError { .. })));
    }

    fn classified(root: &Path) -> Classification {
        let rules = MatchRules::new(&[], &[]).unwrap();
        classify(root, &rules).unwrap()
    }

    #[test]
    fn apply_edits_content_and_renames_deepest_first() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("MyProject/sub")).unwrap();
        fs::write(root.join("MyProject/sub/MyProject.txt"), "name: MyProject").unwrap();

        let table = table(&[("MyProject", "[[ProjectName]]")]);
        let report = table.apply(root, &classified(root), false).unwrap();

        assert!(root.join("[[ProjectName]]/sub/[[ProjectName]].txt").exists());
        let content =
            fs::read_to_string(root.join("[[ProjectName]]/sub/[[ProjectName]].txt")).unwrap();
        assert_eq!(content, "name: [[ProjectName]]");
        assert_eq!(report.edited.len(), 1);
        assert_eq!(report.renamed.len(), 2);
        // The file (deeper) renames before its ancestor directory.
        assert!(path_depth(&report.renamed[0].0) > path_depth(&report.renamed[1].0));
    }

    #[test]
    fn apply_skips_writes_when_nothing_changes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("plain.txt"), "untouched").unwrap();

        let table = table(&[("Absent", "[[X]]")]);
        let report = table.apply(root, &classified(root), false).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn dry_run_reports_changes_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("MyProject.txt"), "MyProject content").unwrap();

        let table = table(&[("MyProject", "[[ProjectName]]")]);
        let report = table.apply(root, &classified(root), true).unwrap();

        assert_eq!(report.edited, vec![PathBuf::from("MyProject.txt")]);
        assert_eq!(report.renamed.len(), 1);
        assert!(root.join("MyProject.txt").exists());
        assert_eq!(
            fs::read_to_string(root.join("MyProject.txt")).unwrap(),
            "MyProject content"
        );
        assert!(report.lines().iter().all(|l| l.starts_with("[DRY RUN] ")));
    }

    #[test]
    fn rename_onto_existing_path_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("Old.txt"), "a").unwrap();
        fs::write(root.join("New.txt"), "b").unwrap();

        let table = table(&[("Old", "New")]);
        let result = table.apply(root, &classified(root), false);
        assert!(matches!(result, Err(Error::ProcessError { .. })));
    }
}
