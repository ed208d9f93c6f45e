//! Template preparation: turns a working source tree into a portable
//! template archive.
//!
//! The source tree is never mutated. All substitution happens inside a
//! scratch copy placed next to the archive, and the scratch copy is removed
//! once the archive is written.

use log::{debug, info};
use std::path::PathBuf;

use crate::archive;
use crate::builders::{detect, BuilderKind};
use crate::constants::{
    CURRENT_SCHEMA, MANIFEST_FILE_NAME, SCRATCH_DIR_SUFFIX, TEMPLATE_FILE_EXTENSION,
};
use crate::error::{Error, Result};
use crate::ioutils::{copy_dir_filtered, create_dir_all, get_output_dir, remove_dir_with_retry};
use crate::manifest::TemplateManifest;
use crate::scanner::{classify, MatchRules};
use crate::slug::{base_preparation_slug, discover_marker_slugs, merge_slugs, Slug};
use crate::table::{ChangeReport, ReplacementTable};

pub struct PrepareOptions {
    /// The tree to turn into a template. Read-only throughout.
    pub source_dir: PathBuf,
    /// Where the archive (and the transient scratch copy) land.
    pub output_dir: PathBuf,
    /// Caller-authored manifest seed: identity, declared slugs, path rules.
    pub seed: TemplateManifest,
    /// Explicit builder choice; `None` auto-detects.
    pub builder: Option<BuilderKind>,
    /// Leave the scratch copy behind for inspection.
    pub skip_cleaning: bool,
    /// Report every change without writing an archive.
    pub dry_run: bool,
    /// Replace an existing archive or scratch directory.
    pub force: bool,
}

pub struct PreparationResult {
    /// `None` under dry-run.
    pub archive_path: Option<PathBuf>,
    pub report: ChangeReport,
    /// The fully resolved slug list, in presentation order.
    pub slugs: Vec<Slug>,
    /// Set when `skip_cleaning` kept the scratch copy.
    pub scratch_dir: Option<PathBuf>,
}

/// Runs the whole preparation pipeline: pre-flight, scratch copy, scan,
/// slug resolution, tokenize apply, manifest, archive, cleanup.
pub fn prepare(options: PrepareOptions) -> Result<PreparationResult> {
    if !options.source_dir.is_dir() {
        return Err(Error::ValidationError(format!(
            "source directory '{}' does not exist",
            options.source_dir.display()
        )));
    }
    if options.seed.name.trim().is_empty() {
        return Err(Error::ValidationError("template name is empty".into()));
    }

    let kind = match options.builder {
        Some(kind) => {
            if !kind.builder().is_valid_directory(&options.source_dir)? {
                return Err(Error::UnsupportedDirectoryError {
                    directory: options.source_dir.display().to_string(),
                });
            }
            kind
        }
        None => detect(&options.source_dir)?,
    };
    info!(
        "Preparing template '{}' with the {kind:?} builder",
        options.seed.name
    );

    let safe_name = options.seed.safe_name();
    let archive_path = options
        .output_dir
        .join(format!("{safe_name}.{TEMPLATE_FILE_EXTENSION}"));
    if !options.dry_run && archive_path.exists() {
        if !options.force {
            return Err(Error::ArchiveError(format!(
                "archive '{}' already exists",
                archive_path.display()
            )));
        }
        std::fs::remove_file(&archive_path)?;
    }

    create_dir_all(&options.output_dir)?;
    let scratch = get_output_dir(
        options.output_dir.join(format!("{safe_name}{SCRATCH_DIR_SUFFIX}")),
        options.force,
    )?;

    let rules = MatchRules::new(
        &options.seed.prepare_excluded_paths,
        &options.seed.rename_only_paths,
    )?;
    copy_dir_filtered(&options.source_dir, &scratch, &|relative, _is_dir| {
        !rules.is_excluded(relative)
    })?;

    let classification = classify(&scratch, &rules)?;
    debug!(
        "classified {} content file(s), {} rename-only path(s)",
        classification.content_edit.len(),
        classification.rename_only.len()
    );

    let mut base_searches = vec![options.seed.name.clone()];
    if safe_name != options.seed.name {
        base_searches.push(safe_name.clone());
    }
    let base = base_preparation_slug(base_searches);
    let builder_slugs = kind.builder().preparation_slugs(&scratch)?;

    let mut slugs = merge_slugs(vec![
        vec![base],
        builder_slugs,
        options.seed.slugs.clone(),
    ])?;
    let discovered = discover_marker_slugs(&scratch, &classification, &slugs)?;
    slugs.extend(discovered);

    let table = ReplacementTable::tokenize(&slugs)?;
    let report = table.apply(&scratch, &classification, options.dry_run)?;

    if options.dry_run {
        remove_dir_with_retry(&scratch)?;
        return Ok(PreparationResult {
            archive_path: None,
            report,
            slugs,
            scratch_dir: None,
        });
    }

    let mut manifest = options.seed;
    manifest.schema_version = CURRENT_SCHEMA;
    manifest.builder = kind;
    manifest.slugs = slugs.clone();
    manifest.replacements = table
        .entries()
        .iter()
        .cloned()
        .collect();
    manifest.validate_prepared()?;
    manifest.save(&scratch.join(MANIFEST_FILE_NAME))?;

    archive::create(&scratch, &archive_path)?;
    info!("Template archive written to '{}'", archive_path.display());

    let scratch_dir = if options.skip_cleaning {
        Some(scratch)
    } else {
        remove_dir_with_retry(&scratch)?;
        None
    };

    Ok(PreparationResult {
        archive_path: Some(archive_path),
        report,
        slugs,
        scratch_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::SlugKind;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn seed(name: &str) -> TemplateManifest {
        let mut manifest = TemplateManifest::new(name);
        manifest.author = "Jo".into();
        manifest
    }

    fn options(source: &Path, output: &Path, name: &str) -> PrepareOptions {
        PrepareOptions {
            source_dir: source.to_path_buf(),
            output_dir: output.to_path_buf(),
            seed: seed(name),
            builder: None,
            skip_cleaning: false,
            dry_run: false,
            force: false,
        }
    }

    fn sample_source(root: &Path) {
        fs::create_dir_all(root.join("MyProject")).unwrap();
        fs::write(root.join("README.md"), "# MyProject\nby AUTHOR").unwrap();
        fs::write(root.join("MyProject/app.txt"), "welcome to MyProject").unwrap();
    }

    #[test]
    fn prepare_writes_archive_and_removes_scratch() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        sample_source(&source);

        let result = prepare(options(&source, &output, "MyProject")).unwrap();

        let archive = result.archive_path.unwrap();
        assert_eq!(archive, output.join("MyProject.ptt"));
        assert!(archive.exists());
        assert!(!output.join("MyProject_stencilgen").exists());
        // Source tree untouched.
        assert_eq!(
            fs::read_to_string(source.join("MyProject/app.txt")).unwrap(),
            "welcome to MyProject"
        );

        let manifest = archive::read_manifest(&archive).unwrap();
        assert_eq!(
            manifest.replacements.get("MyProject"),
            Some(&"[[ProjectName]]".to_string())
        );
        assert_eq!(manifest.builder, BuilderKind::Generic);
    }

    #[test]
    fn dry_run_reports_changes_without_writing_an_archive() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        sample_source(&source);

        let mut opts = options(&source, &output, "MyProject");
        opts.dry_run = true;
        let result = prepare(opts).unwrap();

        assert!(result.archive_path.is_none());
        assert!(!result.report.is_empty());
        assert!(!output.join("MyProject.ptt").exists());
        assert!(!output.join("MyProject_stencilgen").exists());
    }

    #[test]
    fn existing_archive_requires_force() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        sample_source(&source);

        prepare(options(&source, &output, "MyProject")).unwrap();
        let again = prepare(options(&source, &output, "MyProject"));
        assert!(matches!(again, Err(Error::ArchiveError(_))));

        let mut forced = options(&source, &output, "MyProject");
        forced.force = true;
        assert!(prepare(forced).is_ok());
    }

    #[test]
    fn explicit_builder_must_accept_the_directory() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        sample_source(&source);

        let mut opts = options(&source, &output, "MyProject");
        opts.builder = Some(BuilderKind::DotSln);
        let result = prepare(opts);
        assert!(matches!(result, Err(Error::UnsupportedDirectoryError { .. })));
    }

    #[test]
    fn solution_guids_become_numbered_slugs_in_the_manifest() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        fs::create_dir_all(&source).unwrap();
        fs::write(
            source.join("MyProject.sln"),
            concat!(
                "Project(\"{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}\") = \"MyProject\", ",
                "\"MyProject.csproj\", \"{11111111-2222-3333-4444-555555555555}\"\n",
                "EndProject\n",
            ),
        )
        .unwrap();

        let result = prepare(options(&source, &output, "MyProject")).unwrap();
        let manifest = archive::read_manifest(&result.archive_path.unwrap()).unwrap();

        assert_eq!(manifest.builder, BuilderKind::DotSln);
        let guid = manifest
            .slugs
            .iter()
            .find(|s| s.kind == SlugKind::RandomGuid)
            .expect("identifier slug");
        assert_eq!(guid.key, "GUID00");
        assert_eq!(
            manifest.replacements.get("11111111-2222-3333-4444-555555555555"),
            Some(&"[[GUID00]]".to_string())
        );
    }

    #[test]
    fn skip_cleaning_leaves_the_scratch_copy() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let output = dir.path().join("out");
        sample_source(&source);

        let mut opts = options(&source, &output, "MyProject");
        opts.skip_cleaning = true;
        let result = prepare(opts).unwrap();

        let scratch = result.scratch_dir.unwrap();
        assert!(scratch.join(MANIFEST_FILE_NAME).exists());
        assert!(scratch.join("[[ProjectName]]").is_dir());
    }
}
