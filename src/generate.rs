//! Project generation: turns a template archive back into a concrete,
//! ready-to-use project tree.

use indexmap::IndexMap;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::archive;
use crate::commands::run_post_generate;
use crate::error::{Error, Result, Warning};
use crate::gitops::{initialize, GitMode};
use crate::ioutils::{create_dir_all, get_output_dir};
use crate::manifest::TemplateManifest;
use crate::prompt::ValueSource;
use crate::scanner::{classify, MatchRules};
use crate::slug::{SlugKind, SlugValue, SpecialValues};
use crate::table::{ChangeReport, ReplacementTable};

pub struct GenerateOptions<'a> {
    pub archive_path: PathBuf,
    pub output_dir: PathBuf,
    /// Values the caller already knows, keyed by slug key.
    pub provided: IndexMap<String, SlugValue>,
    /// Supplies everything the caller and the defaults did not.
    pub source: &'a dyn ValueSource,
    /// Replace an existing output directory.
    pub force: bool,
    /// Report every change without creating the project.
    pub dry_run: bool,
    pub git_mode: GitMode,
}

pub struct GenerationResult {
    pub output_dir: PathBuf,
    pub report: ChangeReport,
    pub warnings: Vec<Warning>,
    /// Manifest instructions with all placeholders substituted.
    pub instructions: Option<String>,
    /// The values the run was generated with, in slug order.
    pub values: IndexMap<String, SlugValue>,
}

/// Runs the whole generation pipeline: manifest read, slug binding, output
/// pre-flight, extraction, materialize apply, cleanup paths, commands, git.
///
/// Failures up to and including the apply step leave a partially written
/// output directory; callers should discard it.
pub fn generate(options: GenerateOptions<'_>) -> Result<GenerationResult> {
    let manifest = archive::read_manifest(&options.archive_path)?;
    manifest.validate_prepared()?;
    info!("Generating project from template '{}'", manifest.name);

    let values = bind_values(&manifest, &options)?;
    let table = ReplacementTable::materialize(&manifest.slugs, &values)?;
    let rules = MatchRules::new(&[], &manifest.rename_only_paths)?;

    // A provided key no slug consumes is a likely typo; say so instead of
    // silently falling back to the default.
    let mut warnings = Vec::new();
    for key in options.provided.keys() {
        if !manifest.slugs.iter().any(|s| &s.key == key) {
            let warning = Warning::UnknownSetting { key: key.clone() };
            warn!("{warning}");
            warnings.push(warning);
        }
    }

    if options.dry_run {
        let scratch = tempfile::tempdir()?;
        archive::extract(&options.archive_path, scratch.path())?;
        let classification = classify(scratch.path(), &rules)?;
        let report = table.apply(scratch.path(), &classification, true)?;
        return Ok(GenerationResult {
            output_dir: options.output_dir,
            report,
            warnings,
            instructions: manifest.instructions.as_deref().map(|i| table.apply_str(i)),
            values,
        });
    }

    let output_dir = get_output_dir(&options.output_dir, options.force)?;
    create_dir_all(&output_dir)?;
    archive::extract(&options.archive_path, &output_dir)?;

    let classification = classify(&output_dir, &rules)?;
    let report = table.apply(&output_dir, &classification, false)?;
    debug!(
        "applied {} content edit(s) and {} rename(s)",
        report.edited.len(),
        report.renamed.len()
    );

    remove_declared_paths(&output_dir, &manifest, &table)?;

    let commands: Vec<String> = manifest
        .post_generate_commands
        .iter()
        .map(|c| table.apply_str(c))
        .collect();
    warnings.extend(run_post_generate(&commands, &output_dir)?);
    warnings.extend(initialize(&output_dir, &options.git_mode));

    info!("Project generated in '{}'", output_dir.display());
    Ok(GenerationResult {
        output_dir,
        report,
        warnings,
        instructions: manifest.instructions.as_deref().map(|i| table.apply_str(i)),
        values,
    })
}

/// Resolves a value for every non-generated slug, in declaration order:
/// caller-provided values win, then expanded defaults offered through the
/// value source, then the source's own answer. The project name falls back
/// to the output directory's name.
fn bind_values(
    manifest: &TemplateManifest,
    options: &GenerateOptions<'_>,
) -> Result<IndexMap<String, SlugValue>> {
    let project_name_key = crate::constants::PROJECT_NAME_SLUG_KEY;
    let fallback_project_name = options
        .output_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let mut values: IndexMap<String, SlugValue> = IndexMap::new();
    for slug in &manifest.slugs {
        if slug.kind == SlugKind::RandomGuid {
            continue;
        }

        if let Some(value) = options.provided.get(&slug.key) {
            slug.accepts(value)?;
            values.insert(slug.key.clone(), value.clone());
            continue;
        }

        let special = SpecialValues {
            project_name: values
                .get(project_name_key)
                .map(|v| v.render(SlugKind::String))
                .unwrap_or_else(|| fallback_project_name.clone()),
            template_name: manifest.name.clone(),
            template_author: manifest.author.clone(),
        };
        let suggested = match &slug.default_value {
            Some(SlugValue::Str(s)) => Some(SlugValue::Str(special.expand(s))),
            Some(other) => Some(other.clone()),
            None if slug.key == project_name_key => {
                Some(SlugValue::Str(fallback_project_name.clone()))
            }
            None => None,
        };

        match options.source.value_for(slug, suggested.as_ref())? {
            Some(value) => {
                slug.accepts(&value)?;
                values.insert(slug.key.clone(), value);
            }
            None if slug.requires_input => {
                return Err(Error::MissingRequiredValueError {
                    display_name: slug.display_name.clone(),
                });
            }
            None => {
                values.insert(slug.key.clone(), SlugValue::Str(String::new()));
            }
        }
    }
    Ok(values)
}

/// Deletes the manifest's cleanup paths from the generated tree. Paths are
/// declared in placeholder form, so they run through the table first.
fn remove_declared_paths(
    output_dir: &Path,
    manifest: &TemplateManifest,
    table: &ReplacementTable,
) -> Result<()> {
    for declared in &manifest.paths_to_remove {
        let relative = table.apply_str(declared);
        let path = output_dir.join(&relative);
        if !path.exists() {
            continue;
        }
        debug!("Removing declared cleanup path '{relative}'");
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
