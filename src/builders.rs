//! Template builders: per-source-layout preparation strategies.
//!
//! Builders form a closed, statically registered set. Each one knows which
//! source directories it can prepare and which extra slugs that layout
//! contributes beyond the base project-name slug.

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::GUID_SLUG_PREFIX;
use crate::error::{Error, Result};
use crate::slug::{Slug, SlugKind};

/// The registered builder identities, in auto-detection order (most
/// specific first, `Generic` accepting anything as the fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderKind {
    DotSlnx,
    DotSln,
    #[default]
    Generic,
}

impl BuilderKind {
    pub const ALL: [BuilderKind; 3] =
        [BuilderKind::DotSlnx, BuilderKind::DotSln, BuilderKind::Generic];

    pub fn builder(self) -> &'static dyn TemplateBuilder {
        match self {
            BuilderKind::Generic => &GenericBuilder,
            BuilderKind::DotSln => &DotSlnBuilder,
            BuilderKind::DotSlnx => &DotSlnxBuilder,
        }
    }
}

/// One preparation strategy. Implementations are stateless statics.
pub trait TemplateBuilder {
    fn kind(&self) -> BuilderKind;

    /// Whether the given source directory has the layout this builder
    /// understands.
    fn is_valid_directory(&self, source_dir: &Path) -> Result<bool>;

    /// Extra slugs this layout contributes, beyond the base project-name
    /// slug.
    fn preparation_slugs(&self, source_dir: &Path) -> Result<Vec<Slug>>;
}

/// Picks the first builder, in registration order, that accepts the
/// directory. `Generic` accepts everything, so detection never fails on a
/// readable directory.
pub fn detect(source_dir: &Path) -> Result<BuilderKind> {
    for kind in BuilderKind::ALL {
        if kind.builder().is_valid_directory(source_dir)? {
            debug!("detected builder {kind:?} for {}", source_dir.display());
            return Ok(kind);
        }
    }
    Err(Error::UnsupportedDirectoryError {
        directory: source_dir.display().to_string(),
    })
}

/// Accepts any directory and contributes no extra slugs.
struct GenericBuilder;

impl TemplateBuilder for GenericBuilder {
    fn kind(&self) -> BuilderKind {
        BuilderKind::Generic
    }

    fn is_valid_directory(&self, _source_dir: &Path) -> Result<bool> {
        Ok(true)
    }

    fn preparation_slugs(&self, _source_dir: &Path) -> Result<Vec<Slug>> {
        Ok(Vec::new())
    }
}

/// Prepares .NET solution directories: a `.sln` file at the top level.
///
/// Contributes the conventional author/description/version slugs plus one
/// generated-identifier slug per distinct project GUID found in the
/// solution, so every generated project gets fresh identifiers.
struct DotSlnBuilder;

impl TemplateBuilder for DotSlnBuilder {
    fn kind(&self) -> BuilderKind {
        BuilderKind::DotSln
    }

    fn is_valid_directory(&self, source_dir: &Path) -> Result<bool> {
        has_top_level_extension(source_dir, "sln")
    }

    fn preparation_slugs(&self, source_dir: &Path) -> Result<Vec<Slug>> {
        let mut slugs = metadata_slugs();

        let mut guids: Vec<String> = Vec::new();
        for solution in top_level_files_with_extension(source_dir, "sln")? {
            let content = std::fs::read_to_string(&solution)?;
            for guid in harvest_project_guids(&content) {
                if !guids.iter().any(|g| g.eq_ignore_ascii_case(&guid)) {
                    guids.push(guid);
                }
            }
        }
        debug!("harvested {} project identifier(s)", guids.len());

        let width = guid_key_width(guids.len());
        for (index, guid) in guids.into_iter().enumerate() {
            let key = format!("{GUID_SLUG_PREFIX}{index:0width$}");
            let mut slug = Slug::new(&key, &key, SlugKind::RandomGuid);
            slug.search_strings = vec![guid];
            slugs.push(slug);
        }
        Ok(slugs)
    }
}

/// Prepares XML-based `.slnx` solution directories. The format carries no
/// project GUIDs, so only the metadata slugs apply.
struct DotSlnxBuilder;

impl TemplateBuilder for DotSlnxBuilder {
    fn kind(&self) -> BuilderKind {
        BuilderKind::DotSlnx
    }

    fn is_valid_directory(&self, source_dir: &Path) -> Result<bool> {
        has_top_level_extension(source_dir, "slnx")
    }

    fn preparation_slugs(&self, _source_dir: &Path) -> Result<Vec<Slug>> {
        Ok(metadata_slugs())
    }
}

/// The author/description/version slugs shared by the solution builders.
/// Their search strings are literal marker words authors leave in files
/// meant to be filled in at generation time. Defaults use the special
/// tokens expanded at bind time, so an untouched prompt still produces a
/// sensible value.
fn metadata_slugs() -> Vec<Slug> {
    use crate::slug::SlugValue;

    let mut author = Slug::new("TemplateAuthor", "Author", SlugKind::String);
    author.search_strings = vec!["AUTHOR".into()];
    author.default_value = Some(SlugValue::Str("[[TemplateAuthor]]".into()));

    let mut description = Slug::new("TemplateDescription", "Description", SlugKind::String);
    description.search_strings = vec!["DESCRIPTION".into()];
    description.default_value = Some(SlugValue::Str("[[ProjectName]]".into()));

    let mut version = Slug::new("TemplateVersion", "Version", SlugKind::String);
    version.search_strings = vec!["VERSION".into()];
    version.default_value = Some(SlugValue::Str("1.0.0".into()));

    vec![author, description, version]
}

fn has_top_level_extension(source_dir: &Path, extension: &str) -> Result<bool> {
    Ok(!top_level_files_with_extension(source_dir, extension)?.is_empty())
}

fn top_level_files_with_extension(
    source_dir: &Path,
    extension: &str,
) -> Result<Vec<std::path::PathBuf>> {
    let mut matches = Vec::new();
    for entry in std::fs::read_dir(source_dir)? {
        let entry = entry?;
        let path = entry.path();
        let matching = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if matching {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}

/// Extracts project GUIDs from solution `Project(...)` declarations. The
/// last quoted `{...}` token on such a line is the project's own GUID; the
/// first is the shared project-type GUID and stays untouched.
fn harvest_project_guids(solution: &str) -> Vec<String> {
    let mut guids = Vec::new();
    for line in solution.lines() {
        if !line.trim_start().starts_with("Project(") {
            continue;
        }
        let Some(last_field) = line.rsplit(',').next() else {
            continue;
        };
        let token = last_field.trim().trim_matches('"');
        if let Some(guid) = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
            if !guid.is_empty() {
                guids.push(guid.to_string());
            }
        }
    }
    guids
}

/// Key width scales with the number of harvested identifiers, with a floor
/// of two digits so small solutions still read `GUID00`, `GUID01`.
fn guid_key_width(total: usize) -> usize {
    total.to_string().len().max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "MyProject", "MyProject\MyProject.csproj", "{11111111-2222-3333-4444-555555555555}"
EndProject
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "MyProject.Tests", "MyProject.Tests\MyProject.Tests.csproj", "{AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE}"
EndProject
Global
EndGlobal
"#;

    #[test]
    fn harvests_the_project_guid_not_the_type_guid() {
        let guids = harvest_project_guids(SOLUTION);
        assert_eq!(
            guids,
            vec![
                "11111111-2222-3333-4444-555555555555".to_string(),
                "AAAAAAAA-BBBB-CCCC-DDDD-EEEEEEEEEEEE".to_string(),
            ]
        );
    }

    #[test]
    fn detection_prefers_specific_builders_over_generic() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect(dir.path()).unwrap(), BuilderKind::Generic);

        fs::write(dir.path().join("App.sln"), SOLUTION).unwrap();
        assert_eq!(detect(dir.path()).unwrap(), BuilderKind::DotSln);

        fs::write(dir.path().join("App.slnx"), "<Solution/>").unwrap();
        assert_eq!(detect(dir.path()).unwrap(), BuilderKind::DotSlnx);
    }

    #[test]
    fn solution_builder_emits_numbered_identifier_slugs() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("App.sln"), SOLUTION).unwrap();

        let slugs = BuilderKind::DotSln.builder().preparation_slugs(dir.path()).unwrap();
        let guid_slugs: Vec<&Slug> =
            slugs.iter().filter(|s| s.kind == SlugKind::RandomGuid).collect();

        assert_eq!(guid_slugs.len(), 2);
        assert_eq!(guid_slugs[0].key, "GUID00");
        assert_eq!(guid_slugs[1].key, "GUID01");
        assert_eq!(
            guid_slugs[0].search_strings,
            vec!["11111111-2222-3333-4444-555555555555".to_string()]
        );
    }

    #[test]
    fn duplicate_guids_across_solutions_collapse_to_one_slug() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("A.sln"), SOLUTION).unwrap();
        fs::write(dir.path().join("B.sln"), SOLUTION).unwrap();

        let slugs = BuilderKind::DotSln.builder().preparation_slugs(dir.path()).unwrap();
        let guid_count = slugs.iter().filter(|s| s.kind == SlugKind::RandomGuid).count();
        assert_eq!(guid_count, 2);
    }

    #[test]
    fn generic_builder_accepts_anything_and_adds_nothing() {
        let dir = TempDir::new().unwrap();
        let builder = BuilderKind::Generic.builder();
        assert!(builder.is_valid_directory(dir.path()).unwrap());
        assert!(builder.preparation_slugs(dir.path()).unwrap().is_empty());
    }
}
