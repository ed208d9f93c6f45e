//! The template manifest: the JSON document packed into every template
//! archive that carries identity, slugs and the tokenize-direction
//! replacement table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::builders::BuilderKind;
use crate::constants::{
    CURRENT_SCHEMA, MAX_SUPPORTED_SCHEMA, MIN_SUPPORTED_SCHEMA, PROJECT_NAME_SLUG_KEY,
    SLUG_CLOSE, SLUG_OPEN,
};
use crate::error::{Error, Result};
use crate::ioutils::safe_file_name;
use crate::slug::Slug;

/// The manifest document. Unknown fields are ignored on read and optional
/// fields default, so newer writers stay readable as long as the declared
/// schema version is within the supported range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub schema_version: u32,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub builder: BuilderKind,
    #[serde(default)]
    pub slugs: Vec<Slug>,
    /// Paths (globs or bare names) dropped from the scratch copy entirely.
    #[serde(default)]
    pub prepare_excluded_paths: Vec<String>,
    /// Paths whose subtrees only ever get name substitution.
    #[serde(default)]
    pub rename_only_paths: Vec<String>,
    /// Paths deleted from the generated project after extraction.
    #[serde(default)]
    pub paths_to_remove: Vec<String>,
    /// Commands run inside the generated project, in order.
    #[serde(default)]
    pub post_generate_commands: Vec<String>,
    /// Free-form text shown to the user after a successful generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// The tokenize-direction table as persisted at preparation time:
    /// concrete search string to placeholder tag.
    #[serde(default)]
    pub replacements: IndexMap<String, String>,
}

impl TemplateManifest {
    pub fn new(name: &str) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA,
            name: name.to_string(),
            author: String::new(),
            description: String::new(),
            version: String::new(),
            builder: BuilderKind::default(),
            slugs: Vec::new(),
            prepare_excluded_paths: Vec::new(),
            rename_only_paths: Vec::new(),
            paths_to_remove: Vec::new(),
            post_generate_commands: Vec::new(),
            instructions: None,
            replacements: IndexMap::new(),
        }
    }

    /// Parses a manifest and checks its schema version against the
    /// supported range before anything else is trusted.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: TemplateManifest = serde_json::from_slice(bytes)?;
        manifest.check_version()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn check_version(&self) -> Result<()> {
        if self.schema_version < MIN_SUPPORTED_SCHEMA
            || self.schema_version > MAX_SUPPORTED_SCHEMA
        {
            return Err(Error::VersionUnsupportedError {
                version: self.schema_version,
                min: MIN_SUPPORTED_SCHEMA,
                max: MAX_SUPPORTED_SCHEMA,
            });
        }
        Ok(())
    }

    /// The template name reduced to something that is valid as a file stem
    /// on every platform.
    pub fn safe_name(&self) -> String {
        safe_file_name(&self.name)
    }

    /// The placeholder tag every template maps its own name to.
    pub fn project_name_placeholder() -> String {
        format!("{SLUG_OPEN}{PROJECT_NAME_SLUG_KEY}{SLUG_CLOSE}")
    }

    /// Validates a fully prepared manifest, as read back at generation
    /// time: non-empty name, well-formed replacement entries, and the
    /// template's own name routed to the project-name placeholder.
    pub fn validate_prepared(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ValidationError("template name is empty".into()));
        }
        for (search, placeholder) in &self.replacements {
            if search.is_empty() || placeholder.is_empty() {
                return Err(Error::ValidationError(format!(
                    "malformed replacement entry '{search}' -> '{placeholder}'"
                )));
            }
        }
        let project_placeholder = Self::project_name_placeholder();
        if !self.replacements.values().any(|p| p == &project_placeholder) {
            return Err(Error::ValidationError(format!(
                "no replacement maps to {project_placeholder}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::SlugKind;

    fn prepared() -> TemplateManifest {
        let mut manifest = TemplateManifest::new("Contoso.Widgets");
        let mut slug = Slug::new(PROJECT_NAME_SLUG_KEY, "Project Name", SlugKind::String);
        slug.requires_input = true;
        manifest.slugs.push(slug);
        manifest
            .replacements
            .insert("Contoso.Widgets".into(), TemplateManifest::project_name_placeholder());
        manifest
    }

    #[test]
    fn round_trips_through_json() {
        let manifest = prepared();
        let json = serde_json::to_string(&manifest).unwrap();
        let back = TemplateManifest::from_slice(json.as_bytes()).unwrap();

        assert_eq!(back.name, "Contoso.Widgets");
        assert_eq!(back.schema_version, CURRENT_SCHEMA);
        assert_eq!(back.slugs.len(), 1);
        assert_eq!(
            back.replacements.get("Contoso.Widgets"),
            Some(&"[[ProjectName]]".to_string())
        );
    }

    #[test]
    fn rejects_schema_versions_outside_the_supported_range() {
        let mut manifest = prepared();
        manifest.schema_version = MAX_SUPPORTED_SCHEMA + 1;
        let json = serde_json::to_string(&manifest).unwrap();

        let result = TemplateManifest::from_slice(json.as_bytes());
        assert!(matches!(result, Err(Error::VersionUnsupportedError { .. })));
    }

    #[test]
    fn ignores_unknown_fields_and_defaults_missing_ones() {
        let json = format!(
            r#"{{"schema_version": {MIN_SUPPORTED_SCHEMA}, "name": "Minimal", "future_field": true}}"#
        );
        let manifest = TemplateManifest::from_slice(json.as_bytes()).unwrap();

        assert_eq!(manifest.name, "Minimal");
        assert!(manifest.slugs.is_empty());
        assert!(manifest.instructions.is_none());
        assert_eq!(manifest.builder, BuilderKind::Generic);
    }

    #[test]
    fn prepared_manifest_requires_a_project_name_mapping() {
        let mut manifest = prepared();
        assert!(manifest.validate_prepared().is_ok());

        manifest.replacements.clear();
        assert!(matches!(
            manifest.validate_prepared(),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn safe_name_strips_reserved_characters() {
        let manifest = TemplateManifest::new("My Template: v2?");
        assert_eq!(manifest.safe_name(), "My_Template-_v2-");
    }
}
