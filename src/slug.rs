//! Slug data model and slug resolution.
//!
//! A slug is a named substitution variable: at preparation time its search
//! strings are replaced by a placeholder tag, at generation time the tag is
//! replaced by the bound value.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{PROJECT_NAME_SLUG_KEY, SLUG_CLOSE, SLUG_OPEN};
use crate::error::{Error, Result};
use crate::scanner::Classification;

/// The supported slug value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugKind {
    /// A free-form string.
    #[default]
    String,
    /// A yes/no value.
    Boolean,
    /// An integer value.
    Integer,
    /// A list of strings, comma separated.
    StringListComma,
    /// A list of strings, semicolon separated.
    StringListSemicolon,
    /// A string-to-string mapping, rendered as `key: value, key: value`.
    StringMap,
    /// A unique identifier minted fresh on every generation run.
    RandomGuid,
}

/// A concrete value bound to a slug for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlugValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl SlugValue {
    /// Renders the value as the replacement string used in file contents.
    pub fn render(&self, kind: SlugKind) -> String {
        match self {
            SlugValue::Str(s) => s.clone(),
            SlugValue::Bool(b) => b.to_string(),
            SlugValue::Int(i) => i.to_string(),
            SlugValue::List(items) => {
                let separator = match kind {
                    SlugKind::StringListSemicolon => ";",
                    _ => ",",
                };
                items.join(separator)
            }
            SlugValue::Map(map) => map
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Parses raw user input into a value of the given kind.
    pub fn parse(kind: SlugKind, raw: &str) -> Result<Self> {
        match kind {
            SlugKind::String | SlugKind::RandomGuid => Ok(SlugValue::Str(raw.to_string())),
            SlugKind::Boolean => raw
                .trim()
                .parse::<bool>()
                .map(SlugValue::Bool)
                .map_err(|_| Error::ValidationError(format!("'{raw}' is not a boolean"))),
            SlugKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(SlugValue::Int)
                .map_err(|_| Error::ValidationError(format!("'{raw}' is not an integer"))),
            SlugKind::StringListComma => Ok(SlugValue::List(split_list(raw, ','))),
            SlugKind::StringListSemicolon => Ok(SlugValue::List(split_list(raw, ';'))),
            SlugKind::StringMap => {
                let mut map = IndexMap::new();
                for pair in split_list(raw, ',') {
                    let (key, value) = pair.split_once(':').ok_or_else(|| {
                        Error::ValidationError(format!(
                            "'{pair}' is not a 'key: value' pair"
                        ))
                    })?;
                    map.insert(key.trim().to_string(), value.trim().to_string());
                }
                Ok(SlugValue::Map(map))
            }
        }
    }
}

fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A named substitution variable declared by a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slug {
    /// Unique key; the placeholder tag in files is `[[key]]`.
    pub key: String,
    /// Name shown when requesting a value from the user.
    pub display_name: String,
    #[serde(default)]
    pub kind: SlugKind,
    /// True when a value must be supplied at generation time.
    #[serde(default)]
    pub requires_input: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<SlugValue>,
    /// Non-empty turns the slug into an enumerated choice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Literal strings replaced by this slug's placeholder at prepare time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_strings: Vec<String>,
}

impl Slug {
    pub fn new(key: &str, display_name: &str, kind: SlugKind) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            kind,
            requires_input: false,
            default_value: None,
            allowed_values: Vec::new(),
            search_strings: Vec::new(),
        }
    }

    /// The placeholder tag as it appears inside files and paths.
    pub fn placeholder(&self) -> String {
        format!("{SLUG_OPEN}{}{SLUG_CLOSE}", self.key)
    }

    /// Checks a candidate value against the slug's constraints.
    pub fn accepts(&self, value: &SlugValue) -> Result<()> {
        if self.allowed_values.is_empty() {
            return Ok(());
        }
        let rendered = value.render(self.kind);
        if self.allowed_values.iter().any(|v| v.eq_ignore_ascii_case(&rendered)) {
            Ok(())
        } else {
            Err(Error::ValidationError(format!(
                "'{rendered}' is not an allowed value for '{}'; allowed: {}",
                self.display_name,
                self.allowed_values.join(", ")
            )))
        }
    }
}

/// The context available when expanding special tokens in default values.
pub struct SpecialValues {
    pub project_name: String,
    pub template_name: String,
    pub template_author: String,
}

impl SpecialValues {
    /// Replaces the special tokens recovered from the template's defaults:
    /// project/template identity, the current user and the current year.
    pub fn expand(&self, input: &str) -> String {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        let year = chrono::Utc::now().format("%Y").to_string();

        input
            .replace("[[ProjectName]]", &self.project_name)
            .replace("[[TemplateName]]", &self.template_name)
            .replace("[[TemplateAuthor]]", &self.template_author)
            .replace("[[CurrentUserName]]", &user)
            .replace("[[CurrentYear]]", &year)
    }
}

/// The base slug present in every template: the project name. Its search
/// strings at preparation time are the template's own name and, when it
/// differs, the archive file stem.
pub fn base_preparation_slug(search_strings: Vec<String>) -> Slug {
    let mut slug = Slug::new(PROJECT_NAME_SLUG_KEY, "Project Name", SlugKind::String);
    slug.requires_input = true;
    slug.search_strings = search_strings;
    slug
}

/// Merges slug lists in presentation order, first declaration wins.
///
/// Fails when the same key is declared twice with different value kinds.
pub fn merge_slugs(groups: Vec<Vec<Slug>>) -> Result<Vec<Slug>> {
    let mut merged: IndexMap<String, Slug> = IndexMap::new();
    for group in groups {
        for slug in group {
            match merged.get(&slug.key) {
                None => {
                    merged.insert(slug.key.clone(), slug);
                }
                Some(existing) if existing.kind == slug.kind => {}
                Some(existing) => {
                    return Err(Error::ValidationError(format!(
                        "slug '{}' declared with incompatible kinds: {:?} and {:?}",
                        slug.key, existing.kind, slug.kind
                    )));
                }
            }
        }
    }
    Ok(merged.into_values().collect())
}

/// Scans content-editable files for free-form `[[Marker]]` tokens and emits
/// one required string slug per distinct marker not already declared.
///
/// Discovered slugs are ordered by key so repeated preparations of the same
/// tree resolve the same slug list.
pub fn discover_marker_slugs(
    root: &Path,
    classification: &Classification,
    declared: &[Slug],
) -> Result<Vec<Slug>> {
    let marker = Regex::new(r"\[\[([A-Za-z][A-Za-z0-9_]*)\]\]").expect("valid marker regex");
    let mut keys: Vec<String> = Vec::new();

    for relative in &classification.content_edit {
        let content = std::fs::read_to_string(root.join(relative))?;
        for capture in marker.captures_iter(&content) {
            let key = capture[1].to_string();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }
    keys.sort();

    let slugs = keys
        .into_iter()
        .filter(|key| !declared.iter().any(|s| &s.key == key))
        .map(|key| {
            let mut slug = Slug::new(&key, &key, SlugKind::String);
            slug.requires_input = true;
            slug
        })
        .collect();
    Ok(slugs)
}
