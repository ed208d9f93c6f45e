//! Application settings: the user-owned YAML document naming template
//! repositories and the access token used against them.
//!
//! The engine never loads settings itself; the CLI resolves them and
//! passes the repository list into the operations that need it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::CURRENT_SETTINGS_SCHEMA;
use crate::error::Result;
use crate::repository::RepositoryLocator;

pub const SETTINGS_FILE_NAME: &str = "settings.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub schema_version: u32,
    #[serde(default)]
    pub repositories: Vec<RepositoryLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SETTINGS_SCHEMA,
            repositories: Vec::new(),
            access_token: None,
        }
    }
}

impl AppSettings {
    /// Loads settings from the given file, or returns defaults when the
    /// file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: AppSettings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// The conventional settings location under the user's config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stencil").join(SETTINGS_FILE_NAME))
    }
}
