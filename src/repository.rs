//! Remote template repository listing and download.
//!
//! A repository is anything that speaks a GitHub-contents-style JSON
//! listing: an array of entries with `name`, `type`, `size` and URLs.
//! Listing walks directories to a fixed depth collecting template
//! archives; an unreachable repository degrades to a warning so the
//! remaining repositories still list.

use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive::file_sha256;
use crate::constants::{
    MAX_REPOSITORY_DEPTH, REPOSITORY_TIMEOUT_SECS, TEMPLATE_FILE_EXTENSION,
};
use crate::error::{Error, Result, Warning};

/// One configured remote repository.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct RepositoryLocator {
    /// Display name, also recorded as the origin of every listed template.
    pub name: String,
    /// Base contents-listing URL.
    pub url: String,
}

/// One template archive found in a repository listing.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    /// Template name: the archive file name without its extension.
    pub name: String,
    pub file_name: String,
    /// Path within the repository.
    pub path: String,
    pub download_url: String,
    pub size: u64,
    /// Checksum advertised by the repository, when it provides one.
    pub checksum: Option<String>,
    /// The repository this entry was first found in.
    pub origin: String,
}

/// The outcome of listing every configured repository.
#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub templates: Vec<TemplateEntry>,
    pub warnings: Vec<Warning>,
}

#[derive(Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    download_url: Option<String>,
    /// Listing URL for subdirectories.
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

fn client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REPOSITORY_TIMEOUT_SECS))
        .user_agent(concat!("stencil/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Lists every repository in order. Within one repository's walk the first
/// entry carrying a given template name wins; across repositories
/// same-named templates are all kept and told apart by their origin. One
/// failing repository produces a warning, never an error.
pub fn list_templates(
    repositories: &[RepositoryLocator],
    token: Option<&str>,
) -> Result<ListingOutcome> {
    let client = client()?;
    let mut outcome = ListingOutcome::default();

    for repository in repositories {
        match list_one(&client, repository, token) {
            Ok(entries) => outcome.templates.extend(entries),
            Err(e) => {
                warn!("Repository '{}' could not be listed: {e}", repository.name);
                outcome.warnings.push(Warning::RepositoryAccess {
                    repository: repository.name.clone(),
                    detail: e.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

fn list_one(
    client: &reqwest::blocking::Client,
    repository: &RepositoryLocator,
    token: Option<&str>,
) -> Result<Vec<TemplateEntry>> {
    let mut templates = Vec::new();
    walk(client, repository, &repository.url, token, 1, &mut templates)?;
    Ok(templates)
}

fn walk(
    client: &reqwest::blocking::Client,
    repository: &RepositoryLocator,
    url: &str,
    token: Option<&str>,
    depth: usize,
    templates: &mut Vec<TemplateEntry>,
) -> Result<()> {
    let entries: Vec<ContentsEntry> = fetch(client, url, token)?
        .error_for_status()?
        .json()?;

    let suffix = format!(".{TEMPLATE_FILE_EXTENSION}");
    for entry in entries {
        match entry.kind.as_str() {
            "file" if entry.name.to_ascii_lowercase().ends_with(&suffix) => {
                let Some(download_url) = entry.download_url else {
                    continue;
                };
                let name = entry.name[..entry.name.len() - suffix.len()].to_string();
                if templates.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
                    debug!(
                        "Skipping '{}' at '{}': a shallower entry already carries this name",
                        entry.name, entry.path
                    );
                    continue;
                }
                templates.push(TemplateEntry {
                    name,
                    file_name: entry.name,
                    path: entry.path,
                    download_url,
                    size: entry.size,
                    checksum: entry.sha,
                    origin: repository.name.clone(),
                });
            }
            "dir" if depth < MAX_REPOSITORY_DEPTH => {
                if let Some(url) = entry.url {
                    walk(client, repository, &url, token, depth + 1, templates)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn fetch(
    client: &reqwest::blocking::Client,
    url: &str,
    token: Option<&str>,
) -> Result<reqwest::blocking::Response> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    Ok(request.send()?)
}

/// Downloads a listed template archive into `destination`, verifying the
/// advertised size and, when the repository advertised a checksum in a
/// format this build recognizes, the content checksum.
pub fn download(
    entry: &TemplateEntry,
    destination: &Path,
    token: Option<&str>,
) -> Result<PathBuf> {
    let client = client()?;
    let bytes = fetch(&client, &entry.download_url, token)?
        .error_for_status()?
        .bytes()?;

    if entry.size > 0 && bytes.len() as u64 != entry.size {
        return Err(Error::ArchiveError(format!(
            "downloaded '{}' is {} byte(s), repository advertised {}",
            entry.file_name,
            bytes.len(),
            entry.size
        )));
    }

    let target = destination.join(&entry.file_name);
    std::fs::write(&target, &bytes)?;

    if let Some(expected) = &entry.checksum {
        let actual = match advertised_checksum_kind(expected) {
            Some(ChecksumKind::Sha256) => Some(file_sha256(&target)?),
            Some(ChecksumKind::GitBlobSha1) => Some(git_blob_sha1(&bytes)?),
            None => {
                debug!(
                    "Checksum '{expected}' for '{}' is in no recognized format; skipping verification",
                    entry.file_name
                );
                None
            }
        };
        if let Some(actual) = actual {
            if !actual.eq_ignore_ascii_case(expected) {
                std::fs::remove_file(&target)?;
                return Err(Error::ArchiveError(format!(
                    "checksum mismatch for '{}': expected {expected}, got {actual}",
                    entry.file_name
                )));
            }
        }
    }
    debug!("Downloaded '{}' from '{}'", entry.file_name, entry.origin);
    Ok(target)
}

#[derive(Debug, PartialEq, Eq)]
enum ChecksumKind {
    Sha256,
    /// GitHub-style listings advertise the git blob SHA-1, computed over
    /// `"blob {len}\0"` plus the content, not over the raw bytes.
    GitBlobSha1,
}

/// Classifies an advertised checksum by shape. Anything that is not plain
/// 40- or 64-digit hex (ETags, prefixed digests) is left unverified rather
/// than failing every download.
fn advertised_checksum_kind(checksum: &str) -> Option<ChecksumKind> {
    if !checksum.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match checksum.len() {
        64 => Some(ChecksumKind::Sha256),
        40 => Some(ChecksumKind::GitBlobSha1),
        _ => None,
    }
}

fn git_blob_sha1(bytes: &[u8]) -> Result<String> {
    Ok(git2::Oid::hash_object(git2::ObjectType::Blob, bytes)?.to_string())
}
