//! Best-effort git repository initialization for generated projects.
//!
//! Every failure here degrades to a warning: a project that generated
//! correctly but could not become a git repository is still a success.

use git2::{IndexAddOption, Repository, Signature};
use log::info;
use std::path::Path;

use crate::error::Warning;

/// What to do with git once a project has been generated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GitMode {
    /// Leave the project alone.
    #[default]
    NoRepo,
    /// `git init` only.
    Init,
    /// Init, stage everything, commit, and point `origin` at the remote.
    Full { remote: String },
}

/// Applies the git mode to the generated project, reporting any failure as
/// a warning instead of an error.
pub fn initialize(project_dir: &Path, mode: &GitMode) -> Option<Warning> {
    let result = match mode {
        GitMode::NoRepo => return None,
        GitMode::Init => Repository::init(project_dir).map(|_| ()),
        GitMode::Full { remote } => init_full(project_dir, remote),
    };
    match result {
        Ok(()) => {
            info!("Initialized git repository in '{}'", project_dir.display());
            None
        }
        Err(e) => Some(Warning::GitOperation(e.to_string())),
    }
}

fn init_full(project_dir: &Path, remote: &str) -> Result<(), git2::Error> {
    let repo = Repository::init(project_dir)?;

    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    // Fall back to a fixed identity when the environment has no git config.
    let signature = repo
        .signature()
        .or_else(|_| Signature::now("stencil", "stencil@localhost"))?;
    repo.commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])?;

    repo.remote("origin", remote)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn no_repo_mode_leaves_the_directory_alone() {
        let dir = TempDir::new().unwrap();
        assert!(initialize(dir.path(), &GitMode::NoRepo).is_none());
        assert!(!dir.path().join(".git").exists());
    }

    #[test]
    fn init_mode_creates_an_empty_repository() {
        let dir = TempDir::new().unwrap();
        assert!(initialize(dir.path(), &GitMode::Init).is_none());
        assert!(dir.path().join(".git").is_dir());
    }

    #[test]
    fn full_mode_commits_the_tree_and_adds_the_remote() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("file.txt"), "content").unwrap();

        let mode = GitMode::Full { remote: "https://example.invalid/repo.git".into() };
        assert!(initialize(dir.path(), &mode).is_none());

        let repo = Repository::open(dir.path()).unwrap();
        assert!(repo.head().unwrap().peel_to_commit().is_ok());
        assert!(repo.find_remote("origin").is_ok());
    }
}
