//! A set of helpers for working with the file system.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{cleanup_retry, TEXT_PROBE_BYTES};
use crate::error::{Error, Result};

/// Converts a path to a string slice, failing on invalid Unicode.
pub fn path_to_str<P: AsRef<Path>>(path: &P) -> Result<&str> {
    path.as_ref().to_str().ok_or_else(|| {
        Error::ProcessError {
            source_path: path.as_ref().display().to_string(),
            e: "path contains invalid Unicode".to_string(),
        }
    })
}

/// Ensures the output directory is safe to write to.
///
/// With `force` set, an existing directory is removed first.
pub fn get_output_dir<P: AsRef<Path>>(output_dir: P, force: bool) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    if output_dir.exists() {
        if !force {
            return Err(Error::OutputDirectoryExistsError {
                output_dir: output_dir.display().to_string(),
            });
        }
        log::debug!("Removing existing output directory '{}'", output_dir.display());
        std::fs::remove_dir_all(output_dir)?;
    }
    Ok(output_dir.to_path_buf())
}

pub fn create_dir_all<P: AsRef<Path>>(dest_path: P) -> Result<()> {
    std::fs::create_dir_all(dest_path.as_ref()).map_err(Error::IoError)
}

/// Recursively copies `source` into `destination`, skipping entries the
/// filter rejects. The filter receives each entry's path relative to
/// `source`; a rejected directory is skipped along with everything below it.
pub fn copy_dir_filtered<F>(source: &Path, destination: &Path, filter: &F) -> Result<()>
where
    F: Fn(&Path, bool) -> bool,
{
    copy_dir_helper(source, source, destination, filter)
}

fn copy_dir_helper<F>(dir: &Path, root: &Path, destination: &Path, filter: &F) -> Result<()>
where
    F: Fn(&Path, bool) -> bool,
{
    create_dir_all(destination)?;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(root).map_err(|e| Error::ProcessError {
            source_path: path.display().to_string(),
            e: e.to_string(),
        })?;
        let is_dir = entry.file_type()?.is_dir();

        if !filter(relative, is_dir) {
            log::debug!("Skipping excluded entry '{}'", relative.display());
            continue;
        }

        let target = destination.join(entry.file_name());
        if is_dir {
            copy_dir_helper(&path, root, &target, filter)?;
        } else {
            std::fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

/// Removes a directory tree, retrying with backoff.
///
/// Used right after archiving a directory: the OS may briefly keep handles
/// on just-archived files, so the first attempt can fail spuriously.
pub fn remove_dir_with_retry<P: AsRef<Path>>(directory: P) -> Result<()> {
    let directory = directory.as_ref();
    if !directory.exists() {
        return Ok(());
    }

    for attempt in 0..cleanup_retry::MAX_ATTEMPTS {
        match std::fs::remove_dir_all(directory) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::debug!(
                    "Attempt {} to remove '{}' failed: {e}",
                    attempt + 1,
                    directory.display()
                );
                let delay =
                    (cleanup_retry::BASE_DELAY_MS << attempt).min(cleanup_retry::MAX_DELAY_MS);
                std::thread::sleep(Duration::from_millis(delay));
            }
        }
    }

    Err(Error::ScratchCleanupError {
        directory: directory.display().to_string(),
        attempts: cleanup_retry::MAX_ATTEMPTS,
    })
}

/// Decides whether file contents can safely be edited as text.
///
/// Probes up to the first `TEXT_PROBE_BYTES` bytes: a NUL byte or invalid
/// UTF-8 marks the file as binary, and binary files are never content-edited.
pub fn is_text_file<P: AsRef<Path>>(path: P) -> Result<bool> {
    let bytes = std::fs::read(path.as_ref())?;
    let probe = &bytes[..bytes.len().min(TEXT_PROBE_BYTES)];

    if probe.contains(&0) {
        return Ok(false);
    }
    match std::str::from_utf8(probe) {
        Ok(_) => Ok(true),
        // The probe may have split a multi-byte sequence at its end.
        Err(e) => Ok(probe.len() - e.valid_up_to() < 4 && e.error_len().is_none()),
    }
}

/// Returns a file-system safe variant of a template name: spaces become
/// underscores and reserved characters become dashes.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            other => other,
        })
        .collect()
}

/// Depth of a relative path, measured in components.
pub fn path_depth(path: &Path) -> usize {
    path.components().count()
}
