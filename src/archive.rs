//! Template archive container: a gzip-compressed tar holding the manifest
//! next to the placeholder-substituted tree.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path};

use crate::constants::MANIFEST_FILE_NAME;
use crate::error::{Error, Result};
use crate::manifest::TemplateManifest;

/// Packs the whole tree rooted at `tree_root` into a new archive. The
/// manifest is expected to already sit at the tree root.
pub fn create(tree_root: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", tree_root)?;
    builder.into_inner()?.finish()?;
    debug!("wrote archive {}", archive_path.display());
    Ok(())
}

/// Reads only the manifest entry out of an archive, without unpacking
/// anything to disk.
pub fn read_manifest(archive_path: &Path) -> Result<TemplateManifest> {
    if !archive_path.exists() {
        return Err(Error::ArchiveDoesNotExistError {
            archive_path: archive_path.display().to_string(),
        });
    }
    let mut archive = open(archive_path)?;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if is_manifest_entry(&entry.path()?) {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes)?;
            return TemplateManifest::from_slice(&bytes);
        }
    }
    Err(Error::ArchiveError(format!(
        "no {MANIFEST_FILE_NAME} entry in '{}'",
        archive_path.display()
    )))
}

/// Unpacks every entry except the manifest into `destination`, which must
/// already exist.
pub fn extract(archive_path: &Path, destination: &Path) -> Result<()> {
    if !archive_path.exists() {
        return Err(Error::ArchiveDoesNotExistError {
            archive_path: archive_path.display().to_string(),
        });
    }
    let mut archive = open(archive_path)?;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if is_manifest_entry(&entry.path()?) {
            continue;
        }
        entry.unpack_in(destination)?;
    }
    Ok(())
}

/// The hex-encoded sha256 digest of a file, streamed.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn open(archive_path: &Path) -> Result<tar::Archive<GzDecoder<File>>> {
    let file = File::open(archive_path)?;
    Ok(tar::Archive::new(GzDecoder::new(file)))
}

/// The manifest entry sits at the archive root; writers may or may not
/// prefix entry names with `./`.
fn is_manifest_entry(path: &Path) -> bool {
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));
    matches!(components.next(), Some(Component::Normal(name)) if name == MANIFEST_FILE_NAME)
        && components.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn packed_tree() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("src")).unwrap();
        fs::write(tree.join("src/main.txt"), "hello [[ProjectName]]").unwrap();

        let manifest = TemplateManifest::new("Packed");
        manifest.save(&tree.join(MANIFEST_FILE_NAME)).unwrap();

        let archive = dir.path().join("Packed.ptt");
        create(&tree, &archive).unwrap();
        (dir, archive)
    }

    #[test]
    fn manifest_is_readable_without_extraction() {
        let (_dir, archive) = packed_tree();
        let manifest = read_manifest(&archive).unwrap();
        assert_eq!(manifest.name, "Packed");
    }

    #[test]
    fn extract_skips_the_manifest_entry() {
        let (dir, archive) = packed_tree();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        extract(&archive, &out).unwrap();

        assert!(!out.join(MANIFEST_FILE_NAME).exists());
        assert_eq!(
            fs::read_to_string(out.join("src/main.txt")).unwrap(),
            "hello [[ProjectName]]"
        );
    }

    #[test]
    fn missing_archive_is_a_dedicated_error() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent.ptt");
        assert!(matches!(
            read_manifest(&absent),
            Err(Error::ArchiveDoesNotExistError { .. })
        ));
        assert!(matches!(
            extract(&absent, dir.path()),
            Err(Error::ArchiveDoesNotExistError { .. })
        ));
    }

    #[test]
    fn archive_without_manifest_entry_is_rejected() {
        let dir = TempDir::new().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join("file.txt"), "x").unwrap();
        let archive = dir.path().join("bare.ptt");
        create(&tree, &archive).unwrap();

        assert!(matches!(read_manifest(&archive), Err(Error::ArchiveError(_))));
    }

    #[test]
    fn checksum_is_stable_for_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();

        assert_eq!(file_sha256(&a).unwrap(), file_sha256(&b).unwrap());
        assert_eq!(file_sha256(&a).unwrap().len(), 64);
    }
}
