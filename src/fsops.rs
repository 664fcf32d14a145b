//! Staging and removal helpers shared by all materialization paths.
//!
//! Every destination-producing operation in this crate builds into a
//! sibling staging path and renames it into place only on full success, so
//! a crash or failure mid-operation never leaves a half-populated tree at
//! the expected final path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Remove a file, directory tree or symlink; missing paths are fine.
pub fn remove_force(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Sibling path used to stage `dest` before the final rename.
pub fn staging_path(dest: &Path, suffix: &str) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    dest.with_file_name(name)
}

/// Run `build` against a staging sibling of `dest`, then atomically rename
/// the staging path into place. Stale staging left by an earlier crash is
/// removed first; on any failure the staging path is removed and the error
/// propagated, leaving `dest` untouched.
pub fn with_staging<T>(dest: &Path, build: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let staging = staging_path(dest, ".tmp");
    remove_force(&staging)?;
    match build(&staging) {
        Ok(value) => match fs::rename(&staging, dest) {
            Ok(()) => Ok(value),
            Err(err) => {
                let _ = remove_force(&staging);
                Err(err.into())
            }
        },
        Err(err) => {
            let _ = remove_force(&staging);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_remove_force_missing_path_ok() {
        let temp = TempDir::new().unwrap();
        remove_force(&temp.path().join("missing")).unwrap();
    }

    #[test]
    fn test_remove_force_file_and_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, b"x").unwrap();
        remove_force(&file).unwrap();
        assert!(!file.exists());

        let dir = temp.path().join("dir");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file"), b"x").unwrap();
        remove_force(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_staging_path_is_a_sibling() {
        let staging = staging_path(Path::new("/src/zlib"), ".tmp");
        assert_eq!(staging, PathBuf::from("/src/zlib.tmp"));
    }

    #[test]
    fn test_with_staging_renames_on_success() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        with_staging(&dest, |staging| {
            fs::create_dir(staging)?;
            fs::write(staging.join("file"), b"content")?;
            Ok(())
        })
        .unwrap();
        assert!(dest.join("file").exists());
        assert!(!temp.path().join("out.tmp").exists());
    }

    #[test]
    fn test_with_staging_cleans_up_on_failure() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let result: Result<()> = with_staging(&dest, |staging| {
            fs::create_dir(staging)?;
            Err(Error::Precondition {
                message: "boom".to_string(),
            })
        });
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!temp.path().join("out.tmp").exists());
    }

    #[test]
    fn test_with_staging_replaces_stale_staging() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let stale = temp.path().join("out.tmp");
        fs::create_dir(&stale).unwrap();
        fs::write(stale.join("leftover"), b"x").unwrap();
        with_staging(&dest, |staging| {
            fs::create_dir(staging)?;
            Ok(())
        })
        .unwrap();
        assert!(!dest.join("leftover").exists());
    }
}
