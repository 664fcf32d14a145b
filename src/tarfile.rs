//! # Tar Archive Handling
//!
//! In-process tar extraction and creation. Extraction understands plain and
//! gzip-compressed archives (detected by magic bytes, not file name) and can
//! strip a fixed number of leading path components, the way upstream release
//! tarballs wrap everything in a `name-version/` directory.

use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, Builder};

use crate::error::{Error, Result};

/// Extract `archive` into `dest`, stripping `strip_components` leading path
/// components from every entry. Entries consumed entirely by the strip are
/// skipped, as are entries that would escape `dest`.
pub fn extract(archive: &Path, dest: &Path, strip_components: usize) -> Result<()> {
    log::debug!(
        "extracting {} into {} (strip {})",
        archive.display(),
        dest.display(),
        strip_components
    );
    let file = fs::File::open(archive)?;
    if is_gzip(archive)? {
        unpack(Archive::new(GzDecoder::new(file)), dest, strip_components)
    } else {
        unpack(Archive::new(file), dest, strip_components)
    }
}

fn unpack<R: Read>(mut archive: Archive<R>, dest: &Path, strip: usize) -> Result<()> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        if path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(Error::Precondition {
                message: format!("archive entry escapes destination: {}", path.display()),
            });
        }
        let stripped: PathBuf = path.components().skip(strip).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(stripped);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }
    Ok(())
}

/// Create `tar_path` containing `dir`'s tree under the `prefix/` directory.
pub fn create(tar_path: &Path, dir: &Path, prefix: &str) -> Result<()> {
    log::debug!(
        "archiving {} as {} into {}",
        dir.display(),
        prefix,
        tar_path.display()
    );
    let file = fs::File::create(tar_path)?;
    let mut builder = Builder::new(file);
    builder.append_dir_all(prefix, dir)?;
    builder.finish()?;
    Ok(())
}

fn is_gzip(path: &Path) -> Result<bool> {
    let mut magic = [0u8; 2];
    let mut file = fs::File::open(path)?;
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == [0x1f, 0x8b]),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    /// Build a tarball laid out like an upstream release: everything under
    /// one `pkg-1.0/` directory.
    fn release_tar_bytes() -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        let mut append = |path: &str, content: &[u8]| {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content).unwrap();
        };
        append("pkg-1.0/README", b"hello\n");
        append("pkg-1.0/src/main.c", b"int main(void) { return 0; }\n");
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_extract_strips_one_component() {
        let temp = TempDir::new().unwrap();
        let tar_path = temp.path().join("pkg.tar");
        fs::write(&tar_path, release_tar_bytes()).unwrap();

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        extract(&tar_path, &dest, 1).unwrap();

        assert_eq!(fs::read(dest.join("README")).unwrap(), b"hello\n");
        assert!(dest.join("src/main.c").exists());
        assert!(!dest.join("pkg-1.0").exists());
    }

    #[test]
    fn test_extract_without_strip_keeps_leading_directory() {
        let temp = TempDir::new().unwrap();
        let tar_path = temp.path().join("pkg.tar");
        fs::write(&tar_path, release_tar_bytes()).unwrap();

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        extract(&tar_path, &dest, 0).unwrap();

        assert!(dest.join("pkg-1.0/README").exists());
    }

    #[test]
    fn test_extract_gzip_detected_by_magic() {
        let temp = TempDir::new().unwrap();
        // Deliberately misleading extension; detection is content-based.
        let tar_path = temp.path().join("pkg.tar");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&release_tar_bytes()).unwrap();
        fs::write(&tar_path, encoder.finish().unwrap()).unwrap();

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        extract(&tar_path, &dest, 1).unwrap();
        assert!(dest.join("README").exists());
    }

    #[test]
    fn test_create_embeds_prefix() {
        let temp = TempDir::new().unwrap();
        let tree = temp.path().join("tree");
        fs::create_dir_all(tree.join("docs")).unwrap();
        fs::write(tree.join("docs/a.txt"), b"a").unwrap();

        let tar_path = temp.path().join("component.tar");
        create(&tar_path, &tree, "component").unwrap();

        let mut archive = Archive::new(fs::File::open(&tar_path).unwrap());
        let paths: Vec<PathBuf> = archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().into_owned())
            .collect();
        assert!(paths.iter().all(|path| path.starts_with("component")));
        assert!(paths.contains(&PathBuf::from("component/docs/a.txt")));
    }

    #[test]
    fn test_extract_rejects_escaping_entries() {
        let temp = TempDir::new().unwrap();
        let tar_path = temp.path().join("evil.tar");
        let mut builder = Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        let content = b"evil";
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        if builder
            .append_data(&mut header, "pkg/../../escape", &content[..])
            .is_err()
        {
            // The builder refused to encode the path; nothing to extract.
            return;
        }
        fs::write(&tar_path, builder.into_inner().unwrap()).unwrap();

        let dest = temp.path().join("out");
        fs::create_dir(&dest).unwrap();
        assert!(extract(&tar_path, &dest, 1).is_err());
    }
}
