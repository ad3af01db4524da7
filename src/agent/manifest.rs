//! aria2 input-file manifest

use crate::error::{AgentError, Result};
use crate::types::FileEntry;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write one manifest block per entry: URL line, then `out=` and `dir=` options
pub fn write_manifest<W: Write>(
    writer: &mut W,
    files: &[FileEntry],
    download_dir: &Path,
) -> std::io::Result<()> {
    for file in files {
        write!(
            writer,
            "{}\n\tout={}\n\tdir={}\n",
            file.url,
            file.output,
            download_dir.display()
        )?;
    }
    Ok(())
}

/// Manifest file on disk
///
/// A temporary manifest is deleted when dropped; a kept one stays behind.
#[derive(Debug)]
pub enum Manifest {
    /// Removed on drop
    Temporary(NamedTempFile),
    /// Persisted at the given path
    Kept(PathBuf),
}

impl Manifest {
    /// Write `files` to a fresh `cloudmail-dl-input-*.txt` in the system temp dir
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::EmptyManifest`] for an empty list and
    /// [`AgentError::Manifest`] when the file cannot be written.
    pub fn create(files: &[FileEntry], download_dir: &Path, keep: bool) -> Result<Self> {
        if files.is_empty() {
            return Err(AgentError::EmptyManifest.into());
        }

        let mut temp = tempfile::Builder::new()
            .prefix("cloudmail-dl-input-")
            .suffix(".txt")
            .tempfile()
            .map_err(manifest_error)?;

        write_manifest(temp.as_file_mut(), files, download_dir).map_err(manifest_error)?;
        temp.as_file_mut().flush().map_err(manifest_error)?;

        if keep {
            let (_file, path) = temp.keep().map_err(|e| manifest_error(e.error))?;
            Ok(Manifest::Kept(path))
        } else {
            Ok(Manifest::Temporary(temp))
        }
    }

    /// Path to hand to the agent
    pub fn path(&self) -> &Path {
        match self {
            Manifest::Temporary(file) => file.path(),
            Manifest::Kept(path) => path,
        }
    }
}

fn manifest_error(e: std::io::Error) -> crate::error::Error {
    AgentError::Manifest {
        reason: e.to_string(),
    }
    .into()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn entries() -> Vec<FileEntry> {
        vec![
            FileEntry {
                url: "https://host/get/Ab/Cd/a%20b.txt".into(),
                output: "Root/a b.txt".into(),
            },
            FileEntry {
                url: "https://host/get/Ab/Cd/Sub/c.txt".into(),
                output: "Root/Sub/c.txt".into(),
            },
        ]
    }

    #[test]
    fn manifest_blocks_use_tab_indented_options() {
        let mut buf = Vec::new();
        write_manifest(&mut buf, &entries(), Path::new("/data/dl")).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "https://host/get/Ab/Cd/a%20b.txt\n\tout=Root/a b.txt\n\tdir=/data/dl\n\
             https://host/get/Ab/Cd/Sub/c.txt\n\tout=Root/Sub/c.txt\n\tdir=/data/dl\n"
        );
    }

    #[test]
    fn temporary_manifest_is_removed_on_drop() {
        let manifest = Manifest::create(&entries(), Path::new("downloads"), false).unwrap();
        let path = manifest.path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("cloudmail-dl-input-"));
        assert!(name.ends_with(".txt"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("\tout=Root/a b.txt"));
        drop(manifest);
        assert!(!path.exists());
    }

    #[test]
    fn kept_manifest_survives_drop() {
        let manifest = Manifest::create(&entries(), Path::new("downloads"), true).unwrap();
        let path = manifest.path().to_path_buf();
        drop(manifest);
        assert!(path.exists());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            Manifest::create(&[], Path::new("downloads"), false),
            Err(Error::Agent(AgentError::EmptyManifest))
        ));
    }
}
