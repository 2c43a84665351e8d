use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Error;
use crate::inventory::{self, FileNaming};

/// Freeze the canonical store into a new `backup_dir`. Returns the number of files copied.
///
/// Refuses when `backup_dir` already exists: a backup, once taken, is never written again.
pub fn snapshot(canonical_dir: &Path, backup_dir: &Path, naming: &FileNaming) -> Result<usize, Error> {
    if !canonical_dir.is_dir() {
        return Err(Error::MissingDirectory(canonical_dir.to_path_buf()));
    }

    match fs::symlink_metadata(backup_dir) {
        Ok(_) => return Err(Error::BackupExists(backup_dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    let documents = inventory::annotation_files(canonical_dir, naming)?;

    // Copy into a sibling first; only a complete copy becomes the backup.
    let partial = partial_path(backup_dir);
    if partial.exists() {
        fs::remove_dir_all(&partial)?;
    }
    fs::create_dir_all(&partial)?;
    for path in documents.values() {
        if let Some(file_name) = path.file_name() {
            fs::copy(path, partial.join(file_name))?;
            debug!("Backed up {}", path.display());
        }
    }
    fs::rename(&partial, backup_dir)?;

    info!(
        "Backed up {} annotations from {} to {}",
        documents.len(),
        canonical_dir.display(),
        backup_dir.display()
    );
    Ok(documents.len())
}

fn partial_path(backup_dir: &Path) -> PathBuf {
    let mut name = backup_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    backup_dir.with_file_name(name)
}

/// Number of annotation documents in the backup store.
pub fn count(backup_dir: &Path, naming: &FileNaming) -> io::Result<usize> {
    Ok(inventory::scan_annotations(backup_dir, naming)?.len())
}
