use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::naming::FileNaming;

/// List regular files directly inside `dir`, sorted by path.
///
/// A missing directory is an empty listing: a fresh workspace is a valid state.
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("Directory {} does not exist, treating as empty", dir.display());
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(io::Error::new(
                err.kind(),
                format!("Error reading directory {}: {}", dir.display(), err),
            ));
        }
    };

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Error reading entry in directory {}: {}", dir.display(), err),
            )
        })?;

        let path = entry.path();
        // Entries can vanish while the labeling tool is writing; skip them.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(io::Error::new(
                    err.kind(),
                    format!("Error getting metadata for {}: {}", path.display(), err),
                ));
            }
        };

        if metadata.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Image name -> path for every tracked image in `dir`.
pub fn scan_images(dir: &Path, naming: &FileNaming) -> io::Result<BTreeMap<String, PathBuf>> {
    let mut images: BTreeMap<String, PathBuf> = BTreeMap::new();

    for path in list_files(dir)? {
        let Some(name) = naming.image_name(&path) else {
            continue;
        };
        if let Some(kept) = images.get(&name) {
            warn!(
                "Image name '{}' is shared by {} and {}; keeping the first",
                name,
                kept.display(),
                path.display()
            );
            continue;
        }
        images.insert(name, path);
    }

    Ok(images)
}

/// Names of every annotation document in `dir`.
pub fn scan_annotations(dir: &Path, naming: &FileNaming) -> io::Result<BTreeSet<String>> {
    Ok(annotation_files(dir, naming)?.into_keys().collect())
}

/// Annotation name -> path for every annotation document in `dir`.
pub fn annotation_files(dir: &Path, naming: &FileNaming) -> io::Result<BTreeMap<String, PathBuf>> {
    let mut annotations = BTreeMap::new();

    for path in list_files(dir)? {
        match naming.annotation_name(&path) {
            Some(name) => {
                annotations.insert(name, path);
            }
            None => debug!("Ignoring non-annotation file {}", path.display()),
        }
    }

    Ok(annotations)
}

/// Images without an annotation, sorted by name.
pub fn remaining(
    images_dir: &Path,
    annotations_dir: &Path,
    naming: &FileNaming,
) -> io::Result<Vec<String>> {
    let images = scan_images(images_dir, naming)?;
    let annotated = scan_annotations(annotations_dir, naming)?;

    Ok(images
        .into_keys()
        .filter(|name| !annotated.contains(name))
        .collect())
}
