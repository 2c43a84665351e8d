//! Read-only view of which images have annotations.
//!
//! Every call rescans the directories; nothing is cached between calls.

pub mod naming;
pub mod scan;

pub use naming::FileNaming;
pub use scan::{annotation_files, list_files, remaining, scan_annotations, scan_images};

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// One consistent scan of the image store against an annotation store.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub images: BTreeMap<String, PathBuf>,
    pub annotated: BTreeSet<String>,
    pub remaining: Vec<String>,
}

impl Inventory {
    pub fn scan(
        images_dir: &Path,
        annotations_dir: &Path,
        naming: &FileNaming,
    ) -> io::Result<Inventory> {
        let images = scan_images(images_dir, naming)?;
        let annotated = scan_annotations(annotations_dir, naming)?;
        let remaining = images
            .keys()
            .filter(|name| !annotated.contains(*name))
            .cloned()
            .collect();

        Ok(Inventory {
            images,
            annotated,
            remaining,
        })
    }

    pub fn total_images(&self) -> usize {
        self.images.len()
    }

    /// Annotations whose image is also present in the image store.
    pub fn annotated_images(&self) -> usize {
        self.images.len() - self.remaining.len()
    }

    /// File name of the image called `name` (`b` -> `b.jpg`); the name itself if untracked.
    pub fn image_file_name(&self, name: &str) -> String {
        self.images
            .get(name)
            .and_then(|path| path.file_name())
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn remaining_file_names(&self) -> Vec<String> {
        self.remaining
            .iter()
            .map(|name| self.image_file_name(name))
            .collect()
    }

    /// Annotation documents with no matching image.
    pub fn orphaned(&self) -> Vec<&str> {
        self.annotated
            .iter()
            .filter(|name| !self.images.contains_key(*name))
            .map(String::as_str)
            .collect()
    }
}
