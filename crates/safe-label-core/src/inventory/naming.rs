use glob::Pattern;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::Error;

/// Maps file names to image names and back.
///
/// An image's name is its file stem; an annotation's name is its file name
/// with the annotation suffix removed (`cat042_keypoints.json` -> `cat042`).
#[derive(Debug, Clone)]
pub struct FileNaming {
    image_patterns: Vec<Pattern>,
    annotation_suffix: String,
}

impl FileNaming {
    pub fn new(image_globs: &[String], annotation_suffix: &str) -> Result<Self, Error> {
        let image_patterns = image_globs
            .iter()
            .map(|glob| Pattern::new(glob))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            image_patterns,
            annotation_suffix: annotation_suffix.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.image_patterns, &config.annotation_suffix)
    }

    pub fn annotation_suffix(&self) -> &str {
        &self.annotation_suffix
    }

    pub fn is_image(&self, file_name: &str) -> bool {
        !is_hidden(file_name) && self.image_patterns.iter().any(|p| p.matches(file_name))
    }

    /// Image name for a file, or `None` if it is not an image this scheme tracks.
    pub fn image_name(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        if !self.is_image(file_name) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        Some(stem.to_string())
    }

    /// Annotation name for a file, or `None` if it lacks the suffix.
    pub fn annotation_name(&self, path: &Path) -> Option<String> {
        let file_name = path.file_name()?.to_str()?;
        if is_hidden(file_name) {
            return None;
        }
        match file_name.strip_suffix(self.annotation_suffix.as_str()) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => None,
        }
    }

    pub fn annotation_file_name(&self, name: &str) -> String {
        format!("{}{}", name, self.annotation_suffix)
    }
}

fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naming() -> FileNaming {
        FileNaming::new(&["*.jpg".to_string()], "_keypoints.json").unwrap()
    }

    #[test]
    fn test_image_name_is_stem() {
        let n = naming();
        assert_eq!(n.image_name(Path::new("/x/cat042.jpg")), Some("cat042".to_string()));
        assert_eq!(n.image_name(Path::new("/x/cat042.png")), None);
        assert_eq!(n.image_name(Path::new("/x/.hidden.jpg")), None);
    }

    #[test]
    fn test_annotation_name_strips_suffix() {
        let n = naming();
        assert_eq!(
            n.annotation_name(Path::new("cat042_keypoints.json")),
            Some("cat042".to_string())
        );
        assert_eq!(n.annotation_name(Path::new("cat042.json")), None);
        assert_eq!(n.annotation_name(Path::new("_keypoints.json")), None);
    }

    #[test]
    fn test_names_with_inner_keypoints_text() {
        // Only the trailing suffix is stripped.
        let n = naming();
        assert_eq!(
            n.annotation_name(Path::new("a_keypoints_b_keypoints.json")),
            Some("a_keypoints_b".to_string())
        );
        assert_eq!(n.annotation_file_name("a_keypoints_b"), "a_keypoints_b_keypoints.json");
    }

    #[test]
    fn test_multiple_patterns() {
        let n = FileNaming::new(&["*.jpg".to_string(), "*.png".to_string()], "_kp.json").unwrap();
        assert!(n.is_image("a.png"));
        assert!(n.is_image("a.jpg"));
        assert!(!n.is_image("a.gif"));
    }
}
