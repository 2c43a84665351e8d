use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::Error;

/// Ordered landmark vocabulary shared by every annotation document.
pub const KEYPOINT_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear_base",
    "left_ear_tip",
    "right_ear_base",
    "right_ear_tip",
    "neck",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_paw_front",
    "right_paw_front",
    "tail_base",
    "tail_mid",
    "tail_tip",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: String,
    pub x: i32,
    pub y: i32,
    /// 1 when the landmark is visible, 0 otherwise.
    pub visible: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub image_id: String,
    /// `[x0, y0, x1, y1]` in pixels.
    pub bbox: [i32; 4],
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub behavior_label: Option<String>,
    #[serde(default)]
    pub mood_label: Option<String>,
    /// ISO-8601, with or without an offset.
    pub timestamp: String,
    pub source: String,
}

impl AnnotationDocument {
    pub fn new(image_id: &str, bbox: [i32; 4], keypoints: Vec<Keypoint>, source: &str) -> Self {
        Self {
            image_id: image_id.to_string(),
            bbox,
            keypoints,
            behavior_label: None,
            mood_label: None,
            timestamp: Local::now().to_rfc3339(),
            source: source.to_string(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// True when the keypoints enumerate exactly [`KEYPOINT_NAMES`], in order.
    pub fn follows_vocabulary(&self) -> bool {
        self.keypoints.len() == KEYPOINT_NAMES.len()
            && self
                .keypoints
                .iter()
                .zip(KEYPOINT_NAMES.iter())
                .all(|(kp, expected)| kp.name == *expected)
    }

    pub fn visible_count(&self) -> usize {
        self.keypoints.iter().filter(|kp| kp.visible != 0).count()
    }

    pub fn created_at(&self) -> Option<NaiveDateTime> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.naive_local())
            .or_else(|_| NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_keypoints() -> Vec<Keypoint> {
        KEYPOINT_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Keypoint {
                name: name.to_string(),
                x: 100 + i as i32,
                y: 200,
                visible: (i % 2) as u8,
            })
            .collect()
    }

    #[test]
    fn test_parse_tool_output() {
        let json = r#"{
            "image_id": "cat042.jpg",
            "bbox": [50, 60, 250, 280],
            "keypoints": [{"name": "nose", "x": 120, "y": 130, "visible": 1}],
            "behavior_label": "unknown",
            "mood_label": "unknown",
            "timestamp": "2024-03-01T10:15:30.123456",
            "source": "X-AnyLabeling"
        }"#;
        let doc: AnnotationDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.bbox, [50, 60, 250, 280]);
        assert_eq!(doc.behavior_label.as_deref(), Some("unknown"));
        assert_eq!(doc.visible_count(), 1);
        assert!(!doc.follows_vocabulary());
        assert!(doc.created_at().is_some());
    }

    #[test]
    fn test_labels_are_optional() {
        let json = r#"{"image_id": "a", "bbox": [0, 0, 1, 1], "keypoints": [],
            "timestamp": "2024-03-01T10:15:30+02:00", "source": "manual"}"#;
        let doc: AnnotationDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.mood_label, None);
        assert!(doc.created_at().is_some());
    }

    #[test]
    fn test_vocabulary_order_matters() {
        let mut doc = AnnotationDocument::new("a.jpg", [0, 0, 10, 10], full_keypoints(), "test");
        assert!(doc.follows_vocabulary());
        doc.keypoints.swap(0, 1);
        assert!(!doc.follows_vocabulary());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a_keypoints.json");
        let doc = AnnotationDocument::new("a.jpg", [1, 2, 3, 4], full_keypoints(), "test");
        std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();

        let loaded = AnnotationDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(loaded.created_at().is_some());
    }
}
