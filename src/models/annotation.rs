// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the per-image labels: axis-aligned bounding boxes
//! for detection projects and boxes with ordered keypoints for pose
//! projects. All coordinates are normalized to the image (0.0 to 1.0).

use serde::{Deserialize, Serialize};

/// A 2D point. Normalized when stored in an annotation, pixels elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a box spanning two opposite corners, in any drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Intersect with the unit square.
    pub fn clamp_unit(&self) -> Self {
        let x0 = self.x.clamp(0.0, 1.0);
        let y0 = self.y.clamp(0.0, 1.0);
        let x1 = (self.x + self.width).clamp(0.0, 1.0);
        let y1 = (self.y + self.height).clamp(0.0, 1.0);
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Label quality of a single keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Skipped during placement; coordinates carry no meaning.
    #[default]
    NotLabeled,
    LabeledNotVisible,
    LabeledVisible,
}

impl Visibility {
    pub fn as_u8(self) -> u8 {
        match self {
            Visibility::NotLabeled => 0,
            Visibility::LabeledNotVisible => 1,
            Visibility::LabeledVisible => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Visibility::NotLabeled),
            1 => Some(Visibility::LabeledNotVisible),
            2 => Some(Visibility::LabeledVisible),
            _ => None,
        }
    }

    pub fn is_labeled(self) -> bool {
        self != Visibility::NotLabeled
    }
}

// Stored as the numeric code so label files and saved projects agree.
impl Serialize for Visibility {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Visibility::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid keypoint visibility {}", value)))
    }
}

/// A placed (or skipped) instance of a keypoint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointAnnotation {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub visible: Visibility,
}

impl KeypointAnnotation {
    pub fn placed(id: impl Into<String>, at: Point) -> Self {
        Self {
            id: id.into(),
            x: at.x,
            y: at.y,
            visible: Visibility::LabeledVisible,
        }
    }

    pub fn skipped(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            visible: Visibility::NotLabeled,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A bounding box label in a detection project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionAnnotation {
    pub class_id: String,
    pub color: String,
    pub bbox: BoundingBox,
}

/// A bounding box plus one keypoint entry per definition of its class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseAnnotation {
    pub class_id: String,
    pub color: String,
    pub bbox: BoundingBox,
    pub keypoints: Vec<KeypointAnnotation>,
}

/// Common read access to either annotation variant.
pub trait LabeledBox {
    fn class_id(&self) -> &str;
    fn color(&self) -> &str;
    fn bbox(&self) -> BoundingBox;

    fn keypoints(&self) -> &[KeypointAnnotation] {
        &[]
    }
}

impl LabeledBox for DetectionAnnotation {
    fn class_id(&self) -> &str {
        &self.class_id
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }
}

impl LabeledBox for PoseAnnotation {
    fn class_id(&self) -> &str {
        &self.class_id
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn keypoints(&self) -> &[KeypointAnnotation] {
        &self.keypoints
    }
}

/// A finished annotation handed to the store, tagged by model type.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Detection(DetectionAnnotation),
    Pose(PoseAnnotation),
}

impl Annotation {
    pub fn as_labeled(&self) -> &dyn LabeledBox {
        match self {
            Annotation::Detection(ann) => ann,
            Annotation::Pose(ann) => ann,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_any_direction() {
        let a = BoundingBox::from_corners(Point::new(50.0, 60.0), Point::new(10.0, 10.0));
        assert_eq!(a, BoundingBox::new(10.0, 10.0, 40.0, 50.0));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = BoundingBox::new(0.1, 0.1, 0.2, 0.2);
        assert!(b.contains(Point::new(0.1, 0.1)));
        assert!(b.contains(Point::new(0.3, 0.3)));
        assert!(!b.contains(Point::new(0.31, 0.2)));
    }

    #[test]
    fn test_clamp_unit() {
        let b = BoundingBox::new(-0.5, 0.5, 1.0, 1.0).clamp_unit();
        assert_eq!(b, BoundingBox::new(0.0, 0.5, 0.5, 0.5));
    }

    #[test]
    fn test_visibility_serializes_as_number() {
        let kp = KeypointAnnotation::placed("head", Point::new(0.5, 0.25));
        let json = serde_json::to_string(&kp).unwrap();
        assert!(json.contains("\"visible\":2"));

        let back: KeypointAnnotation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.visible, Visibility::LabeledVisible);
    }

    #[test]
    fn test_visibility_rejects_unknown_code() {
        let result: Result<KeypointAnnotation, _> =
            serde_json::from_str(r#"{"id":"a","x":0.0,"y":0.0,"visible":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_skipped_keypoint_is_not_labeled() {
        let kp = KeypointAnnotation::skipped("tail");
        assert_eq!(kp.visible, Visibility::NotLabeled);
        assert!(!kp.visible.is_labeled());
        assert_eq!(kp.position(), Point::new(0.0, 0.0));
    }
}
