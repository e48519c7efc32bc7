// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state.
//!
//! A project ties an image directory to a fixed model type, the label
//! classes defined for it, and the annotations drawn on each image.

use super::annotation::{DetectionAnnotation, LabeledBox, PoseAnnotation};
use crate::util::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Kind of model a project produces labels for. Fixed for the project's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Detection,
    Pose,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Detection => write!(f, "detection"),
            ModelType::Pose => write!(f, "pose"),
        }
    }
}

/// A named keypoint slot on a pose class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeypointDefinition {
    pub id: String,
    pub name: String,
}

impl KeypointDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionClass {
    pub id: String,
    pub name: String,
}

impl DetectionClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
        }
    }
}

/// A pose class. Keypoint order is the placement and export order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseClass {
    pub id: String,
    pub name: String,
    pub keypoints: Vec<KeypointDefinition>,
}

impl PoseClass {
    pub fn new(name: impl Into<String>, keypoints: Vec<KeypointDefinition>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            keypoints,
        }
    }
}

/// Classes and annotations, tagged by model type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "lowercase")]
pub enum Labels {
    Detection {
        classes: Vec<DetectionClass>,
        annotations: BTreeMap<String, Vec<DetectionAnnotation>>,
    },
    Pose {
        classes: Vec<PoseClass>,
        annotations: BTreeMap<String, Vec<PoseAnnotation>>,
    },
}

/// Complete project data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub image_dir: PathBuf,
    pub image_paths: Vec<String>,
    #[serde(flatten)]
    pub labels: Labels,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty project of the given model type.
    pub fn new(name: impl Into<String>, model_type: ModelType, image_dir: impl Into<PathBuf>) -> Self {
        let labels = match model_type {
            ModelType::Detection => Labels::Detection {
                classes: Vec::new(),
                annotations: BTreeMap::new(),
            },
            ModelType::Pose => Labels::Pose {
                classes: Vec::new(),
                annotations: BTreeMap::new(),
            },
        };

        Self {
            id: generate_id(),
            name: name.into(),
            image_dir: image_dir.into(),
            image_paths: Vec::new(),
            labels,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn model_type(&self) -> ModelType {
        match self.labels {
            Labels::Detection { .. } => ModelType::Detection,
            Labels::Pose { .. } => ModelType::Pose,
        }
    }

    /// Annotations on one image, oldest first.
    pub fn annotations(&self, image_path: &str) -> Vec<&dyn LabeledBox> {
        match &self.labels {
            Labels::Detection { annotations, .. } => annotations
                .get(image_path)
                .map(|anns| anns.iter().map(|a| a as &dyn LabeledBox).collect())
                .unwrap_or_default(),
            Labels::Pose { annotations, .. } => annotations
                .get(image_path)
                .map(|anns| anns.iter().map(|a| a as &dyn LabeledBox).collect())
                .unwrap_or_default(),
        }
    }

    pub fn annotation_count(&self, image_path: &str) -> usize {
        match &self.labels {
            Labels::Detection { annotations, .. } => annotations.get(image_path).map_or(0, Vec::len),
            Labels::Pose { annotations, .. } => annotations.get(image_path).map_or(0, Vec::len),
        }
    }

    /// Image paths with at least one annotation, in image order.
    pub fn labeled_paths(&self) -> Vec<&str> {
        self.image_paths
            .iter()
            .filter(|p| self.annotation_count(p) > 0)
            .map(String::as_str)
            .collect()
    }

    /// `(id, name)` of every class in definition order.
    pub fn classes(&self) -> Vec<(&str, &str)> {
        match &self.labels {
            Labels::Detection { classes, .. } => {
                classes.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect()
            }
            Labels::Pose { classes, .. } => {
                classes.iter().map(|c| (c.id.as_str(), c.name.as_str())).collect()
            }
        }
    }

    pub fn class_index(&self, class_id: &str) -> Option<usize> {
        self.classes().iter().position(|(id, _)| *id == class_id)
    }

    pub fn class_name(&self, class_id: &str) -> Option<&str> {
        self.classes()
            .into_iter()
            .find(|(id, _)| *id == class_id)
            .map(|(_, name)| name)
    }

    pub fn has_class(&self, class_id: &str) -> bool {
        self.class_index(class_id).is_some()
    }

    pub fn pose_class(&self, class_id: &str) -> Option<&PoseClass> {
        match &self.labels {
            Labels::Pose { classes, .. } => classes.iter().find(|c| c.id == class_id),
            Labels::Detection { .. } => None,
        }
    }

    /// Keypoint definitions of all classes, class by class.
    pub fn keypoint_definitions(&self) -> Vec<&KeypointDefinition> {
        match &self.labels {
            Labels::Pose { classes, .. } => classes.iter().flat_map(|c| c.keypoints.iter()).collect(),
            Labels::Detection { .. } => Vec::new(),
        }
    }

    /// Name of a keypoint definition, searched across every class.
    pub fn keypoint_name(&self, keypoint_id: &str) -> Option<&str> {
        self.keypoint_definitions()
            .into_iter()
            .find(|kp| kp.id == keypoint_id)
            .map(|kp| kp.name.as_str())
    }
}
