// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project collection with atomic, copy-on-write mutations.
//!
//! Every mutation clones the target project, edits the clone and swaps it
//! in behind a fresh `Arc`. Anyone holding a snapshot from before the
//! mutation keeps seeing the old, complete project. Operations on unknown
//! projects, classes or indices are no-ops and never fail.

use super::annotation::{Annotation, LabeledBox};
use super::project::{DetectionClass, KeypointDefinition, Labels, PoseClass, Project};
use chrono::Utc;
use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::sync::Arc;

/// Colors handed out to annotations on the same image.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#14b8a6", "#3b82f6", "#8b5cf6", "#ec4899",
    "#84cc16", "#06b6d4",
];

/// The authoritative project collection.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    projects: Vec<Arc<Project>>,
    palette: Vec<String>,
    revision: u64,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::with_palette(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }

    pub fn with_palette(palette: Vec<String>) -> Self {
        let palette = if palette.is_empty() {
            log::warn!("Empty color palette configured, using defaults");
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };

        Self {
            projects: Vec::new(),
            palette,
            revision: 0,
        }
    }

    /// Replace the whole collection, e.g. after loading from disk.
    pub fn replace_all(&mut self, projects: Vec<Project>) {
        self.projects = projects.into_iter().map(Arc::new).collect();
        self.revision += 1;
    }

    /// Incremented by every effective mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn projects(&self) -> &[Arc<Project>] {
        &self.projects
    }

    /// Plain copies of every project, for persistence.
    pub fn to_vec(&self) -> Vec<Project> {
        self.projects.iter().map(|p| Project::clone(p)).collect()
    }

    pub fn project(&self, id: &str) -> Option<Arc<Project>> {
        self.projects.iter().find(|p| p.id == id).cloned()
    }

    pub fn add_project(&mut self, project: Project) -> Arc<Project> {
        let project = Arc::new(project);
        self.projects.push(Arc::clone(&project));
        self.revision += 1;
        log::info!("Added project '{}' ({})", project.name, project.model_type());
        project
    }

    pub fn delete_project(&mut self, id: &str) {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() != before {
            self.revision += 1;
            log::info!("Deleted project {}", id);
        }
    }

    /// Apply `edit` to a copy of the project and swap it in.
    ///
    /// `edit` returns whether it changed anything; unchanged copies are dropped.
    fn update_project<F>(&mut self, id: &str, touch: bool, edit: F) -> Option<Arc<Project>>
    where
        F: FnOnce(&mut Project) -> bool,
    {
        let Some(index) = self.projects.iter().position(|p| p.id == id) else {
            log::debug!("Ignoring update of unknown project {}", id);
            return None;
        };

        let mut updated = Project::clone(&self.projects[index]);
        if !edit(&mut updated) {
            return None;
        }
        if touch {
            updated.updated_at = Some(Utc::now());
        }

        let updated = Arc::new(updated);
        self.projects[index] = Arc::clone(&updated);
        self.revision += 1;
        Some(updated)
    }

    pub fn update_image_paths(&mut self, id: &str, paths: Vec<String>) -> Option<Arc<Project>> {
        self.update_project(id, false, |project| {
            project.image_paths = paths;
            true
        })
    }

    pub fn update_image_dir(&mut self, id: &str, image_dir: impl Into<PathBuf>) -> Option<Arc<Project>> {
        let image_dir = image_dir.into();
        self.update_project(id, true, |project| {
            project.image_dir = image_dir;
            true
        })
    }

    /// Drop an image from the project together with its annotations.
    pub fn remove_image(&mut self, id: &str, image_path: &str) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| {
            let before = project.image_paths.len();
            project.image_paths.retain(|p| p != image_path);
            let removed_annotations = match &mut project.labels {
                Labels::Detection { annotations, .. } => annotations.remove(image_path).is_some(),
                Labels::Pose { annotations, .. } => annotations.remove(image_path).is_some(),
            };
            project.image_paths.len() != before || removed_annotations
        })
    }

    /// Append an annotation to an image's list.
    ///
    /// The annotation variant must match the project's model type.
    pub fn add_annotation(&mut self, id: &str, image_path: &str, annotation: Annotation) -> Option<Arc<Project>> {
        let result = self.update_project(id, true, |project| {
            match (&mut project.labels, annotation) {
                (Labels::Detection { annotations, .. }, Annotation::Detection(ann)) => {
                    annotations.entry(image_path.to_string()).or_default().push(ann);
                    true
                }
                (Labels::Pose { annotations, .. }, Annotation::Pose(ann)) => {
                    annotations.entry(image_path.to_string()).or_default().push(ann);
                    true
                }
                (_, other) => {
                    log::warn!(
                        "Annotation of class {} does not match model type of project {}",
                        other.as_labeled().class_id(),
                        id
                    );
                    false
                }
            }
        });

        if let Some(ref project) = result {
            log::info!(
                "Added annotation on {}, total: {}",
                image_path,
                project.annotation_count(image_path)
            );
        }
        result
    }

    pub fn delete_annotation_by_index(&mut self, id: &str, image_path: &str, index: usize) -> Option<Arc<Project>> {
        fn remove_at<T>(list: Option<&mut Vec<T>>, index: usize) -> bool {
            match list {
                Some(list) if index < list.len() => {
                    list.remove(index);
                    true
                }
                _ => false,
            }
        }

        let result = self.update_project(id, true, |project| match &mut project.labels {
            Labels::Detection { annotations, .. } => remove_at(annotations.get_mut(image_path), index),
            Labels::Pose { annotations, .. } => remove_at(annotations.get_mut(image_path), index),
        });

        if let Some(ref project) = result {
            log::info!(
                "Deleted annotation {} on {}, total: {}",
                index,
                image_path,
                project.annotation_count(image_path)
            );
        }
        result
    }

    pub fn add_detection_class(&mut self, id: &str, class: DetectionClass) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Detection { classes, .. } => {
                classes.push(class);
                true
            }
            Labels::Pose { .. } => false,
        })
    }

    /// Remove a class. Annotations referencing it are kept and shown as unknown.
    pub fn delete_detection_class(&mut self, id: &str, class_id: &str) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Detection { classes, .. } => {
                let before = classes.len();
                classes.retain(|c| c.id != class_id);
                classes.len() != before
            }
            Labels::Pose { .. } => false,
        })
    }

    pub fn add_pose_class(&mut self, id: &str, class: PoseClass) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Pose { classes, .. } => {
                classes.push(class);
                true
            }
            Labels::Detection { .. } => false,
        })
    }

    /// Remove a class. Annotations referencing it are kept and shown as unknown.
    pub fn delete_pose_class(&mut self, id: &str, class_id: &str) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Pose { classes, .. } => {
                let before = classes.len();
                classes.retain(|c| c.id != class_id);
                classes.len() != before
            }
            Labels::Detection { .. } => false,
        })
    }

    /// Append a keypoint definition. Existing annotations are not reconciled.
    pub fn add_keypoint_definition(
        &mut self,
        id: &str,
        class_id: &str,
        keypoint: KeypointDefinition,
    ) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Pose { classes, .. } => match classes.iter_mut().find(|c| c.id == class_id) {
                Some(class) => {
                    class.keypoints.push(keypoint);
                    true
                }
                None => false,
            },
            Labels::Detection { .. } => false,
        })
    }

    /// Remove a keypoint definition. Existing annotations keep their entries.
    pub fn delete_keypoint_definition(
        &mut self,
        id: &str,
        class_id: &str,
        keypoint_id: &str,
    ) -> Option<Arc<Project>> {
        self.update_project(id, true, |project| match &mut project.labels {
            Labels::Pose { classes, .. } => match classes.iter_mut().find(|c| c.id == class_id) {
                Some(class) => {
                    let before = class.keypoints.len();
                    class.keypoints.retain(|kp| kp.id != keypoint_id);
                    class.keypoints.len() != before
                }
                None => false,
            },
            Labels::Detection { .. } => false,
        })
    }

    /// First palette color not yet used on this image, or a random one.
    pub fn next_color(&self, id: &str, image_path: &str) -> String {
        let used: Vec<String> = match self.projects.iter().find(|p| p.id == id) {
            Some(project) => project
                .annotations(image_path)
                .iter()
                .map(|a| a.color().to_string())
                .collect(),
            None => Vec::new(),
        };

        if let Some(free) = self.palette.iter().find(|c| !used.contains(c)) {
            return free.clone();
        }

        self.palette
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_PALETTE[0].to_string())
    }
}
