// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! YOLO label export.
//!
//! Every labeled image gets a `.txt` file named after it with one line per
//! annotation: `class cx cy w h`, followed for pose projects by `x y v` for
//! every keypoint definition of every class. A `classes.txt` lists class
//! names in definition order.

use crate::models::annotation::{KeypointAnnotation, LabeledBox, Visibility};
use crate::models::project::Project;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// What an export run wrote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub label_files: usize,
    pub lines: usize,
    /// Annotations left out because their class no longer exists.
    pub skipped: usize,
}

/// Label file name for an image: same stem, `.txt` extension.
pub fn label_file_name(image_path: &str) -> Option<String> {
    let stem = Path::new(image_path).file_stem()?.to_str()?;
    Some(format!("{}.txt", stem))
}

fn format_keypoints(keypoint_ids: &[&str], placed: &[KeypointAnnotation]) -> String {
    keypoint_ids
        .iter()
        .map(|id| match placed.iter().find(|kp| kp.id == *id) {
            Some(kp) if kp.visible == Visibility::LabeledVisible => {
                format!("{} {} {}", kp.x, kp.y, kp.visible.as_u8())
            }
            _ => "0 0 0".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One label line, or `None` when the annotation's class is gone.
pub fn format_label_line(project: &Project, annotation: &dyn LabeledBox) -> Option<String> {
    let class_index = project.class_index(annotation.class_id())?;
    let bbox = annotation.bbox();
    let center = bbox.center();
    let mut line = format!("{} {} {} {} {}", class_index, center.x, center.y, bbox.width, bbox.height);

    let keypoint_ids: Vec<&str> = project
        .keypoint_definitions()
        .into_iter()
        .map(|kp| kp.id.as_str())
        .collect();
    if !keypoint_ids.is_empty() {
        line.push(' ');
        line.push_str(&format_keypoints(&keypoint_ids, annotation.keypoints()));
    }
    Some(line)
}

/// Write label files for every annotated image into `out_dir`.
pub fn export_yolo_labels(project: &Project, out_dir: &Path) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for image_path in project.labeled_paths() {
        let Some(file_name) = label_file_name(image_path) else {
            log::warn!("Cannot derive a label file name for {}", image_path);
            continue;
        };

        let mut lines = Vec::new();
        for annotation in project.annotations(image_path) {
            match format_label_line(project, annotation) {
                Some(line) => lines.push(line),
                None => {
                    log::warn!("Skipping annotation with unknown class {}", annotation.class_id());
                    summary.skipped += 1;
                }
            }
        }

        let path: PathBuf = out_dir.join(file_name);
        std::fs::write(&path, lines.join("\n")).with_context(|| format!("Failed to write {}", path.display()))?;
        summary.label_files += 1;
        summary.lines += lines.len();
    }

    let class_names: Vec<&str> = project.classes().into_iter().map(|(_, name)| name.trim()).collect();
    let classes_path = out_dir.join("classes.txt");
    std::fs::write(&classes_path, class_names.join("\n"))
        .with_context(|| format!("Failed to write {}", classes_path.display()))?;

    log::info!(
        "Exported {} label files ({} lines) to {}",
        summary.label_files,
        summary.lines,
        out_dir.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Annotation, BoundingBox, DetectionAnnotation, Point, PoseAnnotation};
    use crate::models::project::{DetectionClass, KeypointDefinition, ModelType, PoseClass};
    use crate::models::store::ProjectStore;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_label_file_name() {
        assert_eq!(label_file_name("/data/img_001.jpg").as_deref(), Some("img_001.txt"));
        assert_eq!(label_file_name("/data/archive.tar.gz").as_deref(), Some("archive.tar.txt"));
    }

    #[test]
    fn test_detection_line() {
        let mut store = ProjectStore::new();
        let pid = store.add_project(Project::new("p", ModelType::Detection, "/d")).id.clone();
        let class = DetectionClass::new("cat");
        let cid = class.id.clone();
        store.add_detection_class(&pid, class);
        let project = store.project(&pid).unwrap();

        let ann = DetectionAnnotation {
            class_id: cid,
            color: "#ef4444".into(),
            bbox: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
        };
        assert_eq!(format_label_line(&project, &ann).as_deref(), Some("0 0.2 0.2 0.2 0.2"));
    }

    #[test]
    fn test_pose_line_pads_missing_and_hidden_keypoints() {
        let mut store = ProjectStore::new();
        let pid = store.add_project(Project::new("p", ModelType::Pose, "/d")).id.clone();
        let dog = PoseClass::new("dog", vec![KeypointDefinition::new("head"), KeypointDefinition::new("tail")]);
        let cat = PoseClass::new("cat", vec![KeypointDefinition::new("nose")]);
        let dog_id = dog.id.clone();
        let head = dog.keypoints[0].id.clone();
        let tail = dog.keypoints[1].id.clone();
        store.add_pose_class(&pid, dog);
        store.add_pose_class(&pid, cat);
        let project = store.project(&pid).unwrap();

        let ann = PoseAnnotation {
            class_id: dog_id,
            color: "#ef4444".into(),
            bbox: BoundingBox::new(0.0, 0.0, 0.5, 0.5),
            keypoints: vec![
                KeypointAnnotation::placed(head, Point::new(0.25, 0.125)),
                KeypointAnnotation::skipped(tail),
                // no longer defined anywhere
                KeypointAnnotation::placed("stale", Point::new(0.9, 0.9)),
            ],
        };
        assert_eq!(
            format_label_line(&project, &ann).as_deref(),
            Some("0 0.25 0.25 0.5 0.5 0.25 0.125 2 0 0 0 0 0 0")
        );
    }

    #[test]
    fn test_export_writes_files() {
        let dir = tempdir().unwrap();
        let img = dir.path().join("img_001.png").to_string_lossy().to_string();
        let unlabeled = dir.path().join("img_002.png").to_string_lossy().to_string();

        let mut store = ProjectStore::new();
        let pid = store.add_project(Project::new("p", ModelType::Detection, dir.path())).id.clone();
        let class = DetectionClass::new(" cat ");
        let cid = class.id.clone();
        store.add_detection_class(&pid, class);
        store.add_detection_class(&pid, DetectionClass::new("dog"));
        store.update_image_paths(&pid, vec![img.clone(), unlabeled]);
        for (class_id, x) in [(cid.as_str(), 0.1), ("deleted", 0.5)] {
            store.add_annotation(
                &pid,
                &img,
                Annotation::Detection(DetectionAnnotation {
                    class_id: class_id.to_string(),
                    color: "#ef4444".into(),
                    bbox: BoundingBox::new(x, 0.1, 0.2, 0.2),
                }),
            );
        }
        let project = store.project(&pid).unwrap();

        let summary = export_yolo_labels(&project, dir.path()).unwrap();
        assert_eq!(summary, ExportSummary { label_files: 1, lines: 1, skipped: 1 });

        let labels = fs::read_to_string(dir.path().join("img_001.txt")).unwrap();
        assert_eq!(labels, "0 0.2 0.2 0.2 0.2");
        assert!(!dir.path().join("img_002.txt").exists());

        let classes = fs::read_to_string(dir.path().join("classes.txt")).unwrap();
        assert_eq!(classes, "cat\ndog");
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let project = Project::new("p", ModelType::Detection, dir.path());
        assert!(export_yolo_labels(&project, &dir.path().join("missing")).is_err());
    }
}
