// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project collection persistence.
//!
//! The whole collection is the unit of persisted state. It is stored as
//! YAML or JSON depending on the file extension.

use crate::models::project::Project;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk layout of the persisted state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedState {
    projects: Vec<Project>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_for(path: &Path) -> Result<Format> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        other => anyhow::bail!("Unsupported file extension: {:?}", other),
    }
}

/// Write every project to `path`.
pub fn save_projects(projects: &[Project], path: &Path) -> Result<()> {
    let state = SavedState {
        projects: projects.to_vec(),
    };
    let text = match format_for(path)? {
        Format::Yaml => serde_yaml::to_string(&state)?,
        Format::Json => serde_json::to_string_pretty(&state)?,
    };

    // Write next to the target first so a failed write keeps the old file.
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, text).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Read the project collection. A missing file is an empty collection.
pub fn load_projects(path: &Path) -> Result<Vec<Project>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let state: SavedState = match format_for(path)? {
        Format::Yaml => serde_yaml::from_str(&text)?,
        Format::Json => serde_json::from_str(&text)?,
    };
    Ok(state.projects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Annotation, BoundingBox, DetectionAnnotation};
    use crate::models::project::{DetectionClass, ModelType};
    use crate::models::store::ProjectStore;
    use tempfile::tempdir;

    fn sample() -> Vec<Project> {
        let mut store = ProjectStore::new();
        let pid = store.add_project(Project::new("cats", ModelType::Detection, "/data")).id.clone();
        let class = DetectionClass::new("cat");
        let cid = class.id.clone();
        store.add_detection_class(&pid, class);
        store.add_annotation(
            &pid,
            "/data/1.png",
            Annotation::Detection(DetectionAnnotation {
                class_id: cid,
                color: "#ef4444".into(),
                bbox: BoundingBox::new(0.1, 0.1, 0.2, 0.2),
            }),
        );
        store.add_project(Project::new("dogs", ModelType::Pose, "/dogs"));
        store.to_vec()
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let projects = sample();

        save_projects(&projects, &path).unwrap();
        assert_eq!(load_projects(&path).unwrap(), projects);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yaml");
        let projects = sample();

        save_projects(&projects, &path).unwrap();
        assert_eq!(load_projects(&path).unwrap(), projects);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_projects(&dir.path().join("none.json")).unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let result = save_projects(&sample(), &dir.path().join("state.toml"));
        assert!(result.is_err());
    }
}
