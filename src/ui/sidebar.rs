// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project, class and image navigation panel.

use crate::models::project::{Labels, ModelType, Project};
use crate::models::store::ProjectStore;
use std::collections::HashMap;

/// Text entered in the panel's forms, kept between frames.
pub struct SidebarForms {
    pub project_name: String,
    pub model_type: ModelType,
    pub class_name: String,
    /// Comma-separated keypoint names for a new pose class.
    pub class_keypoints: String,
    /// New keypoint name per pose class id.
    pub keypoint_names: HashMap<String, String>,
}

impl Default for SidebarForms {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            model_type: ModelType::Detection,
            class_name: String::new(),
            class_keypoints: String::new(),
            keypoint_names: HashMap::new(),
        }
    }
}

/// Result of sidebar interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarAction {
    None,
    OpenProject(String),
    CreateProject { name: String, model_type: ModelType },
    DeleteProject(String),
    PickImageDir,
    AddClass { name: String, keypoints: Vec<String> },
    DeleteClass(String),
    AddKeypoint { class_id: String, name: String },
    DeleteKeypoint { class_id: String, keypoint_id: String },
    SelectClass(String),
    PreviousImage,
    NextImage,
    GoToImage(usize),
}

/// File name shown in the image list, falling back to the full path.
pub fn image_label(image_path: &str) -> &str {
    std::path::Path::new(image_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(image_path)
}

/// Split a comma-separated list of keypoint names, dropping blanks.
pub fn parse_keypoint_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Display the sidebar.
pub fn show(
    ui: &mut egui::Ui,
    store: &ProjectStore,
    active: Option<&Project>,
    image_index: usize,
    selected_class: Option<&str>,
    forms: &mut SidebarForms,
) -> SidebarAction {
    let mut action = SidebarAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::CollapsingHeader::new("Projects")
            .default_open(active.is_none())
            .show(ui, |ui| {
                for project in store.projects() {
                    let is_active = active.map_or(false, |p| p.id == project.id);
                    ui.horizontal(|ui| {
                        let label = format!("{} ({})", project.name, project.model_type());
                        if ui.selectable_label(is_active, label).clicked() {
                            action = SidebarAction::OpenProject(project.id.clone());
                        }
                        if ui.small_button("🗑").on_hover_text("Delete project").clicked() {
                            action = SidebarAction::DeleteProject(project.id.clone());
                        }
                    });
                }

                ui.separator();
                ui.label("New project");
                ui.text_edit_singleline(&mut forms.project_name);
                egui::ComboBox::from_id_source("new_project_model_type")
                    .selected_text(forms.model_type.to_string())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut forms.model_type, ModelType::Detection, "detection");
                        ui.selectable_value(&mut forms.model_type, ModelType::Pose, "pose");
                    });
                if ui.button("Create").clicked() && !forms.project_name.trim().is_empty() {
                    action = SidebarAction::CreateProject {
                        name: forms.project_name.trim().to_string(),
                        model_type: forms.model_type,
                    };
                    forms.project_name.clear();
                }
            });

        let Some(project) = active else {
            return;
        };

        ui.separator();
        ui.heading(&project.name);
        ui.label(egui::RichText::new(format!("Model type: {}", project.model_type())).weak());

        ui.horizontal(|ui| {
            ui.label(project.image_dir.display().to_string());
            if ui.small_button("📂").on_hover_text("Pick image folder").clicked() {
                action = SidebarAction::PickImageDir;
            }
        });

        let total = project.image_paths.len();
        ui.horizontal(|ui| {
            if ui.add_enabled(image_index > 0, egui::Button::new("◀")).clicked() {
                action = SidebarAction::PreviousImage;
            }
            if total == 0 {
                ui.label("No images");
            } else {
                ui.label(format!("{} / {}", image_index + 1, total));
            }
            if ui.add_enabled(image_index + 1 < total, egui::Button::new("▶")).clicked() {
                action = SidebarAction::NextImage;
            }
        });
        ui.label(format!("{} labeled", project.labeled_paths().len()));

        if total > 0 {
            egui::CollapsingHeader::new("Images").default_open(true).show(ui, |ui| {
                let row_height = ui.text_style_height(&egui::TextStyle::Body);
                egui::ScrollArea::vertical()
                    .id_source("image_list")
                    .max_height(240.0)
                    .show_rows(ui, row_height, total, |ui, rows| {
                        for i in rows {
                            let path = &project.image_paths[i];
                            let mut text = egui::RichText::new(format!("{:>4}  {}", i + 1, image_label(path)));
                            if project.annotation_count(path) > 0 {
                                text = text.strong();
                            }
                            if ui.selectable_label(i == image_index, text).on_hover_text(path).clicked() {
                                action = SidebarAction::GoToImage(i);
                            }
                        }
                    });
            });
        }

        ui.separator();
        ui.label("Classes");
        for (class_id, name) in project.classes() {
            ui.horizontal(|ui| {
                if ui.selectable_label(selected_class == Some(class_id), name).clicked() {
                    action = SidebarAction::SelectClass(class_id.to_string());
                }
                if ui.small_button("🗑").on_hover_text("Delete class").clicked() {
                    action = SidebarAction::DeleteClass(class_id.to_string());
                }
            });
        }

        if let Labels::Pose { classes, .. } = &project.labels {
            for class in classes {
                egui::CollapsingHeader::new(format!("{} keypoints", class.name))
                    .id_source(&class.id)
                    .show(ui, |ui| {
                        for (i, kp) in class.keypoints.iter().enumerate() {
                            ui.horizontal(|ui| {
                                ui.label(format!("{}. {}", i + 1, kp.name));
                                if ui.small_button("🗑").clicked() {
                                    action = SidebarAction::DeleteKeypoint {
                                        class_id: class.id.clone(),
                                        keypoint_id: kp.id.clone(),
                                    };
                                }
                            });
                        }
                        let name = forms.keypoint_names.entry(class.id.clone()).or_default();
                        ui.horizontal(|ui| {
                            ui.text_edit_singleline(name);
                            if ui.button("Add").clicked() && !name.trim().is_empty() {
                                action = SidebarAction::AddKeypoint {
                                    class_id: class.id.clone(),
                                    name: name.trim().to_string(),
                                };
                                name.clear();
                            }
                        });
                    });
            }
        }

        ui.separator();
        ui.label("New class");
        ui.text_edit_singleline(&mut forms.class_name);
        if project.model_type() == ModelType::Pose {
            ui.label(egui::RichText::new("Keypoints (comma-separated)").weak());
            ui.text_edit_singleline(&mut forms.class_keypoints);
        }
        if ui.button("Add class").clicked() && !forms.class_name.trim().is_empty() {
            action = SidebarAction::AddClass {
                name: forms.class_name.trim().to_string(),
                keypoints: parse_keypoint_list(&forms.class_keypoints),
            };
            forms.class_name.clear();
            forms.class_keypoints.clear();
        }
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_label() {
        assert_eq!(image_label("/data/shots/img_001.jpg"), "img_001.jpg");
        assert_eq!(image_label("plain.png"), "plain.png");
        assert_eq!(image_label("/"), "/");
    }

    #[test]
    fn test_parse_keypoint_list() {
        assert_eq!(
            parse_keypoint_list(" head, left_shoulder ,,right_shoulder, "),
            vec!["head", "left_shoulder", "right_shoulder"]
        );
        assert!(parse_keypoint_list("  ").is_empty());
    }
}
