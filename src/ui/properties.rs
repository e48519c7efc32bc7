// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation list for the current image.

use super::canvas::parse_color;
use crate::models::project::Project;

/// Result of properties panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesAction {
    None,
    DeleteAnnotation(usize),
    RemoveImage,
    ExportLabels,
}

/// Display the annotations of `image_path`, in drawing order.
pub fn show(ui: &mut egui::Ui, project: Option<&Project>, image_path: Option<&str>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Annotations");
    ui.separator();

    let (Some(project), Some(image_path)) = (project, image_path) else {
        ui.label(egui::RichText::new("No image selected").weak());
        return action;
    };

    ui.label(egui::RichText::new(image_path).monospace().small());
    ui.add_space(4.0);

    let annotations = project.annotations(image_path);
    if annotations.is_empty() {
        ui.label(egui::RichText::new("No annotations yet").weak());
    }

    egui::ScrollArea::vertical()
        .max_height(ui.available_height() - 60.0)
        .show(ui, |ui| {
            for (index, annotation) in annotations.iter().enumerate() {
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, parse_color(annotation.color()));

                    let name = project.class_name(annotation.class_id()).unwrap_or("?");
                    ui.label(format!("{}. {}", index + 1, name));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("🗑").on_hover_text("Delete annotation").clicked() {
                            action = PropertiesAction::DeleteAnnotation(index);
                        }
                    });
                });

                let bbox = annotation.bbox();
                ui.label(
                    egui::RichText::new(format!(
                        "x {:.3}  y {:.3}  w {:.3}  h {:.3}",
                        bbox.x, bbox.y, bbox.width, bbox.height
                    ))
                    .small()
                    .weak(),
                );

                let placed: Vec<&str> = annotation
                    .keypoints()
                    .iter()
                    .filter(|kp| kp.visible.is_labeled())
                    .map(|kp| project.keypoint_name(&kp.id).unwrap_or("?"))
                    .collect();
                if !placed.is_empty() {
                    ui.label(egui::RichText::new(placed.join(", ")).small());
                }
                ui.separator();
            }
        });

    ui.horizontal(|ui| {
        if ui.button("Export labels").clicked() {
            action = PropertiesAction::ExportLabels;
        }
        if ui.button("Remove image").on_hover_text("Drop this image and its labels from the project").clicked() {
            action = PropertiesAction::RemoveImage;
        }
    });

    action
}
