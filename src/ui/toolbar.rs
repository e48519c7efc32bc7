// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with the canvas mode selectors.
//!
//! Image fit, box drawing style and interaction mode are independent
//! selectors; changing any of them drops the gesture in progress.

use crate::editor::modes::{ClickMode, ImageFitMode, InteractionMode};
use crate::editor::session::EditorSession;

/// Display the toolbar and apply mode changes to the session.
pub fn show(ui: &mut egui::Ui, session: &mut EditorSession) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Image:");
        let fit = session.fit_mode();
        if ui.selectable_label(fit == ImageFitMode::Fit, "⛶ Fit").clicked() {
            session.set_fit_mode(ImageFitMode::Fit);
        }
        if ui.selectable_label(fit == ImageFitMode::Stretch, "↔ Stretch").clicked() {
            session.set_fit_mode(ImageFitMode::Stretch);
        }

        ui.separator();

        ui.label("Boxes:");
        let click = session.click_mode();
        if ui.selectable_label(click == ClickMode::Drag, "Drag").clicked() {
            session.set_click_mode(ClickMode::Drag);
        }
        if ui.selectable_label(click == ClickMode::Click, "Two clicks").clicked() {
            session.set_click_mode(ClickMode::Click);
        }

        ui.separator();

        ui.label("Tools:");
        let mode = session.interaction_mode();
        if ui.selectable_label(mode == InteractionMode::Create, "✏ Create").clicked() {
            session.set_interaction_mode(InteractionMode::Create);
        }
        if ui.selectable_label(mode == InteractionMode::Edit, "✥ Edit").clicked() {
            session.set_interaction_mode(InteractionMode::Edit);
        }
        if ui.selectable_label(mode == InteractionMode::Zoom, "🔍 Zoom").clicked() {
            session.set_interaction_mode(InteractionMode::Zoom);
        }
        if ui.add_enabled(session.viewport().is_some(), egui::Button::new("Reset zoom")).clicked() {
            session.reset_zoom();
        }

        ui.separator();

        // Tool description
        ui.label(egui::RichText::new(session.interaction_mode().description()).italics().weak());
    });
}
