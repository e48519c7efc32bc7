// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and annotation.
//!
//! This module lays the image out inside the central panel, paints the
//! scene produced by the editor and translates egui pointer input into
//! editor pointer events. It does not mutate any state itself.

use crate::editor::render::{self, Primitive, StrokeStyle};
use crate::editor::session::{Draft, EditorSession, PointerEvent};
use crate::models::annotation::{BoundingBox, Point};
use crate::models::project::Project;
use crate::util::geometry::{compute_render_size, Size};

/// Result of canvas interaction.
#[derive(Default)]
pub struct CanvasResponse {
    /// Pointer events in screen coordinates, in arrival order.
    pub events: Vec<PointerEvent>,
    /// Size of the rendered image, known once an image is displayed.
    pub render_size: Option<Size>,
}

/// What the canvas should display.
pub struct CanvasImage<'a> {
    pub project: &'a Project,
    pub image_path: &'a str,
    pub texture: &'a egui::TextureHandle,
    pub size: (u32, u32),
}

/// Display the main canvas area and collect pointer input.
pub fn show(ui: &mut egui::Ui, image: Option<CanvasImage<'_>>, session: &EditorSession) -> CanvasResponse {
    let mut result = CanvasResponse::default();
    // Set background color
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size() - egui::vec2(0.0, 24.0);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let Some(image) = image else {
            show_placeholder(ui);
            return;
        };

        let container = Size::new(available_size.x as f64, available_size.y as f64);
        let image_size = Size::new(image.size.0 as f64, image.size.1 as f64);
        if container.is_empty() || image_size.is_empty() {
            return;
        }
        let render_size = compute_render_size(container, image_size, session.fit_mode());
        result.render_size = Some(render_size);

        // Center the image
        let x_offset = (available_size.x - render_size.width as f32) / 2.0;
        let y_offset = (available_size.y - render_size.height as f32) / 2.0;
        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(render_size.width as f32, render_size.height as f32),
        );

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        result.events = collect_events(ui, &response, image_rect, session);
        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }

        let painter = ui.painter_at(image_rect);
        let scene = render::build_scene(image.project, image.image_path, session, render_size);
        for primitive in &scene {
            paint(&painter, image_rect.min, image.texture, primitive);
        }
    });

    // Display editing state at the bottom
    ui.horizontal(|ui| {
        ui.label(format!("Mode: {:?}", session.interaction_mode()));
        ui.separator();
        ui.label(format!("Boxes: {:?}", session.click_mode()));
        ui.separator();
        match session.viewport() {
            Some(vp) => ui.label(format!("Zoom: {:.1}x", 1.0 / vp.width.max(vp.height))),
            None => ui.label("Zoom: 1.0x"),
        };
        if let Draft::PlacingKeypoints(placement) = session.draft() {
            ui.separator();
            ui.label(format!(
                "Keypoint {}/{} (right-click to skip)",
                placement.current_index + 1,
                placement.keypoints.len()
            ));
        }
    });

    result
}

fn show_placeholder(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("Ovara")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Bounding box and keypoint annotation")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Select a project and an image folder to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
        });
    });
}

/// Translate this frame's pointer input into editor events.
fn collect_events(
    ui: &egui::Ui,
    response: &egui::Response,
    image_rect: egui::Rect,
    session: &EditorSession,
) -> Vec<PointerEvent> {
    let to_local = |pos: egui::Pos2| Point::new((pos.x - image_rect.min.x) as f64, (pos.y - image_rect.min.y) as f64);
    let (latest, pressed, released) = ui.input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.primary_pressed(),
            i.pointer.primary_released(),
        )
    });

    let mut events = Vec::new();
    let active = response.hovered() || response.dragged();

    match latest.filter(|_| active).map(to_local) {
        Some(pos) => {
            if session.pointer() != Some(pos) {
                events.push(PointerEvent::Move(pos));
            }
            if pressed && response.hovered() {
                events.push(PointerEvent::Down(pos));
            }
            if released {
                events.push(PointerEvent::Up(pos));
            }
            if response.secondary_clicked() {
                events.push(PointerEvent::Context(pos));
            }
        }
        None => {
            // a drag released outside the image still finishes the gesture
            if released {
                if let Some(pos) = latest {
                    events.push(PointerEvent::Up(to_local(pos)));
                }
            }
            if session.pointer().is_some() {
                events.push(PointerEvent::Leave);
            }
        }
    }

    events
}

fn to_screen_rect(origin: egui::Pos2, rect: BoundingBox) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.width as f32, rect.height as f32),
    )
}

fn to_screen_pos(origin: egui::Pos2, point: Point) -> egui::Pos2 {
    origin + egui::vec2(point.x as f32, point.y as f32)
}

/// Parse `#rrggbb` or `#rrggbbaa`; anything else paints white.
pub fn parse_color(hex: &str) -> egui::Color32 {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| digits.get(i..i + 2).and_then(|s| u8::from_str_radix(s, 16).ok());

    match (digits.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => egui::Color32::from_rgb(r, g, b),
        (8, Some(r), Some(g), Some(b)) => {
            let a = channel(6).unwrap_or(255);
            egui::Color32::from_rgba_unmultiplied(r, g, b, a)
        }
        _ => egui::Color32::WHITE,
    }
}

fn paint(painter: &egui::Painter, origin: egui::Pos2, texture: &egui::TextureHandle, primitive: &Primitive) {
    match primitive {
        Primitive::Image { rect } => {
            painter.image(
                texture.id(),
                to_screen_rect(origin, *rect),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        Primitive::Rect { rect, color, width, style } => {
            let r = to_screen_rect(origin, *rect);
            let stroke = egui::Stroke::new(*width, parse_color(color));
            match style {
                StrokeStyle::Solid => {
                    painter.rect_stroke(r, 0.0, stroke);
                }
                StrokeStyle::Dashed => {
                    let outline = [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom(), r.left_top()];
                    painter.extend(egui::Shape::dashed_line(&outline, stroke, 4.0, 2.0));
                }
            }
        }
        Primitive::Text { pos, text, size, color } => {
            painter.text(
                to_screen_pos(origin, *pos),
                egui::Align2::LEFT_TOP,
                text,
                egui::FontId::proportional(*size),
                parse_color(color),
            );
        }
        Primitive::Marker { center, radius, color } => {
            let c = to_screen_pos(origin, *center);
            painter.circle_filled(c, *radius, parse_color(color));
            painter.circle_stroke(c, *radius, egui::Stroke::new(1.0, egui::Color32::BLACK));
        }
        Primitive::Line { from, to, color, style } => {
            let points = [to_screen_pos(origin, *from), to_screen_pos(origin, *to)];
            let stroke = egui::Stroke::new(1.0, parse_color(color));
            match style {
                StrokeStyle::Solid => {
                    painter.line_segment(points, stroke);
                }
                StrokeStyle::Dashed => {
                    painter.extend(egui::Shape::dashed_line(&points, stroke, 4.0, 4.0));
                }
            }
        }
    }
}
