// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene building and hit-testing.
//!
//! [`build_scene`] is a pure function of the project, the image and the
//! editing session. It returns drawing primitives in screen coordinates
//! (relative to the rendered image's top-left corner) and never touches
//! the store.

use super::modes::InteractionMode;
use super::session::{Draft, EditorSession};
use crate::models::annotation::{BoundingBox, LabeledBox, Point};
use crate::models::project::Project;
use crate::util::geometry::{Size, Transform};

pub const DRAFT_BOX_COLOR: &str = "#3b82f6";
pub const PLACEMENT_COLOR: &str = "#84cc16";
pub const KEYPOINT_COLOR: &str = "#22d3ee";
pub const LABEL_COLOR: &str = "#ffffff";
pub const GUIDE_COLOR: &str = "#ffffffbf";
pub const CURSOR_LABEL_COLOR: &str = "#facc15";

/// Label shown for annotations whose class was deleted.
pub const UNKNOWN_CLASS: &str = "?";

const KEYPOINT_RADIUS: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    Solid,
    Dashed,
}

/// One drawable element, screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// The image itself; may extend past the render area when zoomed.
    Image { rect: BoundingBox },
    Rect {
        rect: BoundingBox,
        color: String,
        width: f32,
        style: StrokeStyle,
    },
    /// Text anchored at its top-left corner.
    Text {
        pos: Point,
        text: String,
        size: f32,
        color: String,
    },
    Marker {
        center: Point,
        radius: f32,
        color: String,
    },
    Line {
        from: Point,
        to: Point,
        color: String,
        style: StrokeStyle,
    },
}

/// Derive everything to draw for one frame.
pub fn build_scene(project: &Project, image_path: &str, session: &EditorSession, render_size: Size) -> Vec<Primitive> {
    let transform = session.transform(render_size);
    let mut scene = vec![Primitive::Image {
        rect: transform.box_to_screen(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
    }];

    for annotation in project.annotations(image_path) {
        push_annotation(&mut scene, project, annotation, &transform);
    }

    match session.draft() {
        Draft::None => {}
        Draft::DrawingBox { start, end } => {
            let end = session.pointer().unwrap_or(*end);
            scene.push(Primitive::Rect {
                rect: BoundingBox::from_corners(*start, end),
                color: DRAFT_BOX_COLOR.to_string(),
                width: 1.0,
                style: StrokeStyle::Dashed,
            });
        }
        Draft::ZoomBox { start, end } => {
            scene.push(Primitive::Rect {
                rect: BoundingBox::from_corners(*start, *end),
                color: DRAFT_BOX_COLOR.to_string(),
                width: 1.0,
                style: StrokeStyle::Dashed,
            });
        }
        Draft::PlacingKeypoints(placement) => {
            scene.push(Primitive::Rect {
                rect: transform.box_to_screen(placement.base_box),
                color: PLACEMENT_COLOR.to_string(),
                width: 2.0,
                style: StrokeStyle::Dashed,
            });
            for kp in placement.points.iter().filter(|kp| kp.visible.is_labeled()) {
                scene.push(Primitive::Marker {
                    center: transform.to_screen(kp.position()),
                    radius: KEYPOINT_RADIUS,
                    color: PLACEMENT_COLOR.to_string(),
                });
            }
        }
    }

    if let Some(pointer) = session.pointer() {
        push_guides(&mut scene, project, session, pointer, render_size);
    }

    scene
}

fn push_annotation(scene: &mut Vec<Primitive>, project: &Project, annotation: &dyn LabeledBox, transform: &Transform) {
    let rect = transform.box_to_screen(annotation.bbox());
    scene.push(Primitive::Rect {
        rect,
        color: annotation.color().to_string(),
        width: 2.0,
        style: StrokeStyle::Solid,
    });
    scene.push(Primitive::Text {
        pos: Point::new(rect.x, rect.y - 18.0),
        text: project.class_name(annotation.class_id()).unwrap_or(UNKNOWN_CLASS).to_string(),
        size: 14.0,
        color: LABEL_COLOR.to_string(),
    });

    let class = project.pose_class(annotation.class_id());
    for kp in annotation.keypoints().iter().filter(|kp| kp.visible.is_labeled()) {
        let center = transform.to_screen(kp.position());
        let name = class
            .and_then(|c| c.keypoints.iter().find(|def| def.id == kp.id))
            .map(|def| def.name.as_str())
            .unwrap_or(kp.id.as_str());

        scene.push(Primitive::Marker {
            center,
            radius: KEYPOINT_RADIUS,
            color: KEYPOINT_COLOR.to_string(),
        });
        scene.push(Primitive::Text {
            pos: Point::new(center.x + 5.0, center.y - 14.0),
            text: name.to_string(),
            size: 10.0,
            color: LABEL_COLOR.to_string(),
        });
    }
}

/// Crosshair through the pointer plus the floating hint label.
fn push_guides(scene: &mut Vec<Primitive>, project: &Project, session: &EditorSession, pointer: Point, render_size: Size) {
    scene.push(Primitive::Line {
        from: Point::new(0.0, pointer.y),
        to: Point::new(render_size.width, pointer.y),
        color: GUIDE_COLOR.to_string(),
        style: StrokeStyle::Dashed,
    });
    scene.push(Primitive::Line {
        from: Point::new(pointer.x, 0.0),
        to: Point::new(pointer.x, render_size.height),
        color: GUIDE_COLOR.to_string(),
        style: StrokeStyle::Dashed,
    });

    let hint = match session.draft() {
        Draft::PlacingKeypoints(placement) => placement.current().map(|kp| kp.name.as_str()),
        _ if session.interaction_mode() == InteractionMode::Create => {
            session.selected_class().and_then(|id| project.class_name(id))
        }
        _ => None,
    };

    if let Some(text) = hint {
        scene.push(Primitive::Text {
            pos: Point::new(pointer.x + 7.5, pointer.y - 20.0),
            text: text.to_string(),
            size: 16.0,
            color: CURSOR_LABEL_COLOR.to_string(),
        });
    }
}

/// Index of the topmost annotation whose box contains `pos` (screen coordinates).
///
/// Later annotations are drawn on top, so the list is searched back to front.
pub fn hit_test(project: &Project, image_path: &str, transform: &Transform, pos: Point) -> Option<usize> {
    project
        .annotations(image_path)
        .iter()
        .enumerate()
        .rev()
        .find(|(_, ann)| transform.box_to_screen(ann.bbox()).contains(pos))
        .map(|(index, _)| index)
}
