// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interaction state machine for one image being edited.
//!
//! Pointer events arrive in screen coordinates (relative to the rendered
//! image's top-left corner). The session keeps the in-progress gesture as a
//! single [`Draft`] and only touches the [`ProjectStore`] when a gesture
//! completes: a finished box, the last keypoint of a pose, or a deletion.

use super::modes::{ClickMode, ImageFitMode, InteractionMode};
use super::render;
use crate::models::annotation::{
    Annotation, BoundingBox, DetectionAnnotation, KeypointAnnotation, Point, PoseAnnotation,
};
use crate::models::project::{KeypointDefinition, ModelType, PoseClass};
use crate::models::store::ProjectStore;
use crate::util::geometry::{aspect_locked_end, Size, Transform};

/// Tunables for gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorSettings {
    /// Smallest accepted box edge, in screen pixels.
    pub min_box_size: f64,
    /// Lock zoom rectangles to the canvas aspect ratio.
    pub zoom_aspect_lock: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            min_box_size: 5.0,
            zoom_aspect_lock: true,
        }
    }
}

/// Sequential keypoint placement for a freshly drawn pose box.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointPlacement {
    pub class_id: String,
    pub keypoints: Vec<KeypointDefinition>,
    pub current_index: usize,
    pub base_box: BoundingBox,
    pub points: Vec<KeypointAnnotation>,
}

impl KeypointPlacement {
    fn new(class: &PoseClass, base_box: BoundingBox) -> Self {
        Self {
            class_id: class.id.clone(),
            keypoints: class.keypoints.clone(),
            current_index: 0,
            base_box,
            points: Vec::with_capacity(class.keypoints.len()),
        }
    }

    /// The keypoint the next click places.
    pub fn current(&self) -> Option<&KeypointDefinition> {
        self.keypoints.get(self.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.keypoints.len()
    }
}

/// In-progress gesture. Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Draft {
    #[default]
    None,
    /// Box being drawn, screen coordinates.
    DrawingBox { start: Point, end: Point },
    PlacingKeypoints(KeypointPlacement),
    /// Zoom rectangle being dragged, screen coordinates.
    ZoomBox { start: Point, end: Point },
}

/// The rendered image an event refers to.
#[derive(Debug, Clone, Copy)]
pub struct CanvasTarget<'a> {
    pub project_id: &'a str,
    pub image_path: &'a str,
    pub render_size: Size,
}

/// Raw pointer input, screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button pressed.
    Down(Point),
    Move(Point),
    /// Primary button released.
    Up(Point),
    /// Secondary button click.
    Context(Point),
    Leave,
}

/// What an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing applies in the current state.
    Ignored,
    /// Only the draft changed.
    DraftUpdated,
    /// The gesture finished below the size threshold and was dropped.
    Discarded,
    /// An annotation was added to the store.
    Committed,
    /// The annotation at this index was removed from the store.
    Deleted(usize),
    ViewportChanged,
}

/// Editing state of the canvas: mode selectors, selected class, draft, zoom.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    fit_mode: ImageFitMode,
    click_mode: ClickMode,
    interaction_mode: InteractionMode,
    selected_class: Option<String>,
    draft: Draft,
    viewport: Option<BoundingBox>,
    pointer: Option<Point>,
    settings: EditorSettings,
}

impl EditorSession {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn fit_mode(&self) -> ImageFitMode {
        self.fit_mode
    }

    pub fn click_mode(&self) -> ClickMode {
        self.click_mode
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction_mode
    }

    pub fn selected_class(&self) -> Option<&str> {
        self.selected_class.as_deref()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn viewport(&self) -> Option<BoundingBox> {
        self.viewport
    }

    /// Last known pointer position, screen coordinates.
    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn transform(&self, render_size: Size) -> Transform {
        Transform::new(render_size, self.viewport)
    }

    pub fn is_placing_keypoints(&self) -> bool {
        matches!(self.draft, Draft::PlacingKeypoints(_))
    }

    pub fn select_class(&mut self, class_id: Option<String>) {
        self.selected_class = class_id;
    }

    pub fn set_fit_mode(&mut self, mode: ImageFitMode) {
        if self.fit_mode != mode {
            self.fit_mode = mode;
            self.discard_draft();
        }
    }

    pub fn set_click_mode(&mut self, mode: ClickMode) {
        if self.click_mode != mode {
            self.click_mode = mode;
            self.discard_draft();
        }
    }

    /// Switch gesture family. The zoom viewport is kept.
    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        if self.interaction_mode != mode {
            self.interaction_mode = mode;
            self.discard_draft();
        }
    }

    /// Moving to another image drops the draft and the zoom.
    pub fn navigate(&mut self) {
        self.discard_draft();
        self.viewport = None;
        self.pointer = None;
    }

    pub fn reset_zoom(&mut self) {
        self.viewport = None;
    }

    pub fn pointer_leave(&mut self) {
        self.pointer = None;
    }

    /// Drop the in-progress gesture without committing anything.
    pub fn cancel(&mut self) {
        self.discard_draft();
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(&mut self, store: &mut ProjectStore, target: &CanvasTarget, event: PointerEvent) -> Outcome {
        match event {
            PointerEvent::Down(pos) => self.pointer_down(store, target, pos),
            PointerEvent::Move(pos) => self.pointer_move(target, pos),
            PointerEvent::Up(pos) => self.pointer_up(store, target, pos),
            PointerEvent::Context(pos) => self.context_action(store, target, pos),
            PointerEvent::Leave => {
                self.pointer_leave();
                Outcome::Ignored
            }
        }
    }

    fn discard_draft(&mut self) {
        if self.draft != Draft::None {
            log::debug!("Discarding in-progress gesture");
            self.draft = Draft::None;
        }
    }

    /// Primary button pressed.
    pub fn pointer_down(&mut self, store: &mut ProjectStore, target: &CanvasTarget, pos: Point) -> Outcome {
        self.pointer = Some(pos);

        match self.interaction_mode {
            InteractionMode::Edit => Outcome::Ignored,
            InteractionMode::Zoom => {
                self.draft = Draft::ZoomBox { start: pos, end: pos };
                Outcome::DraftUpdated
            }
            InteractionMode::Create => {
                if self.is_placing_keypoints() {
                    return self.place_keypoint(store, target, Some(pos));
                }

                let Some(class_id) = self.selected_class.clone() else {
                    log::debug!("No class selected, ignoring pointer down");
                    return Outcome::Ignored;
                };

                if self.click_mode == ClickMode::Click {
                    if let Draft::DrawingBox { start, .. } = self.draft {
                        // second click closes the box
                        self.draft = Draft::None;
                        return self.finish_box(store, target, &class_id, start, pos);
                    }
                }

                self.draft = Draft::DrawingBox { start: pos, end: pos };
                Outcome::DraftUpdated
            }
        }
    }

    pub fn pointer_move(&mut self, target: &CanvasTarget, pos: Point) -> Outcome {
        self.pointer = Some(pos);

        let lock = self.settings.zoom_aspect_lock;
        match &mut self.draft {
            Draft::DrawingBox { end, .. } => {
                *end = pos;
                Outcome::DraftUpdated
            }
            Draft::ZoomBox { start, end } => {
                *end = if lock {
                    aspect_locked_end(*start, pos, target.render_size.aspect())
                } else {
                    pos
                };
                Outcome::DraftUpdated
            }
            _ => Outcome::Ignored,
        }
    }

    /// Primary button released.
    pub fn pointer_up(&mut self, store: &mut ProjectStore, target: &CanvasTarget, pos: Point) -> Outcome {
        self.pointer = Some(pos);

        match (self.interaction_mode, std::mem::take(&mut self.draft)) {
            (InteractionMode::Create, Draft::DrawingBox { start, .. }) if self.click_mode == ClickMode::Drag => {
                match self.selected_class.clone() {
                    Some(class_id) => self.finish_box(store, target, &class_id, start, pos),
                    None => Outcome::Discarded,
                }
            }
            (InteractionMode::Zoom, Draft::ZoomBox { start, .. }) => {
                let end = if self.settings.zoom_aspect_lock {
                    aspect_locked_end(start, pos, target.render_size.aspect())
                } else {
                    pos
                };
                self.finish_zoom(target, start, end)
            }
            (_, other) => {
                self.draft = other;
                Outcome::Ignored
            }
        }
    }

    /// Secondary button (context) click.
    pub fn context_action(&mut self, store: &mut ProjectStore, target: &CanvasTarget, pos: Point) -> Outcome {
        self.pointer = Some(pos);

        match self.interaction_mode {
            InteractionMode::Edit => Outcome::Ignored,
            InteractionMode::Zoom => {
                self.draft = Draft::None;
                if self.viewport.take().is_some() {
                    log::debug!("Zoom reset");
                    Outcome::ViewportChanged
                } else {
                    Outcome::Ignored
                }
            }
            InteractionMode::Create => {
                if self.is_placing_keypoints() {
                    self.place_keypoint(store, target, None)
                } else {
                    self.delete_at(store, target, pos)
                }
            }
        }
    }

    fn finish_box(
        &mut self,
        store: &mut ProjectStore,
        target: &CanvasTarget,
        class_id: &str,
        start: Point,
        end: Point,
    ) -> Outcome {
        let screen = visible_box(start, end, target.render_size);
        let min = self.settings.min_box_size;
        if screen.width < min || screen.height < min {
            log::debug!("Box {:.1}x{:.1} below threshold, discarded", screen.width, screen.height);
            return Outcome::Discarded;
        }

        let Some(project) = store.project(target.project_id) else {
            return Outcome::Ignored;
        };
        if !project.has_class(class_id) {
            log::warn!("Selected class {} no longer exists", class_id);
            return Outcome::Discarded;
        }

        let bbox = self.transform(target.render_size).box_to_normalized(screen).clamp_unit();

        match project.model_type() {
            ModelType::Detection => {
                let annotation = Annotation::Detection(DetectionAnnotation {
                    class_id: class_id.to_string(),
                    color: store.next_color(target.project_id, target.image_path),
                    bbox,
                });
                commit(store, target, annotation)
            }
            ModelType::Pose => {
                let Some(class) = project.pose_class(class_id) else {
                    return Outcome::Discarded;
                };
                let placement = KeypointPlacement::new(class, bbox);
                if placement.is_complete() {
                    // no keypoints defined, nothing to place
                    return self.commit_pose(store, target, placement);
                }

                log::debug!("Placing {} keypoints for class {}", placement.keypoints.len(), class.name);
                self.draft = Draft::PlacingKeypoints(placement);
                Outcome::DraftUpdated
            }
        }
    }

    /// Place the current keypoint at `pos`, or skip it when `pos` is `None`.
    fn place_keypoint(&mut self, store: &mut ProjectStore, target: &CanvasTarget, pos: Option<Point>) -> Outcome {
        let transform = self.transform(target.render_size);
        let Draft::PlacingKeypoints(placement) = &mut self.draft else {
            return Outcome::Ignored;
        };
        let Some(def) = placement.current() else {
            return Outcome::Ignored;
        };

        let keypoint = match pos {
            Some(screen) => {
                let at = transform.to_normalized(screen);
                KeypointAnnotation::placed(def.id.clone(), Point::new(at.x.clamp(0.0, 1.0), at.y.clamp(0.0, 1.0)))
            }
            None => KeypointAnnotation::skipped(def.id.clone()),
        };
        placement.points.push(keypoint);
        placement.current_index += 1;

        if !placement.is_complete() {
            return Outcome::DraftUpdated;
        }

        match std::mem::take(&mut self.draft) {
            Draft::PlacingKeypoints(placement) => self.commit_pose(store, target, placement),
            _ => Outcome::Ignored,
        }
    }

    fn commit_pose(&mut self, store: &mut ProjectStore, target: &CanvasTarget, placement: KeypointPlacement) -> Outcome {
        let annotation = Annotation::Pose(PoseAnnotation {
            class_id: placement.class_id,
            color: store.next_color(target.project_id, target.image_path),
            bbox: placement.base_box,
            keypoints: placement.points,
        });
        commit(store, target, annotation)
    }

    fn finish_zoom(&mut self, target: &CanvasTarget, start: Point, end: Point) -> Outcome {
        let screen = visible_box(start, end, target.render_size);
        let min = self.settings.min_box_size;
        if screen.width < min || screen.height < min {
            return Outcome::Discarded;
        }

        // Interpreted through the current transform, so zooms nest.
        let viewport = self.transform(target.render_size).box_to_normalized(screen).clamp_unit();
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return Outcome::Discarded;
        }

        log::debug!(
            "Zoom viewport ({:.3}, {:.3}) {:.3}x{:.3}",
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height
        );
        self.viewport = Some(viewport);
        Outcome::ViewportChanged
    }

    fn delete_at(&mut self, store: &mut ProjectStore, target: &CanvasTarget, pos: Point) -> Outcome {
        let Some(project) = store.project(target.project_id) else {
            return Outcome::Ignored;
        };

        let transform = self.transform(target.render_size);
        match render::hit_test(&project, target.image_path, &transform, pos) {
            Some(index) => {
                store.delete_annotation_by_index(target.project_id, target.image_path, index);
                Outcome::Deleted(index)
            }
            None => Outcome::Ignored,
        }
    }
}

/// Screen rectangle spanned by two corners, cut to the rendered area.
///
/// A gesture released outside the image only covers what is visible, so
/// the size threshold applies to the part that would be stored.
fn visible_box(a: Point, b: Point, render_size: Size) -> BoundingBox {
    let clamp = |p: Point| Point::new(p.x.clamp(0.0, render_size.width), p.y.clamp(0.0, render_size.height));
    BoundingBox::from_corners(clamp(a), clamp(b))
}

fn commit(store: &mut ProjectStore, target: &CanvasTarget, annotation: Annotation) -> Outcome {
    match store.add_annotation(target.project_id, target.image_path, annotation) {
        Some(_) => Outcome::Committed,
        None => Outcome::Ignored,
    }
}
