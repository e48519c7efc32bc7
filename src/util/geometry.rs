// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! Three coordinate spaces meet on the canvas:
//!
//! - normalized: fractions of the image extent, what annotations store;
//! - image: pixels of the unzoomed rendered image (`normalized * render_size`);
//! - screen: pixels on the canvas once the viewport (zoom window) is applied.
//!
//! Without a viewport, image and screen space coincide.

use crate::models::annotation::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// How the image is laid out inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFitMode {
    /// Preserve aspect ratio and fit on the constrained axis.
    #[default]
    Fit,
    /// Fill the container, distorting the aspect ratio.
    Stretch,
}

/// Normalize a value from [0, extent] to [0, 1]. `extent` must be positive.
pub fn normalize(value: f64, extent: f64) -> f64 {
    value / extent
}

/// Denormalize a value from [0, 1] to [0, extent].
pub fn denormalize(value: f64, extent: f64) -> f64 {
    value * extent
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
pub fn normalize_point(point: Point, size: Size) -> Point {
    Point::new(normalize(point.x, size.width), normalize(point.y, size.height))
}

/// Convert normalized coordinates to pixel coordinates.
pub fn denormalize_point(point: Point, size: Size) -> Point {
    Point::new(denormalize(point.x, size.width), denormalize(point.y, size.height))
}

/// Project image-space coordinates onto the screen.
///
/// `viewport` is given in image space; the visible viewport rectangle is
/// stretched over the whole render area.
pub fn image_to_screen(x: f64, y: f64, render_size: Size, viewport: Option<BoundingBox>) -> Point {
    let Some(vp) = viewport else {
        return Point::new(x, y);
    };
    let scale_x = render_size.width / vp.width;
    let scale_y = render_size.height / vp.height;
    Point::new((x - vp.x) * scale_x, (y - vp.y) * scale_y)
}

/// Inverse of [`image_to_screen`].
pub fn screen_to_image(x: f64, y: f64, render_size: Size, viewport: Option<BoundingBox>) -> Point {
    let Some(vp) = viewport else {
        return Point::new(x, y);
    };
    let scale_x = render_size.width / vp.width;
    let scale_y = render_size.height / vp.height;
    Point::new(x / scale_x + vp.x, y / scale_y + vp.y)
}

/// Size of the displayed image inside a container.
pub fn compute_render_size(container: Size, image_size: Size, mode: ImageFitMode) -> Size {
    match mode {
        ImageFitMode::Stretch => container,
        ImageFitMode::Fit => {
            let img_aspect = image_size.aspect();
            if img_aspect > container.aspect() {
                // Image is wider - fit to width
                Size::new(container.width, container.width / img_aspect)
            } else {
                // Image is taller - fit to height
                Size::new(container.height * img_aspect, container.height)
            }
        }
    }
}

/// Move `end` so the rectangle from `start` matches `aspect` (width / height).
///
/// The dominant axis keeps its length, the other one is extended. The
/// drag direction on each axis is preserved.
pub fn aspect_locked_end(start: Point, end: Point, aspect: f64) -> Point {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let sign = |v: f64| if v < 0.0 { -1.0 } else { 1.0 };

    if dx.abs() >= dy.abs() * aspect {
        Point::new(end.x, start.y + sign(dy) * dx.abs() / aspect)
    } else {
        Point::new(start.x + sign(dx) * dy.abs() * aspect, end.y)
    }
}

/// The full normalized -> screen mapping for one rendered frame.
///
/// The viewport is kept normalized so it survives container resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub render_size: Size,
    pub viewport: Option<BoundingBox>,
}

impl Transform {
    pub fn new(render_size: Size, viewport: Option<BoundingBox>) -> Self {
        Self { render_size, viewport }
    }

    fn image_viewport(&self) -> Option<BoundingBox> {
        self.viewport.map(|vp| {
            let min = denormalize_point(vp.min(), self.render_size);
            BoundingBox::new(
                min.x,
                min.y,
                denormalize(vp.width, self.render_size.width),
                denormalize(vp.height, self.render_size.height),
            )
        })
    }

    pub fn to_screen(&self, normalized: Point) -> Point {
        let image = denormalize_point(normalized, self.render_size);
        image_to_screen(image.x, image.y, self.render_size, self.image_viewport())
    }

    pub fn to_normalized(&self, screen: Point) -> Point {
        let image = screen_to_image(screen.x, screen.y, self.render_size, self.image_viewport());
        normalize_point(image, self.render_size)
    }

    pub fn box_to_screen(&self, normalized: BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(self.to_screen(normalized.min()), self.to_screen(normalized.max()))
    }

    pub fn box_to_normalized(&self, screen: BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(self.to_normalized(screen.min()), self.to_normalized(screen.max()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_normalize_denormalize_roundtrip() {
        for extent in [1.0, 150.0, 1920.0] {
            for step in 0..=10 {
                let v = extent * step as f64 / 10.0;
                assert!((denormalize(normalize(v, extent), extent) - v).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_normalize_corners() {
        let size = Size::new(1920.0, 1080.0);
        assert_eq!(normalize_point(Point::new(0.0, 0.0), size), Point::new(0.0, 0.0));
        assert_eq!(normalize_point(Point::new(1920.0, 1080.0), size), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_image_to_screen_identity_without_viewport() {
        let p = image_to_screen(12.5, 40.0, Size::new(200.0, 150.0), None);
        assert_eq!(p, Point::new(12.5, 40.0));
    }

    #[test]
    fn test_viewport_fills_render_area() {
        let render = Size::new(200.0, 100.0);
        let vp = Some(BoundingBox::new(50.0, 25.0, 100.0, 50.0));
        assert!(close(image_to_screen(50.0, 25.0, render, vp), Point::new(0.0, 0.0)));
        assert!(close(image_to_screen(150.0, 75.0, render, vp), Point::new(200.0, 100.0)));
    }

    #[test]
    fn test_screen_image_roundtrip_with_viewports() {
        let render = Size::new(320.0, 240.0);
        let viewports = [
            None,
            Some(BoundingBox::new(0.0, 0.0, 320.0, 240.0)),
            Some(BoundingBox::new(10.0, 20.0, 50.0, 30.0)),
            Some(BoundingBox::new(300.0, 200.0, 3.5, 1.25)),
        ];
        for vp in viewports {
            for (x, y) in [(0.0, 0.0), (17.0, 230.0), (320.0, 240.0), (159.3, 0.7)] {
                let screen = image_to_screen(x, y, render, vp);
                let back = screen_to_image(screen.x, screen.y, render, vp);
                assert!(close(back, Point::new(x, y)), "{:?} -> {:?}", (x, y), back);
            }
        }
    }

    #[test]
    fn test_full_transform_roundtrip() {
        let transform = Transform::new(
            Size::new(640.0, 480.0),
            Some(BoundingBox::new(0.25, 0.1, 0.5, 0.3)),
        );
        for p in [Point::new(0.0, 0.0), Point::new(0.3, 0.2), Point::new(1.0, 1.0)] {
            assert!(close(transform.to_normalized(transform.to_screen(p)), p));
        }
    }

    #[test]
    fn test_transform_maps_viewport_corner_to_origin() {
        let transform = Transform::new(
            Size::new(200.0, 100.0),
            Some(BoundingBox::new(0.5, 0.5, 0.5, 0.5)),
        );
        assert!(close(transform.to_screen(Point::new(0.5, 0.5)), Point::new(0.0, 0.0)));
        assert!(close(transform.to_screen(Point::new(1.0, 1.0)), Point::new(200.0, 100.0)));
    }

    #[test]
    fn test_fit_mode_preserves_aspect() {
        let container = Size::new(800.0, 600.0);

        let wide = compute_render_size(container, Size::new(1920.0, 1080.0), ImageFitMode::Fit);
        assert!((wide.width - 800.0).abs() < EPS);
        assert!((wide.height - 450.0).abs() < EPS);

        let tall = compute_render_size(container, Size::new(1000.0, 2000.0), ImageFitMode::Fit);
        assert!((tall.width - 300.0).abs() < EPS);
        assert!((tall.height - 600.0).abs() < EPS);
    }

    #[test]
    fn test_stretch_mode_fills_container() {
        let container = Size::new(800.0, 600.0);
        let size = compute_render_size(container, Size::new(1920.0, 1080.0), ImageFitMode::Stretch);
        assert_eq!(size, container);
    }

    #[test]
    fn test_aspect_lock_extends_minor_axis() {
        // 2:1 canvas, drag mostly horizontal
        let end = aspect_locked_end(Point::new(0.0, 0.0), Point::new(100.0, 10.0), 2.0);
        assert!(close(end, Point::new(100.0, 50.0)));

        // drag mostly vertical, up and to the left
        let end = aspect_locked_end(Point::new(100.0, 100.0), Point::new(90.0, 40.0), 2.0);
        assert!(close(end, Point::new(-20.0, 40.0)));
    }
}
