// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Independent mode selectors for the canvas.

use serde::{Deserialize, Serialize};

pub use crate::util::geometry::ImageFitMode;

/// How a bounding box is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    /// Press, drag, release.
    #[default]
    Drag,
    /// Click one corner, then the opposite corner.
    Click,
}

/// Which gesture family the primary button drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Draw boxes, place keypoints, right-click to delete.
    #[default]
    Create,
    /// Reserved for moving existing boxes and keypoints; pointer input is ignored.
    Edit,
    /// Drag a rectangle to zoom in, right-click to reset.
    Zoom,
}

impl InteractionMode {
    pub fn description(self) -> &'static str {
        match self {
            InteractionMode::Create => "Draw boxes or place keypoints, right-click to delete or skip",
            InteractionMode::Edit => "Editing existing annotations is not available yet",
            InteractionMode::Zoom => "Drag to zoom in, right-click to zoom out",
        }
    }
}
