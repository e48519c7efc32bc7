// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation canvas engine.
//!
//! The editor turns pointer input into annotation store mutations
//! (`session`) and derives what to draw from the store and the in-progress
//! gesture (`render`). It knows nothing about egui; `ui::canvas` adapts it.

pub mod modes;
pub mod render;
pub mod session;
