// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations, projects and the project store.

pub mod annotation;
pub mod project;
pub mod store;
