// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Random identifiers for projects, classes and keypoint definitions.

use rand::distributions::Alphanumeric;
use rand::Rng;

const ID_LENGTH: usize = 21;

/// Generate a URL-safe random identifier.
pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}
