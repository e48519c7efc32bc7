// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image file discovery and loading.
//!
//! This module enumerates the images of a project directory and decodes
//! them into RGBA pixels suitable for display in egui.

use anyhow::{Context, Result};
use std::path::Path;

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

/// A decoded image ready to become a texture.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Check the extension against [`IMAGE_EXTENSIONS`], ignoring case.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List the images directly inside `dir`, sorted by path.
pub fn list_images(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read image directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path.to_string_lossy().to_string());
        }
    }
    paths.sort();

    log::info!("Found {} images in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Decode an image file into RGBA8 pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        anyhow::bail!("Image {} has no pixels", path.display());
    }

    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("/a/b.PNG")));
        assert!(is_image_file(Path::new("c.jpeg")));
        assert!(!is_image_file(Path::new("labels.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.jpg", "classes.txt", "c.webp"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let images = list_images(dir.path()).unwrap();
        let names: Vec<String> = images
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.webp"]);
    }

    #[test]
    fn test_list_images_missing_dir() {
        let dir = tempdir().unwrap();
        let result = list_images(&dir.path().join("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_image_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        image::RgbaImage::from_pixel(4, 3, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert_eq!(loaded.pixels.len(), 4 * 3 * 4);
    }

    #[test]
    fn test_load_image_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"not an image").unwrap();
        assert!(load_image(&path).is_err());
    }
}
