// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! `OvaraApp` owns the project store and the editor session, routes panel
//! actions and canvas pointer events into them, loads images on a
//! background thread and writes the store back to disk whenever it changes.

use crate::config::AppConfig;
use crate::editor::modes::ImageFitMode;
use crate::editor::session::{CanvasTarget, EditorSession, Outcome};
use crate::io::{export, media, serialization};
use crate::models::project::{DetectionClass, KeypointDefinition, ModelType, PoseClass, Project};
use crate::models::store::ProjectStore;
use crate::ui::sidebar::{SidebarAction, SidebarForms};
use crate::ui::{canvas, properties, sidebar, toolbar};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;

/// Result of background image loading operation.
struct LoadedImageData {
    path: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A decode that failed, tagged with the image it was for.
struct ImageLoadError {
    path: String,
    message: String,
}

/// Main application state.
pub struct OvaraApp {
    config: AppConfig,

    store: ProjectStore,

    /// Store revision last written to `config.state_file`
    saved_revision: u64,

    /// Id of the project being annotated
    active_project: Option<String>,

    /// Position in the active project's image list
    image_index: usize,

    session: EditorSession,

    /// Loaded image texture for display
    image_texture: Option<egui::TextureHandle>,

    /// Image dimensions (width, height)
    image_size: Option<(u32, u32)>,

    /// Image path the texture was decoded from
    loaded_path: Option<String>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedImageData, ImageLoadError>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last notable event shown in the status bar
    status: Option<String>,

    forms: SidebarForms,
}

impl OvaraApp {
    /// Create the application and load the persisted projects.
    pub fn new(config: AppConfig) -> Self {
        let mut store = ProjectStore::with_palette(config.palette.clone());
        let mut status = None;

        match serialization::load_projects(&config.state_file) {
            Ok(projects) => {
                log::info!("Loaded {} projects from {}", projects.len(), config.state_file.display());
                store.replace_all(projects);
            }
            Err(e) => {
                log::error!("Failed to load projects: {:#}", e);
                status = Some(format!("Could not load {}: {}", config.state_file.display(), e));
            }
        }

        let mut session = EditorSession::new(config.editor_settings());
        session.set_click_mode(config.click_mode);
        session.set_fit_mode(config.image_fit_mode);

        Self {
            saved_revision: store.revision(),
            config,
            store,
            active_project: None,
            image_index: 0,
            session,
            image_texture: None,
            image_size: None,
            loaded_path: None,
            image_loader: None,
            loading_message: None,
            status,
            forms: SidebarForms::default(),
        }
    }

    fn project(&self) -> Option<Arc<Project>> {
        self.active_project.as_deref().and_then(|id| self.store.project(id))
    }

    fn current_image_path(&self) -> Option<String> {
        self.project()?.image_paths.get(self.image_index).cloned()
    }

    fn open_project(&mut self, id: String) {
        if self.active_project.as_deref() == Some(id.as_str()) {
            return;
        }
        log::info!("Opening project {}", id);
        self.active_project = Some(id.clone());
        self.image_index = 0;
        self.session.select_class(None);
        self.session.navigate();
        self.clear_image();

        // Pick up files added to or removed from the folder since last time.
        let Some(project) = self.store.project(&id) else {
            return;
        };
        if project.image_dir.as_os_str().is_empty() {
            return;
        }
        match media::list_images(&project.image_dir) {
            Ok(paths) if paths != project.image_paths => {
                self.store.update_image_paths(&id, paths);
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("{:#}", e);
                self.status = Some(format!("Image folder unavailable: {}", project.image_dir.display()));
            }
        }
    }

    fn close_project(&mut self) {
        self.active_project = None;
        self.image_index = 0;
        self.session.select_class(None);
        self.session.navigate();
        self.clear_image();
    }

    fn go_to_image(&mut self, index: usize) {
        let Some(project) = self.project() else {
            return;
        };
        let Some(last) = project.image_paths.len().checked_sub(1) else {
            return;
        };
        let index = index.min(last);
        if index != self.image_index {
            self.image_index = index;
            self.session.navigate();
        }
    }

    fn clear_image(&mut self) {
        self.image_texture = None;
        self.image_size = None;
        self.loaded_path = None;
    }

    /// Start decoding `path` on a background thread.
    fn load_image(&mut self, path: String) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = media::load_image(Path::new(&path))
                .map(|img| {
                    log::info!("Loaded image: {} ({}x{})", path, img.width, img.height);
                    LoadedImageData {
                        path: path.clone(),
                        width: img.width,
                        height: img.height,
                        pixels: img.pixels,
                    }
                })
                .map_err(|e| ImageLoadError {
                    message: format!("{:#}", e),
                    path: path.clone(),
                });

            let _ = sender.send(result);
        });
    }

    fn poll_image_loader(&mut self, ctx: &egui::Context) {
        let Some(loaded) = self.receive_image() else {
            return;
        };

        let size = [loaded.width as usize, loaded.height as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &loaded.pixels);
        let texture = ctx.load_texture("current_image", color_image, egui::TextureOptions::LINEAR);

        self.image_texture = Some(texture);
        self.image_size = Some((loaded.width, loaded.height));
        self.loaded_path = Some(loaded.path);
    }

    /// Take a finished decode off the loader, if any.
    ///
    /// Failures are reported here and recorded against the image that
    /// failed, which may no longer be the current one.
    fn receive_image(&mut self) -> Option<LoadedImageData> {
        let result = self.image_loader.as_ref()?.try_recv().ok()?;
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                log::error!("Failed to load image {}: {}", e.path, e.message);
                self.status = Some(e.message);
                self.clear_image();
                // Remember the failure so it is not retried every frame.
                self.loaded_path = Some(e.path);
                None
            }
        }
    }

    /// Request the current image when it is not the one on screen.
    fn ensure_image_loaded(&mut self) {
        if self.image_loader.is_some() {
            return;
        }
        match self.current_image_path() {
            Some(path) if self.loaded_path.as_ref() != Some(&path) => self.load_image(path),
            Some(_) => {}
            None => {
                if self.loaded_path.is_some() {
                    self.clear_image();
                }
            }
        }
    }

    fn pick_image_dir(&mut self) {
        let Some(project) = self.project() else {
            return;
        };
        let mut dialog = rfd::FileDialog::new();
        if project.image_dir.is_dir() {
            dialog = dialog.set_directory(&project.image_dir);
        }
        let Some(dir) = dialog.pick_folder() else {
            return;
        };

        match media::list_images(&dir) {
            Ok(paths) => {
                self.status = Some(format!("{} images in {}", paths.len(), dir.display()));
                self.store.update_image_dir(&project.id, dir);
                self.store.update_image_paths(&project.id, paths);
                self.image_index = 0;
                self.session.navigate();
                self.clear_image();
            }
            Err(e) => {
                log::error!("{:#}", e);
                self.status = Some(format!("{:#}", e));
            }
        }
    }

    fn export_labels(&mut self) {
        let Some(project) = self.project() else {
            return;
        };
        let mut dialog = rfd::FileDialog::new().set_title("Export YOLO labels to");
        if project.image_dir.is_dir() {
            dialog = dialog.set_directory(&project.image_dir);
        }
        let Some(out_dir) = dialog.pick_folder() else {
            return;
        };

        self.status = Some(match export::export_yolo_labels(&project, &out_dir) {
            Ok(summary) if summary.skipped > 0 => format!(
                "Exported {} label files, skipped {} annotations with deleted classes",
                summary.label_files, summary.skipped
            ),
            Ok(summary) => format!("Exported {} label files to {}", summary.label_files, out_dir.display()),
            Err(e) => {
                log::error!("Export failed: {:#}", e);
                format!("Export failed: {:#}", e)
            }
        });
    }

    /// Write the store to the state file if it changed since the last write.
    fn save_state(&mut self) {
        let revision = self.store.revision();
        if revision == self.saved_revision {
            return;
        }
        // A failed write is reported once, not retried every frame.
        self.saved_revision = revision;

        match serialization::save_projects(&self.store.to_vec(), &self.config.state_file) {
            Ok(()) => log::debug!("Saved projects to {}", self.config.state_file.display()),
            Err(e) => {
                log::error!("Failed to save projects: {:#}", e);
                self.status = Some(format!("Save failed: {:#}", e));
            }
        }
    }

    fn handle_sidebar(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::None => {}
            SidebarAction::OpenProject(id) => self.open_project(id),
            SidebarAction::CreateProject { name, model_type } => {
                let project = self.store.add_project(Project::new(name, model_type, PathBuf::new()));
                self.open_project(project.id.clone());
            }
            SidebarAction::DeleteProject(id) => {
                if self.active_project.as_deref() == Some(id.as_str()) {
                    self.close_project();
                }
                self.store.delete_project(&id);
            }
            SidebarAction::PickImageDir => self.pick_image_dir(),
            SidebarAction::AddClass { name, keypoints } => {
                let Some(project) = self.project() else {
                    return;
                };
                let class_id = match project.model_type() {
                    ModelType::Detection => {
                        let class = DetectionClass::new(name);
                        let class_id = class.id.clone();
                        self.store.add_detection_class(&project.id, class);
                        class_id
                    }
                    ModelType::Pose => {
                        let keypoints = keypoints.into_iter().map(KeypointDefinition::new).collect();
                        let class = PoseClass::new(name, keypoints);
                        let class_id = class.id.clone();
                        self.store.add_pose_class(&project.id, class);
                        class_id
                    }
                };
                if self.session.selected_class().is_none() {
                    self.session.select_class(Some(class_id));
                }
            }
            SidebarAction::DeleteClass(class_id) => {
                let Some(project) = self.project() else {
                    return;
                };
                match project.model_type() {
                    ModelType::Detection => self.store.delete_detection_class(&project.id, &class_id),
                    ModelType::Pose => self.store.delete_pose_class(&project.id, &class_id),
                };
            }
            SidebarAction::AddKeypoint { class_id, name } => {
                if let Some(id) = self.active_project.clone() {
                    self.store
                        .add_keypoint_definition(&id, &class_id, KeypointDefinition::new(name));
                }
            }
            SidebarAction::DeleteKeypoint { class_id, keypoint_id } => {
                if let Some(id) = self.active_project.clone() {
                    self.store.delete_keypoint_definition(&id, &class_id, &keypoint_id);
                }
            }
            SidebarAction::SelectClass(class_id) => self.session.select_class(Some(class_id)),
            SidebarAction::PreviousImage => self.go_to_image(self.image_index.saturating_sub(1)),
            SidebarAction::NextImage => self.go_to_image(self.image_index + 1),
            SidebarAction::GoToImage(index) => self.go_to_image(index),
        }
    }

    fn handle_properties(&mut self, action: properties::PropertiesAction) {
        let (Some(id), Some(path)) = (self.active_project.clone(), self.current_image_path()) else {
            return;
        };
        match action {
            properties::PropertiesAction::None => {}
            properties::PropertiesAction::DeleteAnnotation(index) => {
                self.store.delete_annotation_by_index(&id, &path, index);
            }
            properties::PropertiesAction::RemoveImage => {
                if self.store.remove_image(&id, &path).is_some() {
                    log::info!("Removed {} from project", path);
                    self.session.navigate();
                    self.clear_image();
                    let remaining = self.project().map_or(0, |p| p.image_paths.len());
                    self.image_index = self.image_index.min(remaining.saturating_sub(1));
                }
            }
            properties::PropertiesAction::ExportLabels => self.export_labels(),
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.session.cancel();
        }
        if ctx.wants_keyboard_input() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowLeft)) {
            self.go_to_image(self.image_index.saturating_sub(1));
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowRight)) {
            self.go_to_image(self.image_index + 1);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                let has_project = self.active_project.is_some();
                ui.menu_button("File", |ui| {
                    if ui.add_enabled(has_project, egui::Button::new("Open Image Folder...")).clicked() {
                        self.pick_image_dir();
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_project, egui::Button::new("Export YOLO Labels...")).clicked() {
                        self.export_labels();
                        ui.close_menu();
                    }
                    if ui.add_enabled(has_project, egui::Button::new("Close Project")).clicked() {
                        self.close_project();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Fit Image").clicked() {
                        self.session.set_fit_mode(ImageFitMode::Fit);
                        ui.close_menu();
                    }
                    if ui.button("Stretch Image").clicked() {
                        self.session.set_fit_mode(ImageFitMode::Stretch);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(self.session.viewport().is_some(), egui::Button::new("Reset Zoom")).clicked() {
                        self.session.reset_zoom();
                        ui.close_menu();
                    }
                });
            });
        });
    }
}

impl eframe::App for OvaraApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader(ctx);
        self.ensure_image_loaded();

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        self.menu_bar(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.session);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let dirty = self.store.revision() != self.saved_revision;
                ui.label(if dirty { "Unsaved" } else { "Saved" });
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        let project = self.project();
        let image_path = self.current_image_path();

        let sidebar_action = egui::SidePanel::left("sidebar")
            .default_width(240.0)
            .show(ctx, |ui| {
                sidebar::show(
                    ui,
                    &self.store,
                    project.as_deref(),
                    self.image_index,
                    self.session.selected_class(),
                    &mut self.forms,
                )
            })
            .inner;

        let properties_action = egui::SidePanel::right("properties")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, project.as_deref(), image_path.as_deref()))
            .inner;

        let canvas_response = egui::CentralPanel::default()
            .show(ctx, |ui| {
                // Show loading overlay if loading
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    return canvas::CanvasResponse::default();
                }

                let image = match (&project, &image_path, &self.image_texture, self.image_size) {
                    (Some(project), Some(path), Some(texture), Some(size))
                        if self.loaded_path.as_ref() == Some(path) =>
                    {
                        Some(canvas::CanvasImage {
                            project,
                            image_path: path,
                            texture,
                            size,
                        })
                    }
                    _ => None,
                };
                canvas::show(ui, image, &self.session)
            })
            .inner;

        // Pointer events refer to the snapshot that was drawn this frame.
        if let (Some(project), Some(path), Some(render_size)) = (&project, &image_path, canvas_response.render_size) {
            let target = CanvasTarget {
                project_id: &project.id,
                image_path: path,
                render_size,
            };
            for event in canvas_response.events {
                match self.session.handle(&mut self.store, &target, event) {
                    Outcome::Committed => log::info!("Annotation added to {}", path),
                    Outcome::Deleted(index) => log::info!("Annotation {} removed from {}", index, path),
                    _ => {}
                }
            }
        }

        self.handle_sidebar(sidebar_action);
        self.handle_properties(properties_action);
        self.handle_keyboard(ctx);
        self.save_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn app_with_images(dir: &Path, names: &[&str]) -> (OvaraApp, Vec<String>) {
        let config = AppConfig {
            state_file: dir.join("state.json"),
            ..Default::default()
        };
        let mut app = OvaraApp::new(config);
        let paths: Vec<String> = names.iter().map(|n| dir.join(n).to_string_lossy().to_string()).collect();

        let id = app.store.add_project(Project::new("shots", ModelType::Detection, dir)).id.clone();
        app.store.update_image_paths(&id, paths.clone());
        app.active_project = Some(id);
        (app, paths)
    }

    fn finish_loading(app: &mut OvaraApp) -> Option<LoadedImageData> {
        for _ in 0..500 {
            if app.image_loader.is_none() {
                return None;
            }
            if let Some(loaded) = app.receive_image() {
                return Some(loaded);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("image loader did not finish");
    }

    #[test]
    fn test_jump_to_image_from_list() {
        let dir = tempdir().unwrap();
        let (mut app, paths) = app_with_images(dir.path(), &["a.png", "b.png", "c.png"]);

        app.handle_sidebar(SidebarAction::GoToImage(2));
        assert_eq!(app.current_image_path().as_ref(), Some(&paths[2]));

        app.handle_sidebar(SidebarAction::GoToImage(0));
        assert_eq!(app.image_index, 0);

        // out of range clamps to the last image
        app.handle_sidebar(SidebarAction::GoToImage(40));
        assert_eq!(app.image_index, 2);
    }

    #[test]
    fn test_failed_image_is_not_retried() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.png"), b"not an image").unwrap();
        let (mut app, paths) = app_with_images(dir.path(), &["broken.png"]);

        app.ensure_image_loaded();
        assert!(finish_loading(&mut app).is_none());
        assert_eq!(app.loaded_path.as_ref(), Some(&paths[0]));
        assert!(app.status.is_some());

        app.ensure_image_loaded();
        assert!(app.image_loader.is_none());
    }

    #[test]
    fn test_failure_after_navigation_still_loads_new_image() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"not an image").unwrap();
        image::RgbaImage::new(4, 3).save(dir.path().join("b.png")).unwrap();
        let (mut app, paths) = app_with_images(dir.path(), &["a.png", "b.png"]);

        app.ensure_image_loaded();
        assert!(app.image_loader.is_some());
        app.go_to_image(1);
        // a decode is still in flight, nothing new starts
        app.ensure_image_loaded();

        assert!(finish_loading(&mut app).is_none());
        assert_eq!(app.loaded_path.as_ref(), Some(&paths[0]));

        app.ensure_image_loaded();
        let loaded = finish_loading(&mut app).unwrap();
        assert_eq!(loaded.path, paths[1]);
        assert_eq!((loaded.width, loaded.height), (4, 3));
    }
}
