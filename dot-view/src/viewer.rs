//! Interactive Graphviz image viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the background pipeline
//! (pipe reader plus render worker) and implements [`eframe::App`] to
//! display rendered frames in a pannable, zoomable canvas.

use std::time::{Duration, SystemTime};

use eframe::App;
use glam::Vec2;

use dot_core::{
    animation::Glide,
    camera::{Camera, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP},
    config::ViewerConfig,
    pipeline::Pipeline,
    worker::PipelineEvent,
};

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The background pipeline: FIFO reader and render worker, polled
///   through an event channel once per frame.
/// - The interactive transform ([`Camera`]) plus the fit-and-center glide.
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Drain pending [`PipelineEvent`]s (new frames, failures, timestamps).
/// 2. Handle canvas input: drag panning, wheel and click zooming, fit
///    gestures and keyboard shortcuts.
/// 3. Draw the current texture under the camera transform.
///
/// ### Fields
/// - `pipeline` - Owns the FIFO and both worker threads.
/// - `config` - Glide and indicator timing (renderer settings live in the
///   pipeline).
///
/// - `texture` - GPU texture of the most recent frame, if any.
/// - `image_size` - Dimensions of that frame in pixels.
/// - `camera` - Current zoom/pan transform.
///
/// - `glide` - In-flight fit-and-center animation, if any.
/// - `indicator_until` - egui time until which the center indicator shows.
///
/// - `needs_fit` - Fit the image on the next canvas pass (first frame,
///   resize, or the Fit button).
/// - `last_viewport` - Canvas size of the previous frame, for resize
///   detection.
///
/// - `last_update` - Wall-clock time of the last pipe delivery.
/// - `last_error` - Most recent render failure, shown in the status bar.
pub struct Viewer {
    pipeline: Pipeline,
    config: ViewerConfig,

    texture: Option<egui::TextureHandle>,
    image_size: Vec2,
    camera: Camera,

    glide: Option<Glide>,
    indicator_until: f64,

    needs_fit: bool,
    last_viewport: egui::Vec2,

    last_update: Option<SystemTime>,
    last_error: Option<String>,
}

impl Viewer {
    /// Creates a viewer in its idle state: no image, default camera, and a
    /// waiting hint until the first frame arrives over `pipeline`.
    pub fn new(pipeline: Pipeline, config: ViewerConfig) -> Self {
        Self {
            pipeline,
            config,
            texture: None,
            image_size: Vec2::ZERO,
            camera: Camera::default(),
            glide: None,
            indicator_until: 0.0,
            needs_fit: false,
            last_viewport: egui::Vec2::ZERO,
            last_update: None,
            last_error: None,
        }
    }

    /// Drains the pipeline event channel without blocking.
    fn poll_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.pipeline.events().try_recv() {
            self.apply_event(ctx, event);
        }
    }

    /// Applies a single pipeline event to the viewer state.
    ///
    /// Every event refreshes the last-update timestamp, duplicates
    /// included. A frame replaces the texture in place when one exists;
    /// the very first frame additionally requests a fit so the whole
    /// graph starts out visible.
    fn apply_event(&mut self, ctx: &egui::Context, event: PipelineEvent) {
        match event {
            PipelineEvent::Received { at } => {
                self.last_update = Some(at);
            }
            PipelineEvent::Frame { frame, at } => {
                self.last_update = Some(at);
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [frame.width as usize, frame.height as usize],
                    &frame.rgba,
                );
                self.image_size = frame.size();
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("graph", image, egui::TextureOptions::LINEAR));
                        self.needs_fit = true;
                    }
                }
                self.last_error = None;
            }
            PipelineEvent::Failed { message, at } => {
                self.last_update = Some(at);
                self.last_error = Some(message);
            }
        }
    }

    /// Starts the animated fit-and-center glide and arms the center
    /// indicator. Does nothing while no image has arrived yet.
    fn start_fit_glide(&mut self, now: f64, viewport: Vec2) {
        if self.image_size.x <= 0.0 {
            return;
        }
        let target = Camera::fit(self.image_size, viewport);
        self.glide = Some(Glide::new(
            self.camera,
            target,
            now,
            self.config.glide_duration,
        ));
        self.indicator_until = now + self.config.indicator_duration;
    }

    /// Builds the top panel (fit button and zoom slider).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Fit").clicked() {
                    self.needs_fit = true;
                }

                ui.separator();
                if ui
                    .add(egui::Slider::new(&mut self.camera.zoom, MIN_ZOOM..=MAX_ZOOM).text("Zoom"))
                    .changed()
                {
                    self.glide = None;
                }
            });
        });
    }

    /// Builds the bottom status bar (zoom, image size, last update, error).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("zoom = {:.0}%", self.camera.zoom * 100.0));
                if self.texture.is_some() {
                    ui.separator();
                    ui.label(format!(
                        "{}x{} px",
                        self.image_size.x as u32, self.image_size.y as u32
                    ));
                }

                ui.separator();
                match self.last_update {
                    Some(at) => ui.label(format!("last update: {}", format_timestamp(at))),
                    None => ui.label("no data yet"),
                };

                if let Some(message) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, message);
                }
            });
        });
    }

    /// Builds the central canvas: input handling, image drawing and the
    /// center indicator overlay.
    fn ui_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let viewport = Vec2::new(rect.width(), rect.height());
            let now = ctx.input(|i| i.time);

            // Resizing the canvas refits the image; the same flag serves
            // the Fit button and the first frame.
            if self.last_viewport != rect.size() {
                self.last_viewport = rect.size();
                self.needs_fit = true;
            }
            if self.needs_fit && self.image_size.x > 0.0 {
                self.camera = Camera::fit(self.image_size, viewport);
                self.glide = None;
                self.needs_fit = false;
            }

            // Pan with either the left or the right button held down.
            if response.dragged_by(egui::PointerButton::Primary)
                || response.dragged_by(egui::PointerButton::Secondary)
            {
                self.glide = None;
                let delta = response.drag_delta();
                self.camera.pan_by(Vec2::new(delta.x, delta.y));
                ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
            }

            // Wheel zoom around the mouse cursor, one step per notch.
            let scroll = ctx.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0
                && let Some(pos) = response.hover_pos()
            {
                self.glide = None;
                let factor = if scroll > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                self.camera.zoom_at(to_view(pos, rect), factor, viewport);
            }

            // Double left click zooms in a step at the cursor.
            if response.double_clicked_by(egui::PointerButton::Primary)
                && let Some(pos) = response.hover_pos()
            {
                self.glide = None;
                self.camera.zoom_at(to_view(pos, rect), ZOOM_STEP, viewport);
            }

            // Middle click snaps back to the fitted view.
            if response.clicked_by(egui::PointerButton::Middle) {
                self.glide = None;
                self.camera = Camera::fit(self.image_size, viewport);
            }

            // Double right click glides back to the fitted view.
            if response.double_clicked_by(egui::PointerButton::Secondary) {
                self.start_fit_glide(now, viewport);
            }

            // Ctrl+arrow zooms about the canvas center.
            let (key_zoom_in, key_zoom_out) = ctx.input(|i| {
                (
                    i.modifiers.ctrl && i.key_pressed(egui::Key::ArrowRight),
                    i.modifiers.ctrl && i.key_pressed(egui::Key::ArrowLeft),
                )
            });
            if key_zoom_in || key_zoom_out {
                self.glide = None;
                let factor = if key_zoom_in { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                self.camera.zoom_at(viewport * 0.5, factor, viewport);
            }

            // Advance the glide, if one is running.
            if let Some(glide) = self.glide {
                if glide.is_finished(now) {
                    self.camera = glide.target();
                    self.glide = None;
                } else {
                    self.camera = glide.sample(now);
                }
            }

            let painter = ui.painter_at(rect);

            if let Some(texture) = &self.texture {
                let (min, max) = self.camera.image_rect(self.image_size, viewport);
                let image_rect = egui::Rect::from_min_max(
                    rect.min + egui::vec2(min.x, min.y),
                    rect.min + egui::vec2(max.x, max.y),
                );
                painter.image(
                    texture.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            } else {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("Waiting for DOT text on {}", self.pipeline.path().display()),
                    egui::FontId::proportional(14.0),
                    ui.visuals().weak_text_color(),
                );
            }

            // Translucent marker over the image center while the glide
            // indicator is armed.
            if now < self.indicator_until {
                let center = self.camera.image_to_view(Vec2::ZERO, viewport);
                painter.circle(
                    rect.min + egui::vec2(center.x, center.y),
                    8.0,
                    egui::Color32::from_rgba_unmultiplied(255, 0, 0, 50),
                    egui::Stroke::new(1.5, egui::Color32::from_rgba_unmultiplied(255, 0, 0, 150)),
                );
            }

            // Animations need every frame; otherwise a short timer keeps
            // the event channel polled while idle.
            if self.glide.is_some() || now < self.indicator_until {
                ctx.request_repaint();
            } else {
                ctx.request_repaint_after(Duration::from_millis(50));
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that polls pipeline events and builds all panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events(ctx);
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_canvas(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.pipeline.shutdown();
    }
}

/// Canvas-relative position of a pointer location.
fn to_view(pos: egui::Pos2, rect: egui::Rect) -> Vec2 {
    Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y)
}

fn format_timestamp(at: SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(at)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dot_core::render::Frame;

    fn test_viewer() -> (tempfile::TempDir, Viewer) {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewerConfig::default();
        let pipeline = Pipeline::start(&dir.path().join("test.pipe"), &config).unwrap();
        (dir, Viewer::new(pipeline, config))
    }

    fn frame_event(width: u32, height: u32) -> PipelineEvent {
        PipelineEvent::Frame {
            frame: Frame {
                width,
                height,
                rgba: vec![255; (width * height * 4) as usize],
            },
            at: SystemTime::now(),
        }
    }

    #[test]
    fn first_frame_uploads_texture_and_requests_a_fit() {
        let (_dir, mut viewer) = test_viewer();
        let ctx = egui::Context::default();

        assert!(viewer.texture.is_none());
        viewer.apply_event(&ctx, frame_event(3, 2));

        assert!(viewer.texture.is_some());
        assert_eq!(viewer.image_size, Vec2::new(3.0, 2.0));
        assert!(viewer.needs_fit);
        assert!(viewer.last_update.is_some());
    }

    #[test]
    fn later_frames_keep_the_camera_unchanged() {
        let (_dir, mut viewer) = test_viewer();
        let ctx = egui::Context::default();

        viewer.apply_event(&ctx, frame_event(3, 2));
        // Pretend the canvas consumed the fit and the user zoomed in.
        viewer.needs_fit = false;
        viewer.camera.zoom = 3.0;

        viewer.apply_event(&ctx, frame_event(6, 4));

        assert!(!viewer.needs_fit);
        assert_eq!(viewer.camera.zoom, 3.0);
        assert_eq!(viewer.image_size, Vec2::new(6.0, 4.0));
    }

    #[test]
    fn received_updates_the_timestamp_without_an_image() {
        let (_dir, mut viewer) = test_viewer();
        let ctx = egui::Context::default();

        assert!(viewer.last_update.is_none());
        viewer.apply_event(
            &ctx,
            PipelineEvent::Received {
                at: SystemTime::now(),
            },
        );

        assert!(viewer.last_update.is_some());
        assert!(viewer.texture.is_none());
    }

    #[test]
    fn failures_are_shown_until_the_next_good_frame() {
        let (_dir, mut viewer) = test_viewer();
        let ctx = egui::Context::default();

        viewer.apply_event(
            &ctx,
            PipelineEvent::Failed {
                message: "renderer exited with exit status: 1: syntax error".to_owned(),
                at: SystemTime::now(),
            },
        );
        assert!(viewer.last_error.as_deref().unwrap().contains("syntax error"));

        viewer.apply_event(&ctx, frame_event(2, 2));
        assert!(viewer.last_error.is_none());
    }

    #[test]
    fn fit_glide_targets_the_fitted_camera_and_arms_the_indicator() {
        let (_dir, mut viewer) = test_viewer();
        let ctx = egui::Context::default();

        viewer.apply_event(&ctx, frame_event(400, 150));
        viewer.camera = Camera {
            zoom: 5.0,
            pan: Vec2::new(120.0, -40.0),
        };

        let viewport = Vec2::new(800.0, 600.0);
        viewer.start_fit_glide(10.0, viewport);

        let glide = viewer.glide.unwrap();
        let target = glide.target();
        assert_eq!(target, Camera::fit(Vec2::new(400.0, 150.0), viewport));
        // The glide starts where the camera currently is.
        assert_eq!(glide.sample(10.0).zoom, 5.0);
        // Indicator outlives the glide (0.8 s vs 0.4 s).
        assert_eq!(viewer.indicator_until, 10.0 + viewer.config.indicator_duration);
        assert!(glide.is_finished(10.0 + viewer.config.glide_duration));
    }

    #[test]
    fn fit_glide_without_an_image_is_ignored() {
        let (_dir, mut viewer) = test_viewer();

        viewer.start_fit_glide(10.0, Vec2::new(800.0, 600.0));

        assert!(viewer.glide.is_none());
        assert_eq!(viewer.indicator_until, 0.0);
    }
}
