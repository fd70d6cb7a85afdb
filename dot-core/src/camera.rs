//! Zoom/pan transform between image space and view space.
//!
//! Image space has its origin at the image center, so a frame of size
//! `(w, h)` spans `(-w/2, -h/2) ..= (w/2, h/2)`. View space is the canvas
//! rectangle with the origin at its top-left corner. Both are y-down.

use glam::Vec2;

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f32 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f32 = 10.0;
/// Multiplier applied per zoom step (wheel notch, double click, shortcut).
pub const ZOOM_STEP: f32 = 1.2;

/// Interactive transform state: a zoom factor and a pan offset in view
/// pixels.
///
/// The mapping is `view = viewport / 2 + image * zoom + pan`, i.e. with a
/// zero pan the image center sits at the viewport center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }
}

impl Camera {
    /// Returns a camera that fits an image of `image_size` into `viewport`.
    ///
    /// The zoom is the smaller of the width and height ratios (clamped to
    /// the zoom limits) and the pan is reset, so the whole image is visible
    /// and centered.
    ///
    /// ### Parameters
    /// - `image_size` - Image dimensions in pixels.
    /// - `viewport` - Canvas dimensions in view pixels.
    ///
    /// ### Returns
    /// A [`Camera`] showing the full image; the default camera if either
    /// size is degenerate.
    pub fn fit(image_size: Vec2, viewport: Vec2) -> Self {
        if image_size.x <= 0.0 || image_size.y <= 0.0 || viewport.x <= 0.0 || viewport.y <= 0.0 {
            return Self::default();
        }

        let zoom = (viewport.x / image_size.x)
            .min(viewport.y / image_size.y)
            .clamp(MIN_ZOOM, MAX_ZOOM);

        Self {
            zoom,
            pan: Vec2::ZERO,
        }
    }

    /// Converts an image-space position to view-space.
    pub fn image_to_view(&self, p: Vec2, viewport: Vec2) -> Vec2 {
        viewport * 0.5 + p * self.zoom + self.pan
    }

    /// Converts a view-space position back to image-space.
    ///
    /// This is the inverse of [`Camera::image_to_view`] up to floating
    /// point rounding.
    pub fn view_to_image(&self, p: Vec2, viewport: Vec2) -> Vec2 {
        (p - viewport * 0.5 - self.pan) / self.zoom
    }

    /// Multiplies the zoom by `factor` while keeping the image point under
    /// `anchor` fixed on screen.
    ///
    /// The new zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`; the pan is then
    /// adjusted so that whatever was under the anchor (typically the mouse
    /// cursor) stays put.
    ///
    /// ### Parameters
    /// - `anchor` - View-space point to zoom around.
    /// - `factor` - Zoom multiplier; values above 1 zoom in.
    /// - `viewport` - Canvas dimensions in view pixels.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32, viewport: Vec2) {
        let before = self.view_to_image(anchor, viewport);

        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let after = self.image_to_view(before, viewport);
        self.pan += anchor - after;
    }

    /// Moves the view by `delta` view pixels (drag panning).
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Returns the view-space corners `(min, max)` of an image of
    /// `image_size` under this camera.
    pub fn image_rect(&self, image_size: Vec2, viewport: Vec2) -> (Vec2, Vec2) {
        let half = image_size * 0.5;
        (
            self.image_to_view(-half, viewport),
            self.image_to_view(half, viewport),
        )
    }
}
