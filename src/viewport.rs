//! Composable viewport transform between world and device coordinates.
//!
//! The transform is a persistent pan/zoom pair composed with a live "post"
//! pan/zoom pair that backs an in-progress gesture: wheel zooming scales the
//! post zoom, and a pan drag writes the post pan until the gesture ends and
//! [`ViewportTransform::commit_pan`] folds it into the persistent pan. The
//! resolved zoom (`zoom * post_zoom`) is always clamped into
//! [`ZOOM_MIN`, `ZOOM_MAX`].

use eframe::egui;

use crate::constants::{FIT_PADDING, WHEEL_ZOOM_DIVISOR, ZOOM_MAX, ZOOM_MIN};

/// A computed pan/zoom pair produced by a fit operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitDescriptor {
    /// Persistent pan to apply
    pub pan: egui::Vec2,
    /// Persistent zoom to apply
    pub zoom: f32,
}

/// Computes the pan/zoom that maps `world_rect` fully inside `target` shrunk
/// by `padding`, centered.
///
/// Degenerate world extents fall back to a unit scale on the degenerate axis
/// so a single node still fits sensibly.
pub fn fit_descriptor(world_rect: egui::Rect, target: egui::Rect, padding: f32) -> FitDescriptor {
    let inner = target.shrink(padding);
    let sx = if world_rect.width() > f32::EPSILON {
        inner.width() / world_rect.width()
    } else {
        1.0
    };
    let sy = if world_rect.height() > f32::EPSILON {
        inner.height() / world_rect.height()
    } else {
        1.0
    };
    let zoom = sx.min(sy).clamp(ZOOM_MIN, ZOOM_MAX);
    let pan = inner.center().to_vec2() - world_rect.center().to_vec2() * zoom;
    FitDescriptor { pan, zoom }
}

/// Maps between world coordinates and device (screen) coordinates.
///
/// Forward composition: `device = post_zoom * (zoom * world + pan) + post_pan`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportTransform {
    pan: egui::Vec2,
    zoom: f32,
    post_pan: egui::Vec2,
    post_zoom: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            pan: egui::Vec2::ZERO,
            zoom: 1.0,
            post_pan: egui::Vec2::ZERO,
            post_zoom: 1.0,
        }
    }
}

impl ViewportTransform {
    /// Creates an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the persistent pan.
    pub fn pan(&self) -> egui::Vec2 {
        self.pan
    }

    /// Returns the persistent zoom.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Returns the live gesture pan.
    pub fn post_pan(&self) -> egui::Vec2 {
        self.post_pan
    }

    /// Returns the live gesture zoom.
    pub fn post_zoom(&self) -> f32 {
        self.post_zoom
    }

    /// Returns the composed zoom actually applied to world geometry.
    pub fn resolved_zoom(&self) -> f32 {
        self.zoom * self.post_zoom
    }

    /// Maps a world-space point to device space.
    pub fn to_device(&self, world: egui::Pos2) -> egui::Pos2 {
        ((world.to_vec2() * self.zoom + self.pan) * self.post_zoom + self.post_pan).to_pos2()
    }

    /// Maps a device-space point to world space; exact inverse of
    /// [`ViewportTransform::to_device`].
    pub fn to_world(&self, device: egui::Pos2) -> egui::Pos2 {
        (((device.to_vec2() - self.post_pan) / self.post_zoom - self.pan) / self.zoom).to_pos2()
    }

    /// Returns the wheel-to-zoom multiplier for a wheel delta, conventionally
    /// `exp(delta / 600)`.
    pub fn zoom_multiplier(wheel_delta: f32) -> f32 {
        (wheel_delta / WHEEL_ZOOM_DIVISOR).exp()
    }

    /// Multiplies the live zoom, clamping so the resolved zoom stays within
    /// [`ZOOM_MIN`, `ZOOM_MAX`].
    pub fn apply_zoom_delta(&mut self, multiplier: f32) {
        self.post_zoom *= multiplier;
        self.post_zoom = self
            .post_zoom
            .clamp(ZOOM_MIN / self.zoom, ZOOM_MAX / self.zoom);
    }

    /// Sets the live pan while a pan gesture is in progress.
    pub fn set_post_pan(&mut self, delta: egui::Vec2) {
        self.post_pan = delta;
    }

    /// Folds the live pan into the persistent pan and zeroes it; called when
    /// a pan gesture ends. The composed mapping is unchanged.
    pub fn commit_pan(&mut self) {
        self.pan += self.post_pan / self.post_zoom;
        self.post_pan = egui::Vec2::ZERO;
    }

    /// Applies a fit result, resetting the live gesture chain.
    pub fn apply_fit(&mut self, fit: FitDescriptor) {
        self.pan = fit.pan;
        self.zoom = fit.zoom;
        self.post_pan = egui::Vec2::ZERO;
        self.post_zoom = 1.0;
    }

    /// Computes and applies the pan/zoom that places `world_rect` inside
    /// `target` with the default padding; used after load and autolayout.
    pub fn fit_to_region(&mut self, world_rect: egui::Rect, target: egui::Rect) {
        self.apply_fit(fit_descriptor(world_rect, target, FIT_PADDING));
    }

    /// Restores the identity transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
