//! Keeps the camera and the drawing buffer in step with the window size.

use crate::camera::PerspectiveCamera;

/// Anything that owns a drawing buffer the renderer draws into.
pub trait RenderSurface {
    fn set_pixel_ratio(&mut self, ratio: f64);
    /// Logical size in CSS pixels. The buffer is this times the pixel ratio.
    fn set_size(&mut self, width: u32, height: u32);
}

/// Window dimensions as reported by the windowing system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    /// `physical` is the inner size in device pixels, `scale_factor` the display's
    /// device pixel ratio. The ratio used for drawing is capped at `max_pixel_ratio`.
    pub fn new(physical: (u32, u32), scale_factor: f64, max_pixel_ratio: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        // only a zero physical size counts as minimized
        let logical = |v: u32| match v {
            0 => 0,
            v => ((v as f64 / scale).round() as u32).max(1),
        };
        Self {
            width: logical(physical.0),
            height: logical(physical.1),
            pixel_ratio: scale.min(max_pixel_ratio.max(f64::MIN_POSITIVE)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the drawing buffer in device pixels, never zero.
    pub fn buffer_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f64 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeHandler;

impl ResizeHandler {
    /// Returns false when the viewport was empty and nothing changed.
    pub fn on_resize(
        &self,
        camera: &mut PerspectiveCamera,
        surface: &mut impl RenderSurface,
        viewport: Viewport,
    ) -> bool {
        if viewport.is_empty() {
            log::debug!("ignoring resize to {}x{}", viewport.width, viewport.height);
            return false;
        }
        camera.set_aspect(viewport.aspect());
        camera.update_projection_matrix();
        surface.set_pixel_ratio(viewport.pixel_ratio);
        surface.set_size(viewport.width, viewport.height);
        true
    }
}
