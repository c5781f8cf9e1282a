//! Viewport tracking and the resize handling that keeps the presentation in sync.
//!
//! The [`ViewportMonitor`] is invoked from the window's resize callback. It
//! resizes the render surface, updates the camera aspect and re-solves the
//! placement before control returns to the event loop, so the next frame never
//! shows a stale layout.

use crate::viewer::Viewer;

/// Logical widths below this are laid out for mobile.
pub const MOBILE_BREAKPOINT: f32 = 1000.0;

/// Coarse device-width category driving the layout-specific placement rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportClass {
    Mobile,
    Desktop,
}

impl ViewportClass {
    pub fn classify(width: f32) -> Self {
        if width < MOBILE_BREAKPOINT {
            ViewportClass::Mobile
        } else {
            ViewportClass::Desktop
        }
    }
}

/// Size of the host viewport in logical (CSS) pixels and its device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Converts a physical window size as reported by winit.
    pub fn from_physical(size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self {
            width: logical.width as f32,
            height: logical.height as f32,
            pixel_ratio: scale_factor as f32,
        }
    }

    /// Builds a viewport from the browser's `innerWidth`, `innerHeight` and
    /// `devicePixelRatio`. A ratio that is not a positive number counts as 1.
    pub fn from_host(inner_width: f64, inner_height: f64, device_pixel_ratio: f64) -> Self {
        let pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: inner_width.max(0.0) as f32,
            height: inner_height.max(0.0) as f32,
            pixel_ratio: pixel_ratio as f32,
        }
    }

    pub fn class(&self) -> ViewportClass {
        ViewportClass::classify(self.width)
    }

    /// Physical pixel size of the render surface with the pixel ratio capped at `max_pixel_ratio`.
    pub fn surface_size(&self, max_pixel_ratio: f32) -> (u32, u32) {
        let ratio = self.pixel_ratio.min(max_pixel_ratio).max(0.0);
        let scale = |logical: f32| (logical * ratio).round().max(0.0) as u32;
        (scale(self.width), scale(self.height))
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A drawable surface whose pixel size follows the viewport.
pub trait SurfaceResize {
    /// Reconfigure for `width` x `height` physical pixels. Zero sizes must be ignored.
    fn resize_surface(&mut self, width: u32, height: u32);
}

#[derive(Clone, Copy, Debug)]
pub struct ViewportMonitor {
    max_pixel_ratio: f32,
}

impl ViewportMonitor {
    pub fn new(max_pixel_ratio: f32) -> Self {
        Self { max_pixel_ratio }
    }

    /// Sizes the surface at the full physical pixel size.
    pub fn unbounded() -> Self {
        Self::new(f32::INFINITY)
    }

    /// Handles one size change: surface first, then camera aspect and placement.
    pub fn handle<S: SurfaceResize + ?Sized>(
        &self,
        viewer: &mut Viewer,
        surface: &mut S,
        viewport: Viewport,
    ) {
        let (width, height) = viewport.surface_size(self.max_pixel_ratio);
        log::debug!(
            "Viewport changed to {}x{} ({:?}), surface {}x{}",
            viewport.width,
            viewport.height,
            viewport.class(),
            width,
            height
        );
        surface.resize_surface(width, height);
        viewer.resize(viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundary_is_exclusive() {
        assert_eq!(ViewportClass::classify(999.9), ViewportClass::Mobile);
        assert_eq!(ViewportClass::classify(1000.0), ViewportClass::Desktop);
    }

    #[test]
    fn surface_size_caps_pixel_ratio() {
        let viewport = Viewport::new(500.0, 300.0).with_pixel_ratio(3.0);
        assert_eq!(viewport.surface_size(2.0), (1000, 600));
        let viewport = Viewport::new(500.0, 300.0).with_pixel_ratio(1.5);
        assert_eq!(viewport.surface_size(2.0), (750, 450));
    }

    #[test]
    fn physical_sizes_convert_to_logical() {
        let viewport = Viewport::from_physical(winit::dpi::PhysicalSize::new(2400, 1600), 2.0);
        assert_eq!(viewport.width, 1200.0);
        assert_eq!(viewport.height, 800.0);
        assert_eq!(viewport.class(), ViewportClass::Desktop);
    }

    #[test]
    fn host_metrics_keep_logical_size_and_ratio() {
        let viewport = Viewport::from_host(390.0, 844.0, 3.0);
        assert_eq!(viewport, Viewport::new(390.0, 844.0).with_pixel_ratio(3.0));
        assert_eq!(viewport.class(), ViewportClass::Mobile);
        assert_eq!(viewport.surface_size(2.0), (780, 1688));
    }

    #[test]
    fn host_metrics_without_pixel_ratio_default_to_one() {
        assert_eq!(Viewport::from_host(1280.0, 720.0, 0.0).pixel_ratio, 1.0);
        assert_eq!(Viewport::from_host(1280.0, 720.0, f64::NAN).pixel_ratio, 1.0);
    }

    #[test]
    fn unbounded_surface_uses_full_physical_size() {
        let size = winit::dpi::PhysicalSize::new(2561, 1441);
        let viewport = Viewport::from_physical(size, 3.0);
        assert_eq!(viewport.surface_size(ViewportMonitor::unbounded().max_pixel_ratio), (2561, 1441));
        assert_eq!(viewport.surface_size(2.0), (1707, 961));
    }
}
