//! The continuously rescheduled draw step.
//!
//! Every step first asks the host for the next frame and then presents a
//! [`Frame`]: an immutable snapshot captured from the viewer. The step never
//! writes to model or camera, which keeps it testable against a fixed state.
//!
//! # Key types
//!
//! - [`Frame`] is the per-frame snapshot (clear colour, camera, model transform)
//! - [`FrameScheduler`] is the host's per-frame callback facility
//! - [`FrameTarget`] is anything a frame can be presented to
//! - [`RenderLoop`] ties the three together

use crate::{camera::CameraUniform, pipelines::transform::TransformUniform, viewer::Viewer};

/// What a single frame shows.
///
/// `transform` is `None` until an asset is attached; such a frame only clears.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub clear_colour: wgpu::Color,
    pub camera: CameraUniform,
    pub transform: Option<TransformUniform>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.transform.is_none()
    }
}

pub trait FrameScheduler {
    fn schedule_next_frame(&self);
}

impl FrameScheduler for winit::window::Window {
    fn schedule_next_frame(&self) {
        self.request_redraw();
    }
}

pub trait FrameTarget {
    type Error;

    fn present(&mut self, frame: &Frame) -> Result<(), Self::Error>;
}

#[derive(Debug, Default)]
pub struct RenderLoop {
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented successfully so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /**
     * Runs one iteration of the loop.
     *
     * The next frame is scheduled before drawing so that a failing draw does not
     * stop the loop; the error is returned for the caller to recover from.
     */
    pub fn step<S, T>(
        &mut self,
        scheduler: &S,
        target: &mut T,
        viewer: &Viewer,
    ) -> Result<(), T::Error>
    where
        S: FrameScheduler + ?Sized,
        T: FrameTarget + ?Sized,
    {
        scheduler.schedule_next_frame();
        let frame = viewer.frame();
        target.present(&frame)?;
        self.frames += 1;
        Ok(())
    }
}
