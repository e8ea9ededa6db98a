// panorama.rs - view state owned by the frame loop

use crate::input::FrameInput;
use crate::orientation::{Orientation, ScreenSize};
use crate::quaternion::{OrientationError, Quaternion};

pub struct PanoramaViewer {
    pub orientation: Orientation,
    pub show_hud: bool,
}

impl PanoramaViewer {
    pub fn new(rotation_step: f64, show_hud: bool) -> Self {
        Self {
            orientation: Orientation::new(rotation_step),
            show_hud,
        }
    }

    /// One frame of input. Returns false when the viewer should close.
    pub fn update(&mut self, frame: &FrameInput, screen: ScreenSize) -> Result<bool, OrientationError> {
        if frame.quit {
            return Ok(false);
        }
        if frame.toggle_hud {
            self.show_hud = !self.show_hud;
        }
        self.orientation.update(frame, screen)?;
        Ok(true)
    }

    pub fn rotation(&self) -> Quaternion {
        self.orientation.rotation()
    }
}
