// orientation.rs - view orientation and the key/drag to rotation mapping

use crate::input::FrameInput;
use crate::quaternion::{
    axis_angle_to_quaternion, cross, dot, quaternion_multiply, OrientationError, Quaternion,
};
use glam::DVec3;
use std::f64::consts::{PI, TAU};

/// Fixed window size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

/// Pointer position in whole pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelPos {
    pub x: i32,
    pub y: i32,
}

impl PixelPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Maps a pixel to (s, t) with t growing upward, matching the quad's
    /// texture coordinates.
    pub fn pixel_to_texcoord(&self, p: PixelPos) -> (f64, f64) {
        let w = self.width as f64;
        let h = self.height as f64;
        let s = p.x as f64 / w;
        let t = (h - 1.0 - p.y as f64) / h;
        (s, t)
    }
}

/// Equirectangular (s, t) to a point on the unit sphere. The fragment shader
/// uses the same parameterization.
pub fn texcoord_to_sphere(s: f64, t: f64) -> DVec3 {
    let lon = TAU * s;
    let lat = PI * (t - 0.5);
    DVec3::new(lon.cos() * lat.cos(), lat.sin(), lon.sin() * lat.cos())
}

/// Inverse of [`texcoord_to_sphere`]; `s` lands in (-0.5, 0.5].
pub fn sphere_to_texcoord(p: DVec3) -> (f64, f64) {
    let s = p.z.atan2(p.x) / TAU;
    let t = 0.5 + p.y.clamp(-1.0, 1.0).asin() / PI;
    (s, t)
}

/// The six rotation keys, in the order they are applied each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationKey {
    YawLeft,
    YawRight,
    PitchDown,
    PitchUp,
    RollLeft,
    RollRight,
}

impl RotationKey {
    pub const ALL: [RotationKey; 6] = [
        RotationKey::YawLeft,
        RotationKey::YawRight,
        RotationKey::PitchDown,
        RotationKey::PitchUp,
        RotationKey::RollLeft,
        RotationKey::RollRight,
    ];

    pub fn axis(self) -> DVec3 {
        match self {
            RotationKey::YawLeft | RotationKey::YawRight => DVec3::Y,
            RotationKey::PitchDown | RotationKey::PitchUp => DVec3::Z,
            RotationKey::RollLeft | RotationKey::RollRight => DVec3::X,
        }
    }

    /// Sign applied to the per-frame step angle.
    pub fn sign(self) -> f64 {
        match self {
            RotationKey::YawLeft | RotationKey::PitchDown | RotationKey::RollRight => 1.0,
            RotationKey::YawRight | RotationKey::PitchUp | RotationKey::RollLeft => -1.0,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            RotationKey::YawLeft => "A / Left",
            RotationKey::YawRight => "D / Right",
            RotationKey::PitchDown => "S / Down",
            RotationKey::PitchUp => "W / Up",
            RotationKey::RollLeft => "Q",
            RotationKey::RollRight => "E",
        }
    }
}

/// Rotation that makes the surface point under `prev` follow the pointer to
/// `curr`. `None` when the pixels coincide or the two sphere points span no
/// plane.
pub fn drag_rotation(
    screen: ScreenSize,
    prev: PixelPos,
    curr: PixelPos,
) -> Option<Quaternion> {
    if prev == curr {
        return None;
    }
    let (s0, t0) = screen.pixel_to_texcoord(prev);
    let (s1, t1) = screen.pixel_to_texcoord(curr);
    let p0 = texcoord_to_sphere(s0, t0);
    let p1 = texcoord_to_sphere(s1, t1);

    let axis = cross(p0, p1);
    let angle = dot(p0, p1).clamp(-1.0, 1.0).acos();
    match axis_angle_to_quaternion(axis, -angle) {
        Ok(q) => Some(q),
        Err(OrientationError::DegenerateVector(len)) => {
            log::debug!("skipping drag {prev:?} -> {curr:?}: axis length {len:e}");
            None
        }
    }
}

/// Current view orientation, owned by the frame loop.
#[derive(Debug, Clone, Copy)]
pub struct Orientation {
    rotation: Quaternion,
    step: f64,
}

impl Orientation {
    pub fn new(step: f64) -> Self {
        Self {
            rotation: Quaternion::IDENTITY,
            step,
        }
    }

    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    fn compose(&mut self, delta: Quaternion) {
        let next = quaternion_multiply(self.rotation, delta);
        // keep drift from accumulating over long sessions
        self.rotation = next.normalized().unwrap_or(next);
    }

    /// Applies one frame of input: held rotation keys in [`RotationKey::ALL`]
    /// order, then the mouse drag if the primary button is down.
    pub fn update(&mut self, frame: &FrameInput, screen: ScreenSize) -> Result<(), OrientationError> {
        for key in RotationKey::ALL {
            if frame.is_held(key) {
                let q = axis_angle_to_quaternion(key.axis(), key.sign() * self.step)?;
                self.compose(q);
            }
        }

        if frame.mouse_down {
            let curr = frame.position;
            let prev = PixelPos::new(curr.x - frame.delta.0, curr.y - frame.delta.1);
            if let Some(q) = drag_rotation(screen, prev, curr) {
                self.compose(q);
            }
        }
        Ok(())
    }
}
