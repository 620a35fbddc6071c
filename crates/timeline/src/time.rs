/// Frame/seconds/pixel conversion primitives.
///
/// All engine math runs in integer frames; a value is rounded exactly once
/// when it leaves pointer/pixel space, so repeated edits never drift.
use serde::{Deserialize, Serialize};

use crate::{Fps, Frame};

pub fn frames_from_seconds(seconds: f64, fps: Fps) -> Frame {
    (seconds * fps.as_f64()).round() as Frame
}

pub fn seconds_from_frames(frame: Frame, fps: Fps) -> f64 {
    frame as f64 / fps.as_f64()
}

/// Zoom/pan state of the timeline view, owned by the viewport collaborator.
/// The engines only use it as a pair of pure conversion functions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub pixels_per_second: f64,
    pub fps: Fps,
}

impl Viewport {
    pub fn new(pixels_per_second: f64, fps: Fps) -> Self {
        Self {
            pixels_per_second,
            fps,
        }
    }

    pub fn pixels_per_frame(&self) -> f64 {
        self.pixels_per_second / self.fps.as_f64()
    }

    pub fn pixels_to_frames(&self, pixels: f64) -> Frame {
        (pixels / self.pixels_per_second * self.fps.as_f64()).round() as Frame
    }

    pub fn frames_to_pixels(&self, frame: Frame) -> f64 {
        frame as f64 / self.fps.as_f64() * self.pixels_per_second
    }
}
