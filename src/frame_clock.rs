// frame_clock.rs - frame-rate cap and FPS counter

use std::time::{Duration, Instant};

pub struct FrameClock {
    frame_time: Option<Duration>,
    next_frame: Instant,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FrameClock {
    /// `fps == 0` runs uncapped.
    pub fn new(fps: u32, now: Instant) -> Self {
        Self {
            frame_time: (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64)),
            next_frame: now,
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Marks a presented frame and returns when the next one should start.
    /// Falling behind resets the schedule instead of bursting to catch up.
    pub fn tick(&mut self, now: Instant) -> Instant {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start).as_secs_f32();
        if elapsed >= 1.0 {
            self.fps = self.frames as f32 / elapsed;
            self.frames = 0;
            self.window_start = now;
        }

        let Some(frame_time) = self.frame_time else {
            return now;
        };
        self.next_frame += frame_time;
        if self.next_frame < now {
            self.next_frame = now + frame_time;
        }
        self.next_frame
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}
