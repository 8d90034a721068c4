//! Frame timing.
//!
//! `FrameClock` is the single source of elapsed and delta time for the
//! animation. A manual clock steps by explicit amounts, which keeps tests
//! and benchmarks deterministic.

use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Source {
    Wall { start: Instant, last: Instant },
    Manual,
}

/// Elapsed/delta time, frame count and a periodically refreshed FPS.
#[derive(Debug)]
pub struct FrameClock {
    source: Source,
    elapsed: f32,
    delta: f32,
    frame: u64,
    fps: f32,
    fps_frames: u64,
    fps_window: f32,
    fps_interval: f32,
}

impl FrameClock {
    /// A clock driven by the wall clock, starting now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self::with_source(Source::Wall {
            start: now,
            last: now,
        })
    }

    /// A clock that only moves through [`advance`](Self::advance).
    pub fn manual() -> Self {
        Self::with_source(Source::Manual)
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            elapsed: 0.0,
            delta: 0.0,
            frame: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_window: 0.0,
            fps_interval: 0.5,
        }
    }

    /// Start a new frame from the wall clock. Returns `(elapsed, delta)`.
    ///
    /// A manual clock treats this as a zero-length step.
    pub fn tick(&mut self) -> (f32, f32) {
        match &mut self.source {
            Source::Wall { start, last } => {
                let now = Instant::now();
                let delta = now.duration_since(*last).as_secs_f32();
                *last = now;
                let elapsed = now.duration_since(*start).as_secs_f32();
                self.record(elapsed, delta);
            }
            Source::Manual => self.record(self.elapsed, 0.0),
        }
        (self.elapsed, self.delta)
    }

    /// Step a manual clock by `dt` seconds. Returns `(elapsed, delta)`.
    pub fn advance(&mut self, dt: f32) -> (f32, f32) {
        let dt = dt.max(0.0);
        self.record(self.elapsed + dt, dt);
        (self.elapsed, self.delta)
    }

    fn record(&mut self, elapsed: f32, delta: f32) {
        self.elapsed = elapsed;
        self.delta = delta;
        self.frame += 1;

        self.fps_frames += 1;
        self.fps_window += delta;
        if self.fps_window >= self.fps_interval {
            self.fps = self.fps_frames as f32 / self.fps_window;
            self.fps_frames = 0;
            self.fps_window = 0.0;
        }
    }

    /// Seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds since the previous frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frames per second, refreshed every half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
