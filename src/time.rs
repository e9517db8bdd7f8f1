//! Session clock driving the particle animation.
//!
//! Elapsed time is accumulated from scaled frame deltas rather than read
//! from the start instant, so pausing or changing the time scale never makes
//! it jump, and it never decreases.
//!
//! # Example
//!
//! ```ignore
//! use depthcloud::time::Clock;
//!
//! let mut clock = Clock::new();
//!
//! // once per frame:
//! let elapsed = clock.tick();
//! println!("t = {:.2}s, {:.1} fps", elapsed, clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Frame clock with pause and time scale.
#[derive(Debug)]
pub struct Clock {
    /// When the last frame occurred.
    last_frame: Instant,
    /// Accumulated animation time in seconds.
    elapsed: f64,
    /// Scaled time since the previous tick.
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed delta per tick instead of wall time.
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance by the wall time since the previous tick. Call once per frame.
    ///
    /// Returns the elapsed animation time.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.advance(self.fixed_delta.unwrap_or(raw_delta))
    }

    /// Advance by `dt` seconds of unscaled time.
    ///
    /// Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.delta_secs = if self.paused { 0.0 } else { dt * self.time_scale };
        self.elapsed += self.delta_secs as f64;
        self.elapsed()
    }

    /// Animation time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// Scaled time advanced by the last tick.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Freeze animation time. Frames keep being counted.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause, returning the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Use a fixed delta per tick (`None` for wall time).
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Set the time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Restart from zero.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.elapsed = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
        self.paused = false;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_tick_advances() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let elapsed = clock.tick();
        assert!(elapsed > 0.0);
        assert!(clock.delta() > 0.0);
        assert_eq!(clock.frame(), 1);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut clock = Clock::new();
        clock.advance(0.5);
        clock.pause();
        thread::sleep(Duration::from_millis(10));
        clock.tick();
        assert_eq!(clock.elapsed(), 0.5);
        assert_eq!(clock.delta(), 0.0);

        // no jump on resume
        clock.resume();
        clock.advance(0.25);
        assert_eq!(clock.elapsed(), 0.75);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = Clock::new();
        clock.set_time_scale(2.0);
        clock.advance(0.5);
        assert_eq!(clock.elapsed(), 1.0);

        clock.set_time_scale(-1.0);
        assert_eq!(clock.time_scale(), 0.0);
        clock.advance(1.0);
        assert_eq!(clock.elapsed(), 1.0);
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let mut clock = Clock::new();
        let mut prev = 0.0;
        for dt in [0.016, -0.5, f32::NAN, 0.0, f32::INFINITY, 0.033] {
            let t = clock.advance(dt);
            assert!(t >= prev);
            prev = t;
        }
        assert!((prev - 0.049).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = Clock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        thread::sleep(Duration::from_millis(20));
        clock.tick();
        assert!((clock.delta() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset() {
        let mut clock = Clock::new();
        clock.advance(3.0);
        clock.pause();
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
        assert!(!clock.is_paused());
    }
}
