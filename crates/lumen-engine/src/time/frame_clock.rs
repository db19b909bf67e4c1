use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    pub now: Instant,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// hand downstream code a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline, e.g. after the window is restored.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling frame-time statistics over a fixed number of frames.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: u32,
    frames: u32,
    accumulated: f32,
    last_average: Option<f32>,
}

impl FrameStats {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            frames: 0,
            accumulated: 0.0,
            last_average: None,
        }
    }

    /// Records one frame. Returns the average frame time (seconds) each time a
    /// full window has been collected.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.accumulated += dt;
        if self.frames < self.window {
            return None;
        }

        let avg = self.accumulated / self.frames as f32;
        self.frames = 0;
        self.accumulated = 0.0;
        self.last_average = Some(avg);
        Some(avg)
    }

    pub fn fps(&self) -> Option<f32> {
        self.last_average.filter(|a| *a > 0.0).map(|a| 1.0 / a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_counts_frames_and_clamps() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(5));
        let a = clock.tick();
        let b = clock.tick();
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(b.dt >= 0.001 && b.dt <= 0.005);
    }

    #[test]
    fn stats_report_once_per_window() {
        let mut stats = FrameStats::new(4);
        assert_eq!(stats.record(0.01), None);
        assert_eq!(stats.record(0.02), None);
        assert_eq!(stats.record(0.01), None);
        let avg = stats.record(0.02).unwrap();
        assert!((avg - 0.015).abs() < 1e-6);
        assert!((stats.fps().unwrap() - 66.666).abs() < 0.01);
        assert_eq!(stats.record(0.01), None);
    }
}
