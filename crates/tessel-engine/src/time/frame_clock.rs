use std::time::{Duration, Instant};

/// Frame timing snapshot handed to the app with every draw.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// hand the app a multi-second step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
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

    /// Resets the baseline, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        assert_eq!(clock.tick_at(start).frame_index, 0);
        assert_eq!(clock.tick_at(start + Duration::from_millis(16)).frame_index, 1);
    }

    #[test]
    fn dt_is_clamped() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick_at(t0);

        let ft = clock.tick_at(t0);
        assert_eq!(ft.dt, FrameClock::DEFAULT_DT_MIN.as_secs_f32());

        let ft = clock.tick_at(t0 + Duration::from_secs(5));
        assert_eq!(ft.dt, FrameClock::DEFAULT_DT_MAX.as_secs_f32());
    }

    #[test]
    fn dt_inside_clamps_passes_through() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        clock.tick_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_millis(20));
        assert!((ft.dt - 0.020).abs() < 1e-6);
    }
}
