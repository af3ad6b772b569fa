use std::time::{Duration, Instant};

/// Average frame rate over fixed reporting intervals.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: f32,
    elapsed: f32,
    frames: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval: interval.as_secs_f32(),
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Records one frame of `dt` seconds. Returns the average FPS each time a
    /// full interval has accumulated, then starts the next interval.
    pub fn record(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed;
        self.elapsed = 0.0;
        self.frames = 0;
        Some(fps)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Redraw deadlines for an optional frame-rate cap.
#[derive(Debug, Clone)]
pub struct FramePacer {
    period: Option<Duration>,
    next: Option<Instant>,
}

impl FramePacer {
    /// `max_fps` of `None` or `0` means uncapped.
    pub fn new(max_fps: Option<u32>) -> Self {
        let period = max_fps
            .filter(|&fps| fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self { period, next: None }
    }

    pub fn is_capped(&self) -> bool {
        self.period.is_some()
    }

    /// Marks a frame as drawn at `now` and returns when the next one is due.
    pub fn frame_drawn(&mut self, now: Instant) -> Option<Instant> {
        let period = self.period?;
        // Stay on the grid unless we fell a whole period behind.
        let next = match self.next {
            Some(due) if due + period > now => due + period,
            _ => now + period,
        };
        self.next = Some(next);
        Some(next)
    }

    /// Deadline of the next frame, if capped and a frame has been drawn.
    pub fn next_due(&self) -> Option<Instant> {
        self.next
    }

    /// True when a redraw requested at `now` may proceed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_none_or(|due| now >= due)
    }
}
