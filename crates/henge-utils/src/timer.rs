//! Lightweight profiling timers.
//!
//! The engine is driven at camera frame rates, so every pipeline stage keeps a [`Timer`] and
//! exposes it through a `timers()` iterator. An [`FpsCounter`] aggregates them and logs a
//! per-second summary via [`log::debug!`].

use std::cell::Cell;
use std::fmt;
use std::time::{Duration, Instant};

/// Accumulates the time spent in a repeatedly executed pipeline stage.
pub struct Timer {
    name: &'static str,
    total: Cell<Duration>,
    count: Cell<u32>,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            total: Cell::new(Duration::ZERO),
            count: Cell::new(0),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs `f`, adding its wall-clock time to the accumulated total.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.total.set(self.total.get() + start.elapsed());
        self.count.set(self.count.get() + 1);
        result
    }

    /// Average duration per timed call since the last [`reset`](Self::reset).
    pub fn average(&self) -> Duration {
        match self.count.get() {
            0 => Duration::ZERO,
            n => self.total.get() / n,
        }
    }

    pub fn reset(&self) {
        self.total.set(Duration::ZERO);
        self.count.set(0);
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.1?}", self.name, self.average())
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Counts iterations of a frame loop and periodically logs the rate.
pub struct FpsCounter {
    name: String,
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Registers a completed frame.
    pub fn tick(&mut self) {
        self.tick_with([]);
    }

    /// Registers a completed frame and logs stage timers alongside the rate.
    ///
    /// Timers are reset whenever a summary line is emitted, so the logged averages cover
    /// roughly the preceding second.
    pub fn tick_with<'a>(&mut self, timers: impl IntoIterator<Item = &'a Timer>) {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames as f32 / elapsed.as_secs_f32();
            let stages = timers
                .into_iter()
                .map(|t| {
                    let s = t.to_string();
                    t.reset();
                    s
                })
                .collect::<Vec<_>>()
                .join(", ");
            if stages.is_empty() {
                log::debug!("{}: {:.1} FPS", self.name, fps);
            } else {
                log::debug!("{}: {:.1} FPS ({})", self.name, fps, stages);
            }
            self.frames = 0;
            self.window_start = Instant::now();
        }
    }
}
