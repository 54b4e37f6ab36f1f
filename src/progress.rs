//! Progress reporting for long-running filters

/// Receives progress updates as a fraction in `[0, 1]`
pub trait ProgressObserver: Send + Sync {
    /// Called with the completed fraction
    fn progress(&self, fraction: f32);
}

impl<F> ProgressObserver for F
where
    F: Fn(f32) + Send + Sync,
{
    fn progress(&self, fraction: f32) {
        self(fraction)
    }
}

/// Throttles per-pixel completion into a bounded number of observer calls
pub struct ProgressReporter<'a> {
    observer: Option<&'a dyn ProgressObserver>,
    total: usize,
    completed: usize,
    updates: usize,
    last_step: usize,
}

impl<'a> ProgressReporter<'a> {
    /// Default number of updates over a full run
    pub const DEFAULT_UPDATES: usize = 100;

    /// Create a reporter for `total` pixels, emitting at most `updates` intermediate calls
    pub fn new(observer: Option<&'a dyn ProgressObserver>, total: usize, updates: usize) -> Self {
        if let Some(observer) = observer {
            observer.progress(0.0);
        }
        Self {
            observer,
            total,
            completed: 0,
            updates,
            last_step: 0,
        }
    }

    /// Record one finished pixel
    #[inline]
    pub fn completed_pixel(&mut self) {
        self.completed += 1;
        if self.completed > self.total {
            return;
        }

        // emit only when the completed fraction crosses the next 1/updates step
        let step = (self.completed as u128 * self.updates as u128 / self.total as u128) as usize;
        if step > self.last_step {
            self.last_step = step;
            if let Some(observer) = self.observer {
                observer.progress(self.completed as f32 / self.total as f32);
            }
        }
    }

    /// Number of pixels recorded so far
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Report completion
    pub fn finish(self) {
        if let Some(observer) = self.observer {
            observer.progress(1.0);
        }
    }
}
