use std::time::{Duration, Instant};

/// Completion counter that reports at each 10% boundary
#[derive(Debug, Clone)]
pub struct Progress {
    total: usize,
    completed: usize,
    last_decile: usize,
    started: Instant,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            last_decile: 0,
            started: Instant::now(),
        }
    }

    /// Records one completion
    ///
    /// Returns the percentage reached if this completion crossed a new 10%
    /// boundary, otherwise `None`. Each boundary is reported at most once;
    /// boundaries skipped by small totals are folded into the next report.
    pub fn record(&mut self) -> Option<usize> {
        if self.completed >= self.total {
            return None;
        }
        self.completed += 1;

        let decile = self.completed * 10 / self.total;
        if decile > self.last_decile {
            self.last_decile = decile;
            Some(decile * 10)
        } else {
            None
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Completions per second since the counter was created
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}
