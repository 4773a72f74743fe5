//! Infections that started within a trailing time window.
//!
//! A case counts as active at time `t` while `case_time > t - window`.
//! Infections arrive in non-decreasing time order, so expired cases are
//! always at the front of the deque.

use std::collections::VecDeque;

#[derive(Clone, Debug, Default)]
pub struct ActiveCases {
    window: u64,
    times: VecDeque<u64>,
    peak: usize,
}

impl ActiveCases {
    /// `window` is in seconds.
    #[must_use]
    pub fn new(window: u64) -> Self {
        ActiveCases {
            window,
            times: VecDeque::new(),
            peak: 0,
        }
    }

    /// Records an infection at `time`.
    pub fn record(&mut self, time: u64) {
        debug_assert!(self.times.back().is_none_or(|&last| last <= time));
        self.times.push_back(time);
    }

    /// Drops cases that are no longer active at `current` and updates the peak.
    pub fn advance(&mut self, current: u64) {
        if let Some(cutoff) = current.checked_sub(self.window) {
            while self.times.front().is_some_and(|&time| time <= cutoff) {
                self.times.pop_front();
            }
        }
        self.peak = self.peak.max(self.times.len());
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.times.len()
    }

    /// Largest count seen after any call to [`advance`](Self::advance).
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak
    }
}
