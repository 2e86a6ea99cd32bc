//! Notifications raised to the shell and counters for logs/tests.

use crate::error::{DropReason, FailureReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// The anchor page (topmost visible) changed.
    CurrentPageChanged(usize),
    BookmarkRequested(usize),
    /// Raised once per page per document generation.
    DecodeFailed { index: usize, reason: FailureReason },
    Resized { width: u32, height: u32 },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ViewStats {
    pub decode_requests: u64,
    pub resize_requests: u64,
    pub decoded: u64,
    pub resized: u64,
    pub failed: u64,
    pub evicted: u64,
    pub dropped_stale: u64,
    pub dropped_out_of_bounds: u64,
    pub dropped_out_of_window: u64,
    pub dropped_evicted: u64,
    pub dropped_superseded: u64,
    /// Requests not sent because the worker queue was full.
    pub deferred: u64,
}

impl ViewStats {
    pub(super) fn count_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::StaleGeneration => self.dropped_stale += 1,
            DropReason::OutOfBounds => self.dropped_out_of_bounds += 1,
            DropReason::OutOfWindow => self.dropped_out_of_window += 1,
            DropReason::Evicted => self.dropped_evicted += 1,
            DropReason::Superseded => self.dropped_superseded += 1,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_stale
            + self.dropped_out_of_bounds
            + self.dropped_out_of_window
            + self.dropped_evicted
            + self.dropped_superseded
    }
}
