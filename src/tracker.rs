//! Request tracker: which pages have a decode request outstanding.
//!
//! Interactive-thread only. Slots are indexed by page index and sized at
//! document load. Each request gets a fresh [`RequestId`] so a late response
//! can be told apart from the one the tracker is currently waiting for.

use std::ops::RangeInclusive;

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Default)]
pub struct RequestTracker {
    slots: Vec<Option<RequestId>>,
    pending: usize,
    next_id: u64,
}

impl RequestTracker {
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: vec![None; page_count],
            pending: 0,
            next_id: 1,
        }
    }

    /// Drop every entry and resize for a new document. Ids keep increasing.
    pub fn reset(&mut self, page_count: usize) {
        self.slots.clear();
        self.slots.resize(page_count, None);
        self.pending = 0;
    }

    /// Mark `index` pending. Returns `None` if it already was (or is out of range).
    pub fn add(&mut self, index: usize) -> Option<RequestId> {
        let slot = self.slots.get_mut(index)?;
        if slot.is_some() {
            return None;
        }
        let id = RequestId(self.next_id);
        self.next_id += 1;
        *slot = Some(id);
        self.pending += 1;
        Some(id)
    }

    pub fn contains(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    pub fn get(&self, index: usize) -> Option<RequestId> {
        self.slots.get(index).copied().flatten()
    }

    /// Forget `index` unconditionally.
    pub fn remove(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.pending -= 1;
                true
            }
            _ => false,
        }
    }

    /// Forget `index` only if `id` is the request currently outstanding.
    pub fn complete(&mut self, index: usize, id: RequestId) -> bool {
        if self.get(index) == Some(id) {
            self.remove(index)
        } else {
            false
        }
    }

    /// Cancel every pending index outside `keep`. Returns the cancelled indices.
    pub fn cancel_outside(&mut self, keep: Option<RangeInclusive<usize>>) -> Vec<usize> {
        let stale: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| slot.is_some() && !keep.as_ref().is_some_and(|k| k.contains(i)))
            .map(|(i, _)| i)
            .collect();
        for &i in &stale {
            trace!("tracker: cancel page {i}");
            self.remove(i);
        }
        stale
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.pending = 0;
    }

    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending == 0
    }
}
