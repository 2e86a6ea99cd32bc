//! Viewport controller: what is visible, what to load, what to free, and
//! where to scroll after a re-layout.
//!
//! The decoded-page cache is a spatial window, not an LRU: it holds the
//! pages overlapping the viewport plus one neighbor on each side. Anything
//! outside that window is evicted on the next pass.
//!
//! Spans are monotonic in page index, so the visible set is one contiguous
//! index range found by binary search.

use std::ops::RangeInclusive;

use log::trace;

use crate::page::PageDescriptor;
use crate::tracker::RequestTracker;

/// Visible slice of the scroll surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_top: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(scroll_top: u32, height: u32) -> Self {
        Self { scroll_top, height }
    }
}

/// What the user is looking at: a page and how far into it the viewport top sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub index: usize,
    /// Portion of the page above the viewport top, relative to page height.
    /// Negative when the viewport top sits in the gap above the page.
    pub fraction: f64,
}

/// Load/evict decisions for one viewport pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Plan {
    pub visible: Option<RangeInclusive<usize>>,
    /// Pages to request, visible ones first.
    pub load: Vec<usize>,
    pub evict: Vec<usize>,
}

/// Indices of pages overlapping the viewport.
pub fn visible_range(pages: &[PageDescriptor], vp: Viewport) -> Option<RangeInclusive<usize>> {
    let first = pages.partition_point(|p| p.span().end <= vp.scroll_top);
    let count = pages[first..]
        .iter()
        .take_while(|p| p.span().overlaps(vp.scroll_top, vp.height))
        .count();
    (count > 0).then(|| first..=first + count - 1)
}

/// Visible range widened by one page on each side.
pub fn keep_window(visible: &RangeInclusive<usize>, page_count: usize) -> RangeInclusive<usize> {
    let last = page_count.saturating_sub(1);
    visible.start().saturating_sub(1)..=(*visible.end() + 1).min(last)
}

pub fn in_window(window: Option<&RangeInclusive<usize>>, index: usize) -> bool {
    window.is_some_and(|w| w.contains(&index))
}

/// Decide which pages to request and which to evict.
///
/// A page is requested when it is inside the window, has no pixels, is not
/// already pending, and has not failed in this document. A decoded page is
/// evicted when it is outside the window.
pub fn plan(pages: &[PageDescriptor], vp: Viewport, tracker: &RequestTracker) -> Plan {
    let visible = visible_range(pages, vp);
    let window = visible.as_ref().map(|v| keep_window(v, pages.len()));

    let wants = |i: usize| {
        let p = &pages[i];
        !p.is_decoded() && !tracker.contains(i) && p.failure().is_none()
    };

    let mut load = Vec::new();
    if let (Some(v), Some(w)) = (&visible, &window) {
        load.extend(v.clone().filter(|&i| wants(i)));
        // look-ahead first, then look-behind
        if *w.end() > *v.end() && wants(*w.end()) {
            load.push(*w.end());
        }
        if *w.start() < *v.start() && wants(*w.start()) {
            load.push(*w.start());
        }
    }

    let evict: Vec<usize> = pages
        .iter()
        .filter(|p| p.is_decoded() && !in_window(window.as_ref(), p.index()))
        .map(|p| p.index())
        .collect();

    trace!("viewport: visible={visible:?} window={window:?} load={load:?} evict={evict:?}");
    Plan {
        visible,
        load,
        evict,
    }
}

/// Record the anchor for the current scroll position.
pub fn capture_anchor(pages: &[PageDescriptor], vp: Viewport) -> Option<Anchor> {
    let visible = visible_range(pages, vp)?;
    let index = *visible.start();
    let span = pages[index].span();
    let height = span.height();
    let fraction = if height == 0 {
        0.0
    } else {
        (vp.scroll_top as f64 - span.start as f64) / height as f64
    };
    Some(Anchor { index, fraction })
}

/// Scroll offset that puts the anchor back where it was, clamped to `max_scroll`.
pub fn restore_anchor(pages: &[PageDescriptor], anchor: Anchor, max_scroll: u32) -> Option<u32> {
    let span = pages.get(anchor.index)?.span();
    let y = span.start as f64 + anchor.fraction * span.height() as f64;
    Some((y.round().max(0.0) as u32).min(max_scroll))
}

/// Page under the absolute row `y`, if any (rows in the inter-page gap hit nothing).
pub fn page_at(pages: &[PageDescriptor], y: u32) -> Option<usize> {
    let i = pages.partition_point(|p| p.span().end <= y);
    pages.get(i).filter(|p| p.span().contains(y)).map(|p| p.index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Size, Span};
    use crate::layout::{LayoutParams, compute_layout};
    use crate::page::{PageBuffer, PageState};
    use crate::settings::ScaleParams;
    use crate::source::PageId;
    use image::RgbaImage;
    use std::sync::Arc;

    const SPACING: u32 = 10;

    fn params() -> LayoutParams {
        LayoutParams {
            viewport_width: 800,
            viewport_height: 500,
            spacing: SPACING,
            placeholder_margin: 20,
            scale: ScaleParams::new(800, 1.0),
        }
    }

    fn doc(n: usize, h: u32) -> Vec<PageDescriptor> {
        let mut pages: Vec<PageDescriptor> = (0..n)
            .map(|i| PageDescriptor::new(i, PageId::memory(format!("p{i}"), vec![0u8])))
            .collect();
        for p in &mut pages {
            p.set_estimated(Size::new(400, h));
        }
        compute_layout(&mut pages, &params());
        pages
    }

    fn decode(page: &mut PageDescriptor, w: u32, h: u32) {
        let buf = PageBuffer::new(Arc::new(RgbaImage::new(w, h)), None);
        page.set_decoded(buf, Size::new(w, h));
    }

    #[test]
    fn visible_range_uses_half_open_overlap() {
        // spans: [0,100) [110,210) [220,320) [330,430) ...
        let pages = doc(10, 100);
        assert_eq!(visible_range(&pages, Viewport::new(0, 100)), Some(0..=0));
        assert_eq!(visible_range(&pages, Viewport::new(0, 111)), Some(0..=1));
        assert_eq!(visible_range(&pages, Viewport::new(100, 10)), None); // gap only
        assert_eq!(visible_range(&pages, Viewport::new(150, 300)), Some(1..=4));
        assert_eq!(visible_range(&pages, Viewport::new(5000, 100)), None);
    }

    #[test]
    fn plan_requests_visible_then_neighbors() {
        let pages = doc(10, 100);
        let tracker = RequestTracker::new(10);
        let plan = plan(&pages, Viewport::new(220, 150), &tracker);
        assert_eq!(plan.visible, Some(2..=3));
        assert_eq!(plan.load, vec![2, 3, 4, 1]);
        assert!(plan.evict.is_empty());
    }

    #[test]
    fn plan_skips_pending_and_failed() {
        let mut pages = doc(10, 100);
        let mut tracker = RequestTracker::new(10);
        tracker.add(2);
        pages[3].mark_failed(crate::error::FailureReason::DecodeCorruptData);
        let plan = plan(&pages, Viewport::new(220, 150), &tracker);
        assert_eq!(plan.load, vec![4, 1]);
    }

    #[test]
    fn plan_evicts_outside_window_only() {
        let mut pages = doc(10, 100);
        for i in [0, 1, 4, 5, 6] {
            decode(&mut pages[i], 400, 100);
        }
        compute_layout(&mut pages, &params());
        let tracker = RequestTracker::new(10);
        // visible: page 3 only → window 2..=4
        let plan = plan(&pages, Viewport::new(330, 50), &tracker);
        assert_eq!(plan.visible, Some(3..=3));
        assert_eq!(plan.evict, vec![0, 1, 5, 6]);
        assert_eq!(plan.load, vec![3, 2]);
    }

    #[test]
    fn nothing_visible_evicts_everything() {
        let mut pages = doc(3, 100);
        decode(&mut pages[2], 400, 100);
        compute_layout(&mut pages, &params());
        let plan = plan(&pages, Viewport::new(10_000, 100), &RequestTracker::new(3));
        assert_eq!(plan.visible, None);
        assert!(plan.load.is_empty());
        assert_eq!(plan.evict, vec![2]);
    }

    #[test]
    fn anchor_survives_estimate_change() {
        // Page 5 decoded at 400: everything else is estimated at 400.
        let mut pages = doc(10, 100);
        decode(&mut pages[5], 400, 400);
        compute_layout(&mut pages, &params());
        assert_eq!(pages[2].state(), PageState::Estimated);
        assert_eq!(pages[2].span(), Span::new(820, 1220));

        // Anchor page 2 at one half.
        let vp = Viewport::new(1020, 500);
        let anchor = capture_anchor(&pages, vp).unwrap();
        assert_eq!(anchor.index, 2);
        assert_eq!(anchor.fraction, 0.5);

        // Page 0 decodes at 800 tall: mean becomes 600.
        decode(&mut pages[0], 400, 800);
        let layout = compute_layout(&mut pages, &params());
        let new_span = pages[2].span();
        assert_eq!(new_span.height(), 600);
        let max = layout.content_height - vp.height;
        let top = restore_anchor(&pages, anchor, max).unwrap();
        let fraction = (top - new_span.start) as f64 / new_span.height() as f64;
        assert_eq!(fraction, 0.5);
    }

    #[test]
    fn restore_clamps_to_scroll_range() {
        let pages = doc(2, 100);
        let anchor = Anchor {
            index: 1,
            fraction: 0.9,
        };
        assert_eq!(restore_anchor(&pages, anchor, 50), Some(50));
        assert_eq!(restore_anchor(&pages, Anchor { index: 7, fraction: 0.0 }, 50), None);
    }

    #[test]
    fn page_at_ignores_gaps() {
        let pages = doc(3, 100);
        assert_eq!(page_at(&pages, 0), Some(0));
        assert_eq!(page_at(&pages, 99), Some(0));
        assert_eq!(page_at(&pages, 105), None);
        assert_eq!(page_at(&pages, 110), Some(1));
        assert_eq!(page_at(&pages, 9999), None);
    }
}
