//! Continuous-scroll page view: the composition root of the core.
//!
//! Threads:
//!   interactive : owns `View` (pages, tracker, layout, scroll position)
//!   decode      : owns the decoder and page source (see `worker`)
//!
//! Every state change runs the same two steps:
//!   1. re-layout, then scroll back to the anchor captured beforehand
//!   2. viewport pass: evict outside the window, request inside it
//!
//! Decode results are pulled by the caller (`pump`, `wait`, `settle`) rather
//! than pushed, so the whole View can be driven from a test without an event
//! loop. Each result is validated on arrival against the document generation,
//! page bounds, the keep-window and the current scale; anything that no longer
//! fits is dropped and counted, never applied.

mod events;

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::decode::scaled_size;
use crate::error::{DropReason, PageError};
use crate::layout::{Layout, LayoutParams, compute_layout};
use crate::page::PageDescriptor;
use crate::settings::{Color, ScaleParams, Settings, clamp_zoom};
use crate::source::PageId;
use crate::tracker::RequestTracker;
use crate::viewport::{self, Anchor, Viewport, capture_anchor, restore_anchor};
use crate::worker::{DecodeRequest, DecodeResponse, DecodeWorker, Job, Outcome, SubmitError};

pub use events::{ViewEvent, ViewStats};

pub struct View {
    worker: DecodeWorker,
    settings: Settings,
    zoom: f64,
    zoom_step: f64,
    placeholder_margin: u32,
    viewport_width: u32,
    viewport_height: u32,
    scroll_top: u32,
    pages: Vec<PageDescriptor>,
    tracker: RequestTracker,
    generation: u64,
    layout: Layout,
    anchor: Option<Anchor>,
    current: Option<usize>,
    /// Set when the last pass left wanted pages unrequested because the queue was full.
    backlog: bool,
    /// Keep-window last announced to the worker, with its generation.
    sent_window: Option<(u64, RangeInclusive<usize>)>,
    events: Vec<ViewEvent>,
    stats: ViewStats,
}

impl View {
    /// Create an empty view. `width`/`height` are the viewport size in pixels.
    pub fn new(
        worker: DecodeWorker,
        settings: Settings,
        config: &ViewerConfig,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            worker,
            settings,
            zoom: 1.0,
            zoom_step: config.zoom_step,
            placeholder_margin: config.placeholder_margin,
            viewport_width: width,
            viewport_height: height,
            scroll_top: 0,
            pages: Vec::new(),
            tracker: RequestTracker::new(0),
            generation: 0,
            layout: Layout::default(),
            anchor: None,
            current: None,
            backlog: false,
            sent_window: None,
            events: Vec::new(),
            stats: ViewStats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Replace the current document and start at `start_index`.
    pub fn load(&mut self, sequence: Vec<PageId>, start_index: usize) {
        self.generation += 1;
        self.worker.retire(self.generation);
        info!(
            "view: loading {} page(s), generation {}, start page {start_index}",
            sequence.len(),
            self.generation
        );
        self.pages = sequence
            .into_iter()
            .enumerate()
            .map(|(i, id)| PageDescriptor::new(i, id))
            .collect();
        self.tracker.reset(self.pages.len());
        self.scroll_top = 0;
        self.anchor = None;
        self.current = None;
        self.backlog = false;
        self.relayout_with(None);
        if start_index > 0 {
            self.jump_to(start_index);
        } else {
            self.pass();
        }
    }

    /// Scroll so that page `index` starts at the top of the viewport.
    pub fn jump_to(&mut self, index: usize) {
        let Some(last) = self.pages.len().checked_sub(1) else {
            return;
        };
        let index = index.min(last);
        let y = self.pages[index].span().start;
        debug!("view: jump to page {index} (y={y})");
        self.scroll_top = y.min(self.max_scroll());
        self.pass();
    }

    pub fn scroll_to(&mut self, y: u32) {
        self.scroll_top = y.min(self.max_scroll());
        self.pass();
    }

    pub fn scroll_by(&mut self, dy: i64) {
        let y = (i64::from(self.scroll_top) + dy).clamp(0, i64::from(u32::MAX)) as u32;
        self.scroll_to(y);
    }

    /// Viewport changed size. The anchor page stays put.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.viewport_width, self.viewport_height) {
            return;
        }
        let anchor = capture_anchor(&self.pages, self.viewport());
        debug!(
            "view: resize {}x{} -> {width}x{height}",
            self.viewport_width, self.viewport_height
        );
        self.viewport_width = width;
        self.viewport_height = height;
        self.relayout_with(anchor);
        self.pass();
        self.events.push(ViewEvent::Resized { width, height });
    }

    /// Apply new display settings.
    ///
    /// A change of `max_width` keeps decoded pixels but marks every decoded
    /// page for a resize-only recompute from its natural-resolution image.
    pub fn on_settings_changed(&mut self, settings: Settings) {
        info!(
            "view: settings max_width={} spacing={} background={}",
            settings.max_width, settings.spacing, settings.background
        );
        let old_scale = self.scale();
        self.settings = settings;
        self.rescale_from(old_scale);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let old_scale = self.scale();
        self.zoom = clamp_zoom(zoom);
        debug!("view: zoom {:.2} -> {:.2}", old_scale.zoom, self.zoom);
        self.rescale_from(old_scale);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step);
    }

    pub fn zoom_reset(&mut self) {
        self.set_zoom(1.0);
    }

    /// Request a bookmark for the page under viewport row `viewport_y`.
    pub fn bookmark_at(&mut self, viewport_y: u32) -> Option<usize> {
        let index = viewport::page_at(&self.pages, self.scroll_top.saturating_add(viewport_y))?;
        self.events.push(ViewEvent::BookmarkRequested(index));
        Some(index)
    }

    /// Request a bookmark for the current (anchor) page.
    pub fn bookmark_current(&mut self) -> Option<usize> {
        let index = self.current?;
        self.events.push(ViewEvent::BookmarkRequested(index));
        Some(index)
    }

    /// Clear a page's failure so the next pass may request it again.
    pub fn retry(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index)
            && page.failure().is_some()
        {
            info!("view: retrying page {index}");
            page.clear_failure();
            self.pass();
        }
    }

    // -----------------------------------------------------------------------
    // Decode results
    // -----------------------------------------------------------------------

    /// Apply every result that has already arrived. Returns how many changed a page.
    pub fn pump(&mut self) -> usize {
        self.drain_results(0, 0)
    }

    /// Block up to `timeout` for one result, then apply everything available.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        let Some(first) = self.worker.recv_timeout(timeout) else {
            return 0;
        };
        let applied = usize::from(self.absorb(first));
        self.drain_results(1, applied)
    }

    /// Absorb all queued results, then re-layout once if anything changed.
    fn drain_results(&mut self, mut received: usize, mut applied: usize) -> usize {
        while let Some(res) = self.worker.try_recv() {
            received += 1;
            if self.absorb(res) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.refresh();
        } else if received > 0 {
            // a freed queue slot may let deferred pages through
            self.pass();
        }
        applied
    }

    /// Keep applying results until no request is outstanding or deferred, or
    /// until `timeout` passes. Returns true if the view settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let idle = self.tracker.is_idle();
            if idle && !self.backlog {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "view: {} request(s) still pending after {:?}",
                    self.tracker.pending_count(),
                    timeout
                );
                return false;
            }
            if idle {
                // everything was deferred; retry once the worker frees a slot
                self.pass();
                if self.tracker.is_idle() {
                    std::thread::yield_now();
                }
            } else {
                self.wait(deadline - now);
            }
        }
    }

    /// Apply one result and, if it changed anything, re-layout and re-evaluate.
    pub fn apply_response(&mut self, res: DecodeResponse) -> bool {
        let applied = self.absorb(res);
        if applied {
            self.refresh();
        }
        applied
    }

    /// Validate and store one result without re-layout.
    fn absorb(&mut self, res: DecodeResponse) -> bool {
        let DecodeResponse {
            generation,
            index,
            ticket,
            params,
            outcome,
        } = res;

        if generation != self.generation {
            return self.drop_result(index, DropReason::StaleGeneration);
        }
        if index >= self.pages.len() {
            return self.drop_result(index, DropReason::OutOfBounds);
        }
        self.tracker.complete(index, ticket);

        match outcome {
            Outcome::Failed(err) => {
                let Some(reason) = err.reason() else {
                    return false;
                };
                let page = &mut self.pages[index];
                if page.is_decoded() || page.failure().is_some() {
                    return false;
                }
                warn!("view: page {index} failed: {err}");
                page.mark_failed(reason);
                self.stats.failed += 1;
                self.events.push(ViewEvent::DecodeFailed { index, reason });
                true
            }
            Outcome::Decoded { buffer, scaled_size } => {
                if params != self.scale() {
                    return self.drop_result(index, DropReason::Superseded);
                }
                if !self.in_window(index) {
                    return self.drop_result(index, DropReason::OutOfWindow);
                }
                let page = &mut self.pages[index];
                if page.is_decoded() && !page.is_rescale_pending() {
                    debug!("view: page {index} already decoded, ignoring duplicate");
                    return false;
                }
                if page.set_decoded(buffer, scaled_size) {
                    self.stats.decoded += 1;
                    true
                } else {
                    false
                }
            }
            Outcome::Resized { scaled, scaled_size } => {
                if params != self.scale() {
                    return self.drop_result(index, DropReason::Superseded);
                }
                let page = &mut self.pages[index];
                if !page.is_decoded() {
                    return self.drop_result(index, DropReason::Evicted);
                }
                if !page.is_rescale_pending() {
                    return false;
                }
                if page.set_rescaled(scaled, scaled_size) {
                    self.stats.resized += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn drop_result(&mut self, index: usize, reason: DropReason) -> bool {
        debug!("view: {}", PageError::RequestDropped { index, reason });
        self.stats.count_drop(reason);
        false
    }

    // -----------------------------------------------------------------------
    // Layout + viewport pass
    // -----------------------------------------------------------------------

    fn refresh(&mut self) {
        let anchor = capture_anchor(&self.pages, self.viewport());
        self.relayout_with(anchor);
        self.pass();
    }

    fn rescale_from(&mut self, old_scale: ScaleParams) {
        let anchor = capture_anchor(&self.pages, self.viewport());
        let scale = self.scale();
        if scale != old_scale {
            let mut marked = 0;
            for page in self.pages.iter_mut().filter(|p| p.is_decoded()) {
                if let Some(natural) = page.natural_size()
                    && page.mark_rescale(scaled_size(natural, scale))
                {
                    marked += 1;
                }
            }
            // outstanding requests carry the old scale; let the pass re-issue them
            self.tracker.clear();
            debug!("view: scale changed, {marked} decoded page(s) marked for resize");
        }
        self.relayout_with(anchor);
        self.pass();
    }

    fn relayout_with(&mut self, anchor: Option<Anchor>) {
        let params = LayoutParams {
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            spacing: self.settings.spacing,
            placeholder_margin: self.placeholder_margin,
            scale: self.scale(),
        };
        self.layout = compute_layout(&mut self.pages, &params);
        let max = self.max_scroll();
        self.scroll_top = match anchor.and_then(|a| restore_anchor(&self.pages, a, max)) {
            Some(y) => y,
            None => self.scroll_top.min(max),
        };
    }

    /// Evict, cancel, request; then update anchor and current page.
    fn pass(&mut self) {
        let vp = self.viewport();
        let plan = viewport::plan(&self.pages, vp, &self.tracker);
        self.backlog = false;
        let window = plan
            .visible
            .as_ref()
            .map(|v| viewport::keep_window(v, self.pages.len()));

        for &i in &plan.evict {
            if self.pages[i].evict() {
                self.stats.evicted += 1;
                debug!("view: evicted page {i}");
            }
        }
        self.tracker.cancel_outside(window.clone());
        if let Some(keep) = &window {
            let current = (self.generation, keep.clone());
            if self.sent_window.as_ref() != Some(&current) {
                self.worker.retain_window(self.generation, keep.clone());
                self.sent_window = Some(current);
            }
        }

        for &i in &plan.load {
            let job = Job::Decode {
                id: self.pages[i].id().clone(),
            };
            if !self.submit(i, job) {
                break;
            }
            self.stats.decode_requests += 1;
        }

        let rescale: Vec<usize> = window
            .into_iter()
            .flatten()
            .filter(|&i| self.pages[i].is_rescale_pending() && !self.tracker.contains(i))
            .collect();
        for i in rescale {
            let Some(natural) = self.pages[i].buffer().map(|b| b.natural().clone()) else {
                continue;
            };
            if !self.submit(i, Job::Resize { natural }) {
                break;
            }
            self.stats.resize_requests += 1;
        }

        self.anchor = capture_anchor(&self.pages, vp);
        if let Some(index) = plan.visible.map(|v| *v.start())
            && self.current != Some(index)
        {
            debug!("view: current page {index}");
            self.current = Some(index);
            self.events.push(ViewEvent::CurrentPageChanged(index));
        }
    }

    /// Track and send one request. Returns false when the worker can take no more.
    fn submit(&mut self, index: usize, job: Job) -> bool {
        let Some(ticket) = self.tracker.add(index) else {
            return true;
        };
        let req = DecodeRequest {
            generation: self.generation,
            index,
            ticket,
            params: self.scale(),
            job,
        };
        match self.worker.submit(req) {
            Ok(()) => true,
            Err(SubmitError::Full) => {
                debug!("view: worker queue full, deferring page {index}");
                self.tracker.remove(index);
                self.stats.deferred += 1;
                self.backlog = true;
                false
            }
            Err(SubmitError::Disconnected) => {
                warn!("view: decode worker is gone, page {index} not requested");
                self.tracker.remove(index);
                false
            }
        }
    }

    fn in_window(&self, index: usize) -> bool {
        let visible = viewport::visible_range(&self.pages, self.viewport());
        let window = visible.map(|v| viewport::keep_window(&v, self.pages.len()));
        viewport::in_window(window.as_ref(), index)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&PageDescriptor> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.scroll_top, self.viewport_height)
    }

    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    pub fn max_scroll(&self) -> u32 {
        self.layout.content_height.saturating_sub(self.viewport_height)
    }

    pub fn content_height(&self) -> u32 {
        self.layout.content_height
    }

    pub fn content_width(&self) -> u32 {
        self.layout.content_width
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn background(&self) -> Color {
        self.settings.background
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scale(&self) -> ScaleParams {
        ScaleParams::new(self.settings.max_width, self.zoom)
    }

    pub fn pending_requests(&self) -> usize {
        self.tracker.pending_count()
    }

    /// True when wanted pages are waiting for room in the worker queue.
    pub fn has_backlog(&self) -> bool {
        self.backlog
    }

    pub fn is_pending(&self, index: usize) -> bool {
        self.tracker.contains(index)
    }

    pub fn stats(&self) -> &ViewStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageDecoder;
    use crate::error::FailureReason;
    use crate::geometry::Size;
    use crate::source::FsSource;
    use crate::test_util::png;
    use crate::tracker::RequestId;
    use crate::worker::run_job;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn document(n: usize) -> Vec<PageId> {
        (0..n)
            .map(|i| PageId::memory(format!("{i:03}.png"), png(400, 600)))
            .collect()
    }

    fn view() -> View {
        let worker = DecodeWorker::spawn(ImageDecoder::default(), FsSource, 16).unwrap();
        View::new(worker, Settings::default(), &ViewerConfig::default(), 800, 500)
    }

    fn failed(view: &View, index: usize) -> DecodeResponse {
        DecodeResponse {
            generation: view.generation(),
            index,
            ticket: view.tracker.get(index).unwrap_or(RequestId(u64::MAX)),
            params: view.scale(),
            outcome: Outcome::Failed(PageError::CorruptData("bad".into())),
        }
    }

    /// Run a job synchronously as if the worker had produced it for `view`.
    fn produce(view: &View, index: usize, params: ScaleParams, job: Job) -> DecodeResponse {
        let req = DecodeRequest {
            generation: view.generation(),
            index,
            ticket: RequestId(u64::MAX),
            params,
            job,
        };
        run_job(&ImageDecoder::default(), &FsSource, req)
    }

    fn decode_job(view: &View, index: usize) -> Job {
        Job::Decode {
            id: view.pages()[index].id().clone(),
        }
    }

    fn window(view: &View) -> Option<std::ops::RangeInclusive<usize>> {
        viewport::visible_range(view.pages(), view.viewport())
            .map(|v| viewport::keep_window(&v, view.page_count()))
    }

    #[test]
    fn load_builds_placeholder_document() {
        let mut v = view();
        v.load(document(10), 0);
        assert_eq!(v.page_count(), 10);
        for (i, p) in v.pages().iter().enumerate() {
            assert_eq!(p.index(), i);
            assert_eq!(p.span().height(), 480);
        }
        assert_eq!(v.content_height(), 10 * 480 + 9 * 10);
        assert_eq!(v.background(), Settings::default().background);
        assert_eq!(v.current_page(), Some(0));
        assert_eq!(v.drain_events(), vec![ViewEvent::CurrentPageChanged(0)]);
        // pages 0 and 1 visible, plus one look-ahead
        assert_eq!(v.pending_requests(), 3);
    }

    #[test]
    fn load_at_start_index_scrolls_to_page() {
        let mut v = view();
        v.load(document(10), 3);
        assert_eq!(v.scroll_top(), v.pages()[3].span().start);
        assert_eq!(v.scroll_top(), 1470);
        assert_eq!(v.current_page(), Some(3));
        assert!(v.pages().iter().all(|p| !p.is_decoded()));
    }

    #[test]
    fn settle_keeps_decoded_pages_inside_window() {
        let mut v = view();
        v.load(document(10), 0);
        assert!(v.settle(TIMEOUT));
        let w = window(&v).unwrap();
        assert!(v.pages()[0].is_decoded());
        for p in v.pages().iter().filter(|p| p.is_decoded()) {
            assert!(w.contains(&p.index()), "page {} decoded outside {w:?}", p.index());
            assert_eq!(p.scaled_size(), Size::new(400, 600));
        }
        // estimates follow the decoded mean
        assert_eq!(v.pages()[9].scaled_size(), Size::new(400, 600));
    }

    #[test]
    fn stale_and_out_of_bounds_results_are_dropped() {
        let mut v = view();
        v.load(document(4), 0);
        let mut stale = failed(&v, 0);
        stale.generation -= 1;
        assert!(!v.apply_response(stale));
        assert!(!v.apply_response(failed(&v, 99)));
        assert_eq!(v.stats().dropped_stale, 1);
        assert_eq!(v.stats().dropped_out_of_bounds, 1);
        assert_eq!(v.pages()[0].failure(), None);
    }

    #[test]
    fn failure_is_reported_once_and_retry_clears_it() {
        let mut v = view();
        v.load(document(4), 0);
        v.drain_events();
        assert!(v.apply_response(failed(&v, 1)));
        assert!(!v.apply_response(failed(&v, 1)));
        assert_eq!(
            v.drain_events(),
            vec![ViewEvent::DecodeFailed {
                index: 1,
                reason: FailureReason::DecodeCorruptData
            }]
        );
        assert_eq!(v.stats().failed, 1);
        assert!(!v.is_pending(1));

        v.retry(1);
        assert_eq!(v.page(1).unwrap().failure(), None);
        assert!(v.is_pending(1));
    }

    #[test]
    fn duplicate_decode_is_ignored() {
        let mut v = view();
        v.load(document(4), 0);
        assert!(v.settle(TIMEOUT));
        let decoded = v.stats().decoded;
        let res = produce(&v, 0, v.scale(), decode_job(&v, 0));
        let top = v.scroll_top();
        assert!(!v.apply_response(res));
        assert_eq!(v.stats().decoded, decoded);
        assert_eq!(v.scroll_top(), top);
    }

    #[test]
    fn decode_for_page_outside_window_is_dropped() {
        let mut v = view();
        v.load(document(10), 0);
        let w = window(&v).unwrap();
        assert_eq!(w, 0..=2);
        let res = produce(&v, 8, v.scale(), decode_job(&v, 8));
        assert!(matches!(res.outcome, Outcome::Decoded { .. }));

        assert!(!v.apply_response(res));
        assert_eq!(v.stats().dropped_out_of_window, 1);
        assert_eq!(v.stats().decoded, 0);
        assert!(!v.pages()[8].is_decoded());
        assert!(v.pages().iter().filter(|p| p.is_decoded()).all(|p| w.contains(&p.index())));
    }

    #[test]
    fn decode_at_old_scale_is_superseded() {
        let mut v = view();
        v.load(document(4), 0);
        let old = v.scale();
        v.set_zoom(1.5);
        let res = produce(&v, 0, old, decode_job(&v, 0));

        assert!(!v.apply_response(res));
        assert_eq!(v.stats().dropped_superseded, 1);
        assert!(!v.pages()[0].is_decoded());
        assert!(v.pages()[0].buffer().is_none());
    }

    #[test]
    fn resize_at_old_scale_is_superseded() {
        let mut v = view();
        v.load(document(4), 0);
        assert!(v.settle(TIMEOUT));
        let old = v.scale();
        let natural = v.pages()[0].buffer().unwrap().natural().clone();
        v.zoom_in();
        assert!(v.pages()[0].is_rescale_pending());
        let res = produce(&v, 0, old, Job::Resize { natural });

        assert!(!v.apply_response(res));
        assert_eq!(v.stats().dropped_superseded, 1);
        assert_eq!(v.stats().resized, 0);
        let page = &v.pages()[0];
        assert!(page.is_rescale_pending());
        assert_eq!(page.buffer().unwrap().pixel_size(), Size::new(400, 600));
    }

    #[test]
    fn resize_for_evicted_page_is_dropped() {
        let mut v = view();
        v.load(document(10), 0);
        assert!(v.settle(TIMEOUT));
        let natural = v.pages()[0].buffer().unwrap().natural().clone();
        v.zoom_in();
        v.jump_to(8);
        assert!(!v.pages()[0].is_decoded());
        let res = produce(&v, 0, v.scale(), Job::Resize { natural });

        assert!(!v.apply_response(res));
        assert_eq!(v.stats().dropped_evicted, 1);
        assert_eq!(v.stats().dropped_out_of_window, 0);
        assert!(!v.pages()[0].is_decoded());
        assert!(v.pages()[0].buffer().is_none());
    }

    #[test]
    fn zoom_rescales_without_decoding() {
        let mut v = view();
        v.load(document(3), 0);
        assert!(v.settle(TIMEOUT));
        v.zoom_in();
        assert!((v.zoom() - 1.1).abs() < 1e-9);
        assert!(v.pages().iter().any(|p| p.is_rescale_pending()));
        assert!(v.settle(TIMEOUT));
        assert!(v.stats().resize_requests > 0);
        for p in v.pages().iter().filter(|p| p.is_decoded()) {
            assert!(!p.is_rescale_pending());
            assert_eq!(p.scaled_size(), Size::new(440, 660));
            assert_eq!(p.buffer().unwrap().pixel_size(), Size::new(440, 660));
        }
        v.zoom_reset();
        assert_eq!(v.zoom(), 1.0);
    }

    #[test]
    fn bookmarks_follow_the_page_under_the_cursor() {
        let mut v = view();
        v.load(document(3), 0);
        v.drain_events();
        assert_eq!(v.bookmark_at(10), Some(0));
        assert_eq!(v.bookmark_at(485), None); // inter-page gap
        assert_eq!(v.bookmark_at(495), Some(1));
        assert_eq!(v.bookmark_current(), Some(0));
        assert_eq!(
            v.drain_events(),
            vec![
                ViewEvent::BookmarkRequested(0),
                ViewEvent::BookmarkRequested(1),
                ViewEvent::BookmarkRequested(0)
            ]
        );
    }

    #[test]
    fn scrolling_is_clamped() {
        let mut v = view();
        v.load(document(3), 0);
        v.scroll_by(-50);
        assert_eq!(v.scroll_top(), 0);
        v.scroll_to(u32::MAX);
        assert_eq!(v.scroll_top(), v.max_scroll());
        v.resize(800, 300);
        assert!(v.drain_events().contains(&ViewEvent::Resized {
            width: 800,
            height: 300
        }));
        assert!(v.scroll_top() <= v.max_scroll());
    }

    #[test]
    fn empty_document_is_inert() {
        let mut v = view();
        v.load(Vec::new(), 5);
        v.jump_to(2);
        assert_eq!(v.current_page(), None);
        assert_eq!(v.max_scroll(), 0);
        assert_eq!(v.bookmark_current(), None);
        assert!(v.settle(Duration::from_millis(10)));
    }
}
