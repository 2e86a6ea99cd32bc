//! Layout engine: stacks pages vertically and assigns each its span.
//!
//! Page sizes are only known once decoded. Until then a page is laid out
//! with an estimate: the mean scaled size of all decoded pages. The mean is
//! a plain arithmetic mean with no outlier handling, so an early double-page
//! spread inflates every estimate until more pages arrive. That jitter is
//! absorbed by anchor restoration in the viewport controller.
//!
//! Full recomputation on every call; O(page count).

use std::time::Instant;

use log::debug;

use crate::decode::scaled_size;
use crate::geometry::{Size, Span};
use crate::page::{PageDescriptor, PageState};
use crate::settings::ScaleParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub spacing: u32,
    /// Subtracted from the viewport height for pages with no size at all.
    pub placeholder_margin: u32,
    pub scale: ScaleParams,
}

impl LayoutParams {
    /// Size used for pages when nothing has been decoded yet.
    pub fn placeholder(&self) -> Size {
        Size::new(
            self.viewport_width.saturating_sub(self.placeholder_margin),
            self.viewport_height.saturating_sub(self.placeholder_margin).max(1),
        )
    }
}

/// Summary of one layout pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub content_width: u32,
    pub content_height: u32,
    /// Mean decoded size, if any page is decoded.
    pub estimate: Option<Size>,
    pub decoded: usize,
}

/// Assign estimates, horizontal positions and spans to every page.
pub fn compute_layout(pages: &mut [PageDescriptor], params: &LayoutParams) -> Layout {
    let start = Instant::now();

    // 1. Mean scaled size over decoded pages.
    let (mut sum_w, mut sum_h, mut n) = (0u64, 0u64, 0u64);
    for page in pages.iter().filter(|p| p.is_decoded()) {
        let s = page.scaled_size();
        sum_w += s.width as u64;
        sum_h += s.height as u64;
        n += 1;
    }
    let estimate = (n > 0).then(|| Size::new((sum_w / n) as u32, (sum_h / n) as u32));

    // 2. Estimates for everything not decoded.
    for page in pages.iter_mut().filter(|p| !p.is_decoded()) {
        if let Some(natural) = page.natural_size() {
            // evicted earlier: its own last known size beats the mean
            page.set_estimated(scaled_size(natural, params.scale));
        } else if let Some(mean) = estimate {
            page.set_estimated(mean);
        }
    }

    // 3. Stack.
    let placeholder = params.placeholder();
    let mut y: u32 = 0;
    let mut content_width = params.viewport_width;
    let mut content_height = 0;
    let count = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let size = match page.state() {
            PageState::Unloaded => placeholder,
            PageState::Estimated | PageState::Decoded => page.scaled_size(),
        };
        let x = (params.viewport_width as i64 - size.width as i64) / 2;
        let end = y.saturating_add(size.height);
        page.place(x as i32, Span::new(y, end));
        content_width = content_width.max(size.width);
        content_height = end;
        if i + 1 < count {
            y = end.saturating_add(params.spacing);
        }
    }

    let layout = Layout {
        content_width,
        content_height,
        estimate,
        decoded: n as usize,
    };
    debug!(
        "layout: {} pages ({} decoded, estimate={}), content {}x{} in {:.2}ms",
        pages.len(),
        n,
        estimate.map_or_else(|| "none".to_string(), |s| s.to_string()),
        content_width,
        content_height,
        start.elapsed().as_secs_f64() * 1000.0
    );
    layout
}
