//! Page descriptor: per-page layout and decode state, owned by the View.

use std::sync::Arc;

use image::RgbaImage;
use log::trace;

use crate::error::FailureReason;
use crate::geometry::{Size, Span};
use crate::source::PageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// No pixels, no size assigned.
    Unloaded,
    /// Placeholder size for layout only.
    Estimated,
    /// Pixel buffer present with its true scaled size.
    Decoded,
}

/// Decoded pixels of one page.
///
/// The natural-resolution image is kept next to the scaled one so a width
/// change can be served by a resize instead of a decode from bytes.
#[derive(Debug, Clone)]
pub struct PageBuffer {
    natural: Arc<RgbaImage>,
    /// `None` when no scaling was needed and `natural` is displayed as is.
    scaled: Option<RgbaImage>,
}

impl PageBuffer {
    pub fn new(natural: Arc<RgbaImage>, scaled: Option<RgbaImage>) -> Self {
        Self { natural, scaled }
    }

    pub fn natural(&self) -> &Arc<RgbaImage> {
        &self.natural
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.natural.width(), self.natural.height())
    }

    /// Pixels to display.
    pub fn pixels(&self) -> &RgbaImage {
        self.scaled.as_ref().unwrap_or(&self.natural)
    }

    pub fn pixel_size(&self) -> Size {
        let p = self.pixels();
        Size::new(p.width(), p.height())
    }
}

#[derive(Debug)]
pub struct PageDescriptor {
    index: usize,
    id: PageId,
    state: PageState,
    /// Natural size once known. Survives eviction as the page's last known size.
    natural_size: Option<Size>,
    scaled_size: Size,
    buffer: Option<PageBuffer>,
    span: Span,
    x: i32,
    failure: Option<FailureReason>,
    rescale_pending: bool,
}

impl PageDescriptor {
    pub fn new(index: usize, id: PageId) -> Self {
        Self {
            index,
            id,
            state: PageState::Unloaded,
            natural_size: None,
            scaled_size: Size::ZERO,
            buffer: None,
            span: Span::default(),
            x: 0,
            failure: None,
            rescale_pending: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> &PageId {
        &self.id
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn natural_size(&self) -> Option<Size> {
        self.natural_size
    }

    pub fn scaled_size(&self) -> Size {
        self.scaled_size
    }

    pub fn buffer(&self) -> Option<&PageBuffer> {
        self.buffer.as_ref()
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Horizontal position of the page's left edge (negative if wider than the viewport).
    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn failure(&self) -> Option<FailureReason> {
        self.failure
    }

    pub fn is_decoded(&self) -> bool {
        self.state == PageState::Decoded
    }

    /// Decoded, but the displayed pixels still belong to an older scale.
    pub fn is_rescale_pending(&self) -> bool {
        self.rescale_pending
    }

    /// Assign a placeholder size. Rejected for decoded pages.
    pub fn set_estimated(&mut self, size: Size) -> bool {
        if self.state == PageState::Decoded {
            trace!("page {}: ignoring estimate for decoded page", self.index);
            return false;
        }
        self.state = PageState::Estimated;
        self.scaled_size = size;
        true
    }

    /// Install decoded pixels. Valid from any state; rejects an empty scaled size.
    pub fn set_decoded(&mut self, buffer: PageBuffer, scaled_size: Size) -> bool {
        if scaled_size.width == 0 {
            trace!("page {}: refusing zero-width decode", self.index);
            return false;
        }
        self.natural_size = Some(buffer.natural_size());
        self.buffer = Some(buffer);
        self.scaled_size = scaled_size;
        self.state = PageState::Decoded;
        self.failure = None;
        self.rescale_pending = false;
        true
    }

    /// Free the pixel buffer. Only decoded pages can be evicted; they return
    /// to `Unloaded` and keep their natural size as the last known size.
    pub fn evict(&mut self) -> bool {
        if self.state != PageState::Decoded {
            return false;
        }
        self.buffer = None;
        self.state = PageState::Unloaded;
        self.scaled_size = Size::ZERO;
        self.rescale_pending = false;
        true
    }

    /// Record the target size for a pending resize-only recompute.
    ///
    /// Layout uses the new size right away; the old pixels stay displayable
    /// until [`Self::set_rescaled`] replaces them.
    pub fn mark_rescale(&mut self, scaled_size: Size) -> bool {
        if self.state != PageState::Decoded || scaled_size.width == 0 {
            return false;
        }
        self.scaled_size = scaled_size;
        self.rescale_pending = true;
        true
    }

    /// Replace the scaled pixels of a decoded page after a resize-only recompute.
    pub fn set_rescaled(&mut self, scaled: Option<RgbaImage>, scaled_size: Size) -> bool {
        let Some(buffer) = self.buffer.as_mut() else {
            return false;
        };
        if scaled_size.width == 0 {
            return false;
        }
        buffer.scaled = scaled;
        self.scaled_size = scaled_size;
        self.rescale_pending = false;
        true
    }

    pub fn mark_failed(&mut self, reason: FailureReason) {
        self.failure = Some(reason);
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    pub(crate) fn place(&mut self, x: i32, span: Span) {
        self.x = x;
        self.span = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(w: u32, h: u32) -> PageBuffer {
        PageBuffer::new(Arc::new(RgbaImage::new(w, h)), None)
    }

    fn page() -> PageDescriptor {
        PageDescriptor::new(0, PageId::memory("p0", vec![0u8; 4]))
    }

    #[test]
    fn full_lifecycle() {
        let mut p = page();
        assert_eq!(p.state(), PageState::Unloaded);
        assert!(p.set_estimated(Size::new(100, 150)));
        assert_eq!(p.state(), PageState::Estimated);

        assert!(p.set_decoded(buffer(200, 300), Size::new(100, 150)));
        assert!(p.is_decoded());
        assert_eq!(p.natural_size(), Some(Size::new(200, 300)));

        assert!(p.evict());
        assert_eq!(p.state(), PageState::Unloaded);
        assert!(p.buffer().is_none());
        // last known size survives eviction
        assert_eq!(p.natural_size(), Some(Size::new(200, 300)));
    }

    #[test]
    fn estimate_does_not_override_decoded() {
        let mut p = page();
        p.set_decoded(buffer(10, 20), Size::new(10, 20));
        assert!(!p.set_estimated(Size::new(50, 50)));
        assert_eq!(p.scaled_size(), Size::new(10, 20));
    }

    #[test]
    fn evict_only_from_decoded() {
        let mut p = page();
        assert!(!p.evict());
        p.set_estimated(Size::new(1, 1));
        assert!(!p.evict());
        assert_eq!(p.state(), PageState::Estimated);
    }

    #[test]
    fn zero_width_decode_rejected() {
        let mut p = page();
        assert!(!p.set_decoded(buffer(10, 10), Size::new(0, 10)));
        assert_eq!(p.state(), PageState::Unloaded);
    }

    #[test]
    fn decode_clears_failure() {
        let mut p = page();
        p.mark_failed(FailureReason::DecodeCorruptData);
        p.set_decoded(buffer(4, 4), Size::new(4, 4));
        assert_eq!(p.failure(), None);
    }

    #[test]
    fn rescale_roundtrip() {
        let mut p = page();
        assert!(!p.mark_rescale(Size::new(5, 5)));
        p.set_decoded(buffer(40, 80), Size::new(20, 40));
        assert!(p.mark_rescale(Size::new(30, 60)));
        assert!(p.is_rescale_pending());
        assert_eq!(p.scaled_size(), Size::new(30, 60));
        assert!(p.set_rescaled(Some(RgbaImage::new(30, 60)), Size::new(30, 60)));
        assert!(!p.is_rescale_pending());
        assert_eq!(p.buffer().unwrap().pixel_size(), Size::new(30, 60));
    }
}
