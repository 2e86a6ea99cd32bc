//! Decode capability: raw bytes → natural-resolution pixels → scaled pixels.
//!
//! The worker thread owns the decoder. Everything here is pure; timing and
//! logging live in the worker.

use std::sync::Arc;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::PageError;
use crate::geometry::Size;
use crate::page::PageBuffer;
use crate::settings::ScaleParams;

pub trait Decoder: Send + 'static {
    /// Decode raw page bytes into natural-resolution RGBA pixels.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, PageError>;

    /// Resample `natural` to exactly `target`.
    fn resize(&self, natural: &RgbaImage, target: Size) -> RgbaImage;
}

/// [`Decoder`] backed by the `image` crate.
#[derive(Debug, Clone, Copy)]
pub struct ImageDecoder {
    filter: FilterType,
}

impl Default for ImageDecoder {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Decoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, PageError> {
        let img = image::load_from_memory(bytes)?;
        Ok(img.into_rgba8())
    }

    fn resize(&self, natural: &RgbaImage, target: Size) -> RgbaImage {
        image::imageops::resize(natural, target.width, target.height, self.filter)
    }
}

/// Display size of a page: width capped at `max_width`, then multiplied by
/// zoom, aspect ratio preserved. A `max_width` of 0 means uncapped.
pub fn scaled_size(natural: Size, params: ScaleParams) -> Size {
    if natural.is_empty() {
        return Size::ZERO;
    }
    let capped = if params.max_width == 0 {
        natural.width
    } else {
        natural.width.min(params.max_width)
    };
    let width = ((capped as f64 * params.zoom).round() as u32).max(1);
    let height = ((natural.height as f64 * width as f64 / natural.width as f64).round() as u32).max(1);
    Size::new(width, height)
}

/// Produce the displayable buffer for `natural` under `params`.
///
/// Skips the resample when the scaled size equals the natural size.
pub fn scale_buffer(
    decoder: &dyn Decoder,
    natural: Arc<RgbaImage>,
    params: ScaleParams,
) -> (PageBuffer, Size) {
    let natural_size = Size::new(natural.width(), natural.height());
    let target = scaled_size(natural_size, params);
    let scaled = if target == natural_size || target.is_empty() {
        None
    } else {
        Some(decoder.resize(&natural, target))
    };
    (PageBuffer::new(natural, scaled), target)
}
