//! Per-page error taxonomy.
//!
//! None of these are fatal: a failed page stays undecoded and the rest of the
//! document keeps working. `RequestDropped` is not a failure at all, it marks
//! a result that arrived after the View stopped wanting it.

use std::io;

/// Why a decode result was discarded on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    /// Tagged with a document generation that has since been replaced.
    #[error("stale generation")]
    StaleGeneration,
    /// Index is outside the current page sequence.
    #[error("index out of bounds")]
    OutOfBounds,
    /// Page left the in-view window (plus one neighbor) before delivery.
    #[error("page out of window")]
    OutOfWindow,
    /// Page was evicted while a resize for it was in flight.
    #[error("page evicted")]
    Evicted,
    /// Scale parameters (max width / zoom) changed after the request was sent.
    #[error("superseded by newer scale")]
    Superseded,
}

/// Failure category reported to the shell through `decode_failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum FailureReason {
    #[error("source unavailable")]
    SourceUnavailable,
    #[error("unsupported format")]
    DecodeUnsupportedFormat,
    #[error("corrupt data")]
    DecodeCorruptData,
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("source unavailable: {source}")]
    SourceUnavailable {
        #[from]
        source: io::Error,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("corrupt image data: {0}")]
    CorruptData(String),

    #[error("request for page {index} dropped: {reason}")]
    RequestDropped { index: usize, reason: DropReason },
}

impl PageError {
    /// Failure category, or `None` for a dropped request.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            PageError::SourceUnavailable { .. } => Some(FailureReason::SourceUnavailable),
            PageError::UnsupportedFormat(_) => Some(FailureReason::DecodeUnsupportedFormat),
            PageError::CorruptData(_) => Some(FailureReason::DecodeCorruptData),
            PageError::RequestDropped { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.reason().is_some()
    }
}

impl From<image::ImageError> for PageError {
    fn from(err: image::ImageError) -> Self {
        use image::ImageError;
        match err {
            ImageError::Unsupported(e) => PageError::UnsupportedFormat(e.to_string()),
            // Bytes are already in memory here, so an I/O error means truncated data.
            ImageError::IoError(e) => PageError::CorruptData(e.to_string()),
            other => PageError::CorruptData(other.to_string()),
        }
    }
}
