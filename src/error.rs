use thiserror::Error;

/// Result type alias for operations that may fail with [`TraceError`].
pub type TraceResult<T> = std::result::Result<T, TraceError>;

/// Error types that can occur during tracing.
///
/// This enum covers invalid input grids, out-of-domain parameters,
/// per-region geometry failures, and cooperative cancellation.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Input grid has zero width or height.
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    /// A configuration option is outside its valid domain.
    #[error("invalid value for `{option}`: {reason}")]
    Parameter {
        option: &'static str,
        reason: String,
    },
    /// Contour extraction produced malformed geometry for a region.
    /// Recovered per region; surfacing it means the fallback also failed.
    #[error("contour geometry failure: {0}")]
    Geometry(String),
    /// The conversion was cancelled via a [`CancelToken`](crate::CancelToken).
    #[error("conversion cancelled")]
    Cancelled,
    /// Image loading, decoding, or encoding error.
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraceError {
    pub(crate) fn parameter(option: &'static str, reason: impl Into<String>) -> Self {
        Self::Parameter {
            option,
            reason: reason.into(),
        }
    }
}
