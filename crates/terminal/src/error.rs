//! Error taxonomy for terminal operations.

use crate::backend::BackendError;

/// Why a pushed tile was not added to the batch.
///
/// Rejection is non-fatal: the buffer is left exactly as it was and the
/// caller may ignore the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The tile's rectangle lies entirely outside the console, or its grid
    /// coordinate is outside the tile grid.
    OutOfBounds,
    /// An explicit tile size was zero, negative, or above [`crate::MAX_TILE_SIZE`].
    BadSize,
    /// The glyph id is not present in the current atlas.
    BadGlyph,
}

/// Errors returned by terminal operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    /// A caller-supplied value was invalid (non-positive dimension,
    /// zero pixel scale, malformed atlas data, ...).
    InvalidArgument(&'static str),
    /// A pushed tile was rejected; the batch is unchanged. Non-fatal.
    TileRejected(RejectReason),
    /// Growing the tile buffer failed; the buffer keeps its previous
    /// capacity, count, and contents.
    OutOfMemory,
    /// The rendering backend reported a failure.
    Backend(BackendError),
}

impl std::fmt::Display for TerminalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::TileRejected(RejectReason::OutOfBounds) => {
                write!(f, "tile rejected: outside the console bounds")
            }
            Self::TileRejected(RejectReason::BadSize) => {
                write!(f, "tile rejected: pixel size out of range")
            }
            Self::TileRejected(RejectReason::BadGlyph) => {
                write!(f, "tile rejected: glyph id not in atlas")
            }
            Self::OutOfMemory => write!(f, "tile buffer growth failed: out of memory"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for TerminalError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl TerminalError {
    /// Whether this error is a non-fatal tile rejection.
    #[inline]
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::TileRejected(_))
    }
}
