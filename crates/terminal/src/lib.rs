//! Batched glyph-tile terminal rendering.
//!
//! A [`Terminal`] accumulates tile draw commands (glyph + colors at a grid
//! cell or free pixel position) into a compact 18-byte-per-tile record
//! buffer, then submits the whole batch to a [`TerminalBackend`] as a single
//! draw call per frame. Tiles composite in push order.
//!
//! This crate is GPU-agnostic; the `glyphterm_wgpu` crate implements
//! [`TerminalBackend`] on wgpu.
//!
//! ```no_run
//! # use glyphterm::{AtlasData, ColorFormat, GlyphUv, Rgba, Terminal, TermSize};
//! # fn demo<B: glyphterm::TerminalBackend>(backend: &mut B) -> Result<(), glyphterm::TerminalError> {
//! # let (pixels, glyphs) = (vec![0u8; 64 * 64 * 4], vec![GlyphUv::new(0.0, 1.0, 0.0, 1.0, 0)]);
//! let atlas = AtlasData {
//!     pixels: &pixels,
//!     width: 64,
//!     height: 64,
//!     pages: 1,
//!     channel_size: 1,
//!     format: ColorFormat::Rgba,
//!     glyphs: &glyphs,
//! };
//! let mut term = Terminal::new(TermSize::tiles(80, 25, 1, 8, 16), atlas, &mut *backend)?;
//! term.push_grid(0, 0, 2, Rgba::WHITE, Rgba::BLACK)?;
//! term.draw_viewport(backend)?;
//! # Ok(())
//! # }
//! ```

mod atlas;
mod backend;
mod color;
mod draw;
mod error;
mod mapper;
mod record;
mod terminal;

pub use atlas::{AtlasData, ColorFormat, FragmentMode, GlyphUv};
pub use backend::{BackendError, DrawUniforms, ScissorRect, TerminalBackend};
pub use color::Rgba;
pub use draw::{HAlign, Placement, VAlign, screen_matrix};
pub use error::{RejectReason, TerminalError};
pub use record::{MAX_TILE_SIZE, POSITION_BIAS, TILE_RECORD_SIZE, TileBuffer, TileRecord};
pub use terminal::{SizeMode, TermSize, Terminal};
