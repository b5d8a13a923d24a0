//! Backend trait for submitting tile batches to a GPU.
//!
//! The core never talks to a graphics API directly. Everything it needs from
//! one is expressed here as four synchronous operations with defined
//! contracts; `glyphterm_wgpu` provides the wgpu implementation and tests use
//! a call-recording mock.

use bytemuck::{Pod, Zeroable};

use crate::atlas::{AtlasData, FragmentMode, GlyphUv};

/// Per-draw uniform data handed to the backend.
///
/// `matrix` is the placement transform in column-major order, mapping console
/// space (the unit square, origin top-left, y-down) to clip space.
/// `console_unit_size` is the size of one unscaled console pixel in console
/// space, i.e. `1 / unscaled_pixel_size`; the vertex stage multiplies decoded
/// pixel coordinates by it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub matrix: [f32; 16],
    pub console_unit_size: [f32; 2],
    pub _pad: [f32; 2],
}

/// A clip rectangle in framebuffer pixels, origin top-left.
///
/// Always fully clamped: the origin is non-negative and the extent does not
/// escape the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Backend-agnostic rendering interface for a terminal.
///
/// All operations are synchronous from the caller's point of view. Resources
/// created by a backend are owned by it and released on drop.
pub trait TerminalBackend {
    /// Replace the atlas texture. `data` has already been validated by the
    /// core; `mode` selects the fragment shading variant for the atlas's
    /// color format.
    fn set_atlas(&mut self, data: &AtlasData<'_>, mode: FragmentMode) -> Result<(), BackendError>;

    /// Replace the per-glyph UV table.
    fn upload_glyph_table(&mut self, table: &[GlyphUv]) -> Result<(), BackendError>;

    /// Upload the live prefix of the tile record buffer. `bytes` is exactly
    /// `tile_count` packed [`crate::TileRecord`]s.
    fn upload_tiles(&mut self, bytes: &[u8], tile_count: usize) -> Result<(), BackendError>;

    /// Issue one batched draw covering `tile_count` tiles (six vertices
    /// each) with standard source-over alpha blending. The scissor, when
    /// present, is enabled for this draw only.
    fn draw_batched(
        &mut self,
        uniforms: &DrawUniforms,
        tile_count: usize,
        scissor: Option<ScissorRect>,
    ) -> Result<(), BackendError>;
}

/// Backend errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Backend or device initialization failed.
    InitializationFailed(String),
    /// Creating or updating a GPU resource failed.
    ResourceError(String),
    /// Encoding or submitting the draw failed.
    RenderError(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceError(msg) => write!(f, "resource error: {msg}"),
            Self::RenderError(msg) => write!(f, "render error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}
