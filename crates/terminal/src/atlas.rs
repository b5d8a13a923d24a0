//! Glyph atlas description: per-glyph UV table, pixel formats, and the
//! fragment-shading classification derived from them.
//!
//! The core never parses images. Callers hand over raw pixel bytes plus a
//! precomputed UV table; the backend turns them into a texture array and a
//! GPU-visible lookup buffer.

use bytemuck::{Pod, Zeroable};

use crate::error::TerminalError;

/// Texture region of one glyph inside the atlas.
///
/// `uv` holds left-U, right-U, top-V, bottom-V in `[0, 1]` atlas coordinates
/// with origin at the top-left of the atlas page. `page` is the texture array
/// layer the glyph lives on, stored as a float because the table uploads as
/// one flat `f32` buffer (five floats per glyph).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlyphUv {
    pub uv: [f32; 4],
    pub page: f32,
}

impl GlyphUv {
    /// Build a glyph region from edge coordinates and a page index.
    #[inline]
    #[must_use]
    pub fn new(left: f32, right: f32, top: f32, bottom: f32, page: u32) -> Self {
        Self {
            uv: [left, right, top, bottom],
            page: page as f32,
        }
    }
}

/// Pixel channel layout of the atlas bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    /// Single gray channel, used as a pure stencil.
    G,
    /// Gray + alpha; green carries the alpha in the shader.
    Ga,
    /// Full RGBA color.
    Rgba,
    /// Full color with swapped channel order.
    Bgra,
}

impl ColorFormat {
    /// Channels per pixel for this format.
    #[inline]
    #[must_use]
    pub const fn channels(self) -> u32 {
        match self {
            Self::G => 1,
            Self::Ga => 2,
            Self::Rgba | Self::Bgra => 4,
        }
    }
}

/// Fragment shading variant, chosen by the atlas color format.
///
/// Backends keep one pipeline per mode; replacing the atlas may switch the
/// active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentMode {
    /// `mix(bg, fg, glyph.r)` — one-channel stencil.
    Stencil,
    /// `mix(bg, fg * glyph.rrr, glyph.g)` — gray colors, green is alpha.
    GreenAlpha,
    /// `mix(bg, fg * glyph.rgb, glyph.a)` — full color with alpha.
    FullColor,
}

impl FragmentMode {
    /// Pick the shading mode for an atlas color format.
    #[inline]
    #[must_use]
    pub const fn for_color_format(format: ColorFormat) -> Self {
        match format {
            ColorFormat::G => Self::Stencil,
            ColorFormat::Ga => Self::GreenAlpha,
            ColorFormat::Rgba | ColorFormat::Bgra => Self::FullColor,
        }
    }
}

/// Borrowed atlas creation data: raw pixels, dimensions, and the glyph table.
#[derive(Debug, Clone, Copy)]
pub struct AtlasData<'a> {
    /// Raw pixel bytes, `width * height * pages * channels * channel_size`
    /// of them, pages stored back to back.
    pub pixels: &'a [u8],
    /// Page width in pixels.
    pub width: u32,
    /// Page height in pixels.
    pub height: u32,
    /// Number of texture array pages.
    pub pages: u32,
    /// Bytes per channel (1, 2, or 4).
    pub channel_size: u32,
    /// Channel layout of `pixels`.
    pub format: ColorFormat,
    /// Per-glyph UV regions; glyph ids index into this table.
    pub glyphs: &'a [GlyphUv],
}

/// The glyph field of the wire record is 16 bits wide.
const MAX_GLYPH_COUNT: usize = 1 << 16;

impl AtlasData<'_> {
    /// Validate dimensions, glyph count, and pixel byte length.
    pub fn validate(&self) -> Result<(), TerminalError> {
        if self.width == 0 || self.height == 0 || self.pages == 0 {
            return Err(TerminalError::InvalidArgument(
                "atlas dimensions must be positive",
            ));
        }
        if !matches!(self.channel_size, 1 | 2 | 4) {
            return Err(TerminalError::InvalidArgument(
                "atlas channel size must be 1, 2, or 4 bytes",
            ));
        }
        if self.glyphs.is_empty() {
            return Err(TerminalError::InvalidArgument("atlas has no glyphs"));
        }
        if self.glyphs.len() > MAX_GLYPH_COUNT {
            return Err(TerminalError::InvalidArgument(
                "atlas glyph count exceeds the 16-bit glyph id range",
            ));
        }
        let expected = (self.width as usize)
            * (self.height as usize)
            * (self.pages as usize)
            * (self.format.channels() as usize)
            * (self.channel_size as usize);
        if self.pixels.len() != expected {
            return Err(TerminalError::InvalidArgument(
                "atlas pixel byte length does not match its dimensions",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas<'a>(pixels: &'a [u8], glyphs: &'a [GlyphUv]) -> AtlasData<'a> {
        AtlasData {
            pixels,
            width: 2,
            height: 2,
            pages: 1,
            channel_size: 1,
            format: ColorFormat::Rgba,
            glyphs,
        }
    }

    /// Each color format maps to its fragment shading mode.
    #[test]
    fn fragment_mode_selection() {
        assert_eq!(FragmentMode::for_color_format(ColorFormat::G), FragmentMode::Stencil);
        assert_eq!(FragmentMode::for_color_format(ColorFormat::Ga), FragmentMode::GreenAlpha);
        assert_eq!(FragmentMode::for_color_format(ColorFormat::Rgba), FragmentMode::FullColor);
        assert_eq!(FragmentMode::for_color_format(ColorFormat::Bgra), FragmentMode::FullColor);
    }

    /// A well-formed atlas validates.
    #[test]
    fn valid_atlas() {
        let pixels = [0u8; 16];
        let glyphs = [GlyphUv::new(0.0, 1.0, 0.0, 1.0, 0)];
        assert!(atlas(&pixels, &glyphs).validate().is_ok());
    }

    /// Byte-length mismatches and empty glyph tables are invalid arguments.
    #[test]
    fn invalid_atlas() {
        let pixels = [0u8; 15];
        let glyphs = [GlyphUv::new(0.0, 1.0, 0.0, 1.0, 0)];
        assert!(matches!(
            atlas(&pixels, &glyphs).validate(),
            Err(TerminalError::InvalidArgument(_))
        ));

        let pixels = [0u8; 16];
        assert!(matches!(
            atlas(&pixels, &[]).validate(),
            Err(TerminalError::InvalidArgument(_))
        ));
    }
}
