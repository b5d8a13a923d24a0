//! The terminal aggregate: console sizing, the tile batch, and the
//! per-frame draw protocol.

use log::debug;

use crate::atlas::{AtlasData, FragmentMode};
use crate::backend::{DrawUniforms, TerminalBackend};
use crate::color::Rgba;
use crate::draw::{self, HAlign, Placement, VAlign};
use crate::error::TerminalError;
use crate::mapper::{self, Geometry};
use crate::record::{MAX_TILE_SIZE, TileBuffer, TileRecord};
use glam::Mat4;

/// How the `width`/`height` of a [`TermSize`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Dimensions are tile counts.
    Tiles,
    /// Dimensions are on-screen pixels, after pixel scaling.
    ScaledPixels,
    /// Dimensions are console pixels, before pixel scaling.
    UnscaledPixels,
}

/// Sizing parameters for creating or resizing a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub width: u32,
    pub height: u32,
    pub mode: SizeMode,
    /// When sizing by pixels, floor the console to a whole number of tiles.
    pub floor_pixels_to_tiles: bool,
    /// Terminal-pixel to screen-pixel ratio, integral to keep pixels square.
    pub pixel_scale: u32,
    /// Default tile width in console pixels.
    pub tile_width: u32,
    /// Default tile height in console pixels.
    pub tile_height: u32,
}

impl TermSize {
    /// Size a terminal by tile-grid dimensions.
    #[must_use]
    pub const fn tiles(tiles_wide: u32, tiles_tall: u32, pixel_scale: u32, tile_width: u32, tile_height: u32) -> Self {
        Self {
            width: tiles_wide,
            height: tiles_tall,
            mode: SizeMode::Tiles,
            floor_pixels_to_tiles: false,
            pixel_scale,
            tile_width,
            tile_height,
        }
    }

    fn validate(&self) -> Result<(), TerminalError> {
        if self.width == 0 || self.height == 0 {
            return Err(TerminalError::InvalidArgument(
                "terminal dimensions must be positive",
            ));
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(TerminalError::InvalidArgument(
                "tile pixel dimensions must be positive",
            ));
        }
        // Default tile sizes feed the u16 wire size field unchecked, so the
        // explicit-size limit applies here too.
        let max_tile = MAX_TILE_SIZE.min(u32::from(u16::MAX));
        if self.tile_width > max_tile || self.tile_height > max_tile {
            return Err(TerminalError::InvalidArgument(
                "tile pixel dimensions exceed the tile size limit",
            ));
        }
        if self.pixel_scale == 0 {
            return Err(TerminalError::InvalidArgument(
                "pixel scale must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Derived console dimensions shared by create and resize.
#[derive(Debug, Clone, Copy)]
struct ConsoleDims {
    tiles_wide: u32,
    tiles_tall: u32,
    unscaled_width: u32,
    unscaled_height: u32,
    scaled_width: u32,
    scaled_height: u32,
}

fn console_dims(size: &TermSize) -> Result<ConsoleDims, TerminalError> {
    let overflow = || TerminalError::InvalidArgument("console pixel dimensions overflow");
    let (mut unscaled_width, mut unscaled_height) = match size.mode {
        SizeMode::Tiles => (
            size.width.checked_mul(size.tile_width).ok_or_else(overflow)?,
            size.height.checked_mul(size.tile_height).ok_or_else(overflow)?,
        ),
        SizeMode::ScaledPixels => (size.width / size.pixel_scale, size.height / size.pixel_scale),
        SizeMode::UnscaledPixels => (size.width, size.height),
    };
    if size.floor_pixels_to_tiles && size.mode != SizeMode::Tiles {
        unscaled_width -= unscaled_width % size.tile_width;
        unscaled_height -= unscaled_height % size.tile_height;
    }
    let tiles_wide = unscaled_width / size.tile_width;
    let tiles_tall = unscaled_height / size.tile_height;
    if tiles_wide == 0 || tiles_tall == 0 {
        return Err(TerminalError::InvalidArgument(
            "console is smaller than one tile",
        ));
    }
    Ok(ConsoleDims {
        tiles_wide,
        tiles_tall,
        unscaled_width,
        unscaled_height,
        scaled_width: unscaled_width
            .checked_mul(size.pixel_scale)
            .ok_or_else(overflow)?,
        scaled_height: unscaled_height
            .checked_mul(size.pixel_scale)
            .ok_or_else(overflow)?,
    })
}

/// A batched glyph-tile console.
///
/// Accumulates tile draw commands into a growable record buffer and submits
/// them to a [`TerminalBackend`] as a single batched draw per frame. Tiles
/// composite strictly in push order (painter's algorithm); there is no
/// z-order.
#[derive(Debug)]
pub struct Terminal {
    tiles_wide: u32,
    tiles_tall: u32,
    tile_width: u32,
    tile_height: u32,
    pixel_scale: u32,
    unscaled_width: u32,
    unscaled_height: u32,
    scaled_width: u32,
    scaled_height: u32,
    buffer: TileBuffer,
    glyph_count: usize,
    fragment_mode: FragmentMode,
    /// CPU-side records changed since the last upload.
    dirty: bool,
    /// Keep tile data across draws instead of auto-clearing.
    retained: bool,
}

impl Terminal {
    /// Create a terminal and install its atlas on the backend.
    ///
    /// The tile buffer starts with capacity for one full console of tiles.
    pub fn new<B: TerminalBackend>(
        size: TermSize,
        atlas: AtlasData<'_>,
        backend: &mut B,
    ) -> Result<Self, TerminalError> {
        size.validate()?;
        atlas.validate()?;
        let dims = console_dims(&size)?;
        let fragment_mode = FragmentMode::for_color_format(atlas.format);
        backend.set_atlas(&atlas, fragment_mode)?;
        backend.upload_glyph_table(atlas.glyphs)?;
        Ok(Self {
            tiles_wide: dims.tiles_wide,
            tiles_tall: dims.tiles_tall,
            tile_width: size.tile_width,
            tile_height: size.tile_height,
            pixel_scale: size.pixel_scale,
            unscaled_width: dims.unscaled_width,
            unscaled_height: dims.unscaled_height,
            scaled_width: dims.scaled_width,
            scaled_height: dims.scaled_height,
            buffer: TileBuffer::with_capacity(dims.tiles_wide as usize * dims.tiles_tall as usize),
            glyph_count: atlas.glyphs.len(),
            fragment_mode,
            dirty: false,
            retained: false,
        })
    }

    /// Resize the console. Accumulated tiles reference stale layout
    /// assumptions, so the batch is reset; allocated capacity is kept.
    pub fn resize(&mut self, size: TermSize) -> Result<(), TerminalError> {
        size.validate()?;
        let dims = console_dims(&size)?;
        self.tiles_wide = dims.tiles_wide;
        self.tiles_tall = dims.tiles_tall;
        self.tile_width = size.tile_width;
        self.tile_height = size.tile_height;
        self.pixel_scale = size.pixel_scale;
        self.unscaled_width = dims.unscaled_width;
        self.unscaled_height = dims.unscaled_height;
        self.scaled_width = dims.scaled_width;
        self.scaled_height = dims.scaled_height;
        self.buffer.clear();
        self.dirty = false;
        Ok(())
    }

    /// Replace the atlas wholesale. Pending tiles reference stale glyph ids,
    /// so the batch is reset; the shading mode may change with the format.
    pub fn set_atlas<B: TerminalBackend>(
        &mut self,
        atlas: AtlasData<'_>,
        backend: &mut B,
    ) -> Result<(), TerminalError> {
        atlas.validate()?;
        let fragment_mode = FragmentMode::for_color_format(atlas.format);
        backend.set_atlas(&atlas, fragment_mode)?;
        backend.upload_glyph_table(atlas.glyphs)?;
        self.glyph_count = atlas.glyphs.len();
        self.fragment_mode = fragment_mode;
        self.buffer.clear();
        self.dirty = false;
        Ok(())
    }

    /// Number of glyphs in the current atlas.
    #[inline]
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    /// Shading mode derived from the current atlas color format.
    #[inline]
    #[must_use]
    pub fn fragment_mode(&self) -> FragmentMode {
        self.fragment_mode
    }

    /// Terminal-pixel to screen-pixel ratio.
    #[inline]
    #[must_use]
    pub fn pixel_scale(&self) -> u32 {
        self.pixel_scale
    }

    /// Tile-grid dimensions, `(tiles_wide, tiles_tall)`.
    #[inline]
    #[must_use]
    pub fn grid_size(&self) -> (u32, u32) {
        (self.tiles_wide, self.tiles_tall)
    }

    /// Console dimensions in screen pixels, after pixel scaling.
    #[inline]
    #[must_use]
    pub fn scaled_pixel_size(&self) -> (u32, u32) {
        (self.scaled_width, self.scaled_height)
    }

    /// Console dimensions in terminal pixels, before pixel scaling.
    #[inline]
    #[must_use]
    pub fn unscaled_pixel_size(&self) -> (u32, u32) {
        (self.unscaled_width, self.unscaled_height)
    }

    /// Default tile dimensions in terminal pixels.
    #[inline]
    #[must_use]
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Live tile count since the last clear.
    #[inline]
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.buffer.len()
    }

    /// Whether tile data persists across draws until explicitly cleared.
    #[inline]
    #[must_use]
    pub fn retained(&self) -> bool {
        self.retained
    }

    /// Switch between retained mode and auto-clear-after-draw.
    #[inline]
    pub fn set_retained(&mut self, retained: bool) {
        self.retained = retained;
    }

    /// Reset the tile batch. Idempotent; capacity is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn geometry(&self) -> Geometry {
        Geometry {
            tiles_wide: self.tiles_wide,
            tiles_tall: self.tiles_tall,
            tile_width: self.tile_width,
            tile_height: self.tile_height,
            pixel_width: self.unscaled_width,
            pixel_height: self.unscaled_height,
        }
    }

    fn push(&mut self, record: TileRecord) -> Result<(), TerminalError> {
        self.buffer.reserve()?;
        self.buffer.append(record);
        self.dirty = true;
        Ok(())
    }

    /// Push a tile at a grid cell with the default tile size.
    pub fn push_grid(
        &mut self,
        grid_x: i32,
        grid_y: i32,
        glyph: u16,
        fg: Rgba,
        bg: Rgba,
    ) -> Result<(), TerminalError> {
        mapper::check_glyph(glyph, self.glyph_count)?;
        let (x, y) = mapper::map_grid(&self.geometry(), grid_x, grid_y)?;
        self.push(TileRecord::new(x, y, self.tile_width, self.tile_height, glyph, fg, bg))
    }

    /// Push a tile at a grid cell with an explicit pixel size.
    #[allow(clippy::too_many_arguments)]
    pub fn push_grid_sized(
        &mut self,
        grid_x: i32,
        grid_y: i32,
        width: i32,
        height: i32,
        glyph: u16,
        fg: Rgba,
        bg: Rgba,
    ) -> Result<(), TerminalError> {
        mapper::check_glyph(glyph, self.glyph_count)?;
        let (x, y) = mapper::map_grid(&self.geometry(), grid_x, grid_y)?;
        let (width, height) = mapper::check_size(width, height)?;
        self.push(TileRecord::new(x, y, width, height, glyph, fg, bg))
    }

    /// Push a tile at a free pixel position with the default tile size.
    pub fn push_free(
        &mut self,
        pixel_x: i32,
        pixel_y: i32,
        glyph: u16,
        fg: Rgba,
        bg: Rgba,
    ) -> Result<(), TerminalError> {
        mapper::check_glyph(glyph, self.glyph_count)?;
        mapper::check_free(&self.geometry(), pixel_x, pixel_y, self.tile_width, self.tile_height)?;
        self.push(TileRecord::new(
            pixel_x,
            pixel_y,
            self.tile_width,
            self.tile_height,
            glyph,
            fg,
            bg,
        ))
    }

    /// Push a tile at a free pixel position with an explicit pixel size.
    #[allow(clippy::too_many_arguments)]
    pub fn push_free_sized(
        &mut self,
        pixel_x: i32,
        pixel_y: i32,
        width: i32,
        height: i32,
        glyph: u16,
        fg: Rgba,
        bg: Rgba,
    ) -> Result<(), TerminalError> {
        mapper::check_glyph(glyph, self.glyph_count)?;
        let (width, height) = mapper::check_size(width, height)?;
        mapper::check_free(&self.geometry(), pixel_x, pixel_y, width, height)?;
        self.push(TileRecord::new(pixel_x, pixel_y, width, height, glyph, fg, bg))
    }

    /// Push one tile stretched over the entire console, typically to paint
    /// a background behind everything pushed afterwards.
    pub fn push_fill(&mut self, glyph: u16, fg: Rgba, bg: Rgba) -> Result<(), TerminalError> {
        mapper::check_glyph(glyph, self.glyph_count)?;
        let (width, height) =
            mapper::check_size(self.unscaled_width as i32, self.unscaled_height as i32)?;
        self.push(TileRecord::new(0, 0, width, height, glyph, fg, bg))
    }

    /// Draw the accumulated batch with the given placement.
    ///
    /// An empty batch is a no-op. Records are uploaded only when they
    /// changed since the last upload; the backend then issues exactly one
    /// draw covering the whole batch in push order. Unless retained mode is
    /// set, the batch is reset afterwards.
    pub fn draw<B: TerminalBackend>(
        &mut self,
        backend: &mut B,
        placement: Placement,
    ) -> Result<(), TerminalError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let resolved = draw::resolve(placement, self.scaled_width, self.scaled_height)?;
        if self.dirty {
            debug!(
                target: "glyphterm",
                "uploading {} tile records ({} bytes)",
                self.buffer.len(),
                self.buffer.as_bytes().len()
            );
            backend.upload_tiles(self.buffer.as_bytes(), self.buffer.len())?;
            self.dirty = false;
        }
        if resolved.is_fully_clipped() {
            debug!(target: "glyphterm", "draw fully clipped, skipping submission");
        } else {
            let uniforms = DrawUniforms {
                matrix: resolved.matrix.to_cols_array(),
                console_unit_size: [
                    1.0 / self.unscaled_width as f32,
                    1.0 / self.unscaled_height as f32,
                ],
                _pad: [0.0; 2],
            };
            backend.draw_batched(&uniforms, self.buffer.len(), resolved.scissor)?;
        }
        if !self.retained {
            self.buffer.clear();
            self.dirty = false;
        }
        Ok(())
    }

    /// Draw stretched over the whole viewport.
    pub fn draw_viewport<B: TerminalBackend>(&mut self, backend: &mut B) -> Result<(), TerminalError> {
        self.draw(backend, Placement::Viewport)
    }

    /// Draw pixel-perfect at an integer pixel offset.
    pub fn draw_translated<B: TerminalBackend>(
        &mut self,
        backend: &mut B,
        x: i32,
        y: i32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<(), TerminalError> {
        self.draw(backend, Placement::Translated { x, y, viewport_width, viewport_height })
    }

    /// Draw translated and non-uniformly scaled.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_transformed<B: TerminalBackend>(
        &mut self,
        backend: &mut B,
        x: i32,
        y: i32,
        scale_x: f32,
        scale_y: f32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<(), TerminalError> {
        self.draw(
            backend,
            Placement::Transformed { x, y, scale_x, scale_y, viewport_width, viewport_height },
        )
    }

    /// Draw pixel-perfect, aligned within the viewport.
    pub fn draw_aligned<B: TerminalBackend>(
        &mut self,
        backend: &mut B,
        h: HAlign,
        v: VAlign,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<(), TerminalError> {
        self.draw(backend, Placement::Aligned { h, v, viewport_width, viewport_height })
    }

    /// Draw with an arbitrary caller-supplied transform.
    pub fn draw_matrix<B: TerminalBackend>(
        &mut self,
        backend: &mut B,
        matrix: Mat4,
    ) -> Result<(), TerminalError> {
        self.draw(backend, Placement::Matrix(matrix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{ColorFormat, GlyphUv};
    use crate::backend::{BackendError, ScissorRect};
    use crate::error::RejectReason;
    use crate::record::TILE_RECORD_SIZE;

    /// Backend double that records every call the draw protocol makes.
    #[derive(Debug, Default)]
    struct MockBackend {
        atlas_sets: Vec<FragmentMode>,
        table_uploads: Vec<usize>,
        tile_uploads: Vec<usize>,
        last_tile_bytes: Vec<u8>,
        draws: Vec<(usize, Option<ScissorRect>)>,
    }

    impl TerminalBackend for MockBackend {
        fn set_atlas(
            &mut self,
            _data: &AtlasData<'_>,
            mode: FragmentMode,
        ) -> Result<(), BackendError> {
            self.atlas_sets.push(mode);
            Ok(())
        }

        fn upload_glyph_table(&mut self, table: &[GlyphUv]) -> Result<(), BackendError> {
            self.table_uploads.push(table.len());
            Ok(())
        }

        fn upload_tiles(&mut self, bytes: &[u8], tile_count: usize) -> Result<(), BackendError> {
            assert_eq!(bytes.len(), tile_count * TILE_RECORD_SIZE);
            self.tile_uploads.push(tile_count);
            self.last_tile_bytes = bytes.to_vec();
            Ok(())
        }

        fn draw_batched(
            &mut self,
            _uniforms: &DrawUniforms,
            tile_count: usize,
            scissor: Option<ScissorRect>,
        ) -> Result<(), BackendError> {
            self.draws.push((tile_count, scissor));
            Ok(())
        }
    }

    const GLYPHS: [GlyphUv; 8] = {
        let glyph = GlyphUv { uv: [0.0, 1.0, 0.0, 1.0], page: 0.0 };
        [glyph; 8]
    };

    fn atlas(pixels: &[u8]) -> AtlasData<'_> {
        AtlasData {
            pixels,
            width: 2,
            height: 2,
            pages: 1,
            channel_size: 1,
            format: ColorFormat::Rgba,
            glyphs: &GLYPHS,
        }
    }

    /// 2x2 console of 8x8 tiles at pixel scale 1.
    fn terminal(backend: &mut MockBackend) -> Terminal {
        let pixels = vec![0u8; 16];
        Terminal::new(TermSize::tiles(2, 2, 1, 8, 8), atlas(&pixels), backend).unwrap()
    }

    /// Creation derives console dimensions and seeds one console of tile
    /// capacity.
    #[test]
    fn creation() {
        let mut backend = MockBackend::default();
        let term = terminal(&mut backend);
        assert_eq!(term.grid_size(), (2, 2));
        assert_eq!(term.unscaled_pixel_size(), (16, 16));
        assert_eq!(term.scaled_pixel_size(), (16, 16));
        assert_eq!(term.tile_size(), (8, 8));
        assert_eq!(term.glyph_count(), 8);
        assert_eq!(term.fragment_mode(), FragmentMode::FullColor);
        assert_eq!(term.tile_count(), 0);
        assert_eq!(backend.atlas_sets, vec![FragmentMode::FullColor]);
        assert_eq!(backend.table_uploads, vec![8]);
    }

    /// Pixel-sized consoles floor to whole tiles when asked.
    #[test]
    fn pixel_sizing() {
        let mut backend = MockBackend::default();
        let pixels = vec![0u8; 16];
        let term = Terminal::new(
            TermSize {
                width: 21,
                height: 19,
                mode: SizeMode::UnscaledPixels,
                floor_pixels_to_tiles: true,
                pixel_scale: 2,
                tile_width: 8,
                tile_height: 8,
            },
            atlas(&pixels),
            &mut backend,
        )
        .unwrap();
        assert_eq!(term.unscaled_pixel_size(), (16, 16));
        assert_eq!(term.scaled_pixel_size(), (32, 32));
        assert_eq!(term.grid_size(), (2, 2));
    }

    /// The documented round trip: one grid tile, one draw, batch empties in
    /// auto-clear mode.
    #[test]
    fn push_draw_round_trip() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(0, 0, 5, Rgba::WHITE, Rgba::TRANSPARENT).unwrap();
        assert_eq!(term.tile_count(), 1);
        term.draw_viewport(&mut backend).unwrap();
        assert_eq!(term.tile_count(), 0);
        assert_eq!(backend.tile_uploads, vec![1]);
        assert_eq!(backend.draws, vec![(1, None)]);
    }

    /// In retained mode the batch survives draws until an explicit clear.
    #[test]
    fn retained_mode() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.set_retained(true);
        term.push_grid(0, 0, 5, Rgba::WHITE, Rgba::TRANSPARENT).unwrap();
        term.draw_viewport(&mut backend).unwrap();
        assert_eq!(term.tile_count(), 1);
        term.draw_viewport(&mut backend).unwrap();
        assert_eq!(term.tile_count(), 1);
        // Unchanged records upload once; both frames draw.
        assert_eq!(backend.tile_uploads, vec![1]);
        assert_eq!(backend.draws.len(), 2);
        term.clear();
        assert_eq!(term.tile_count(), 0);
        term.draw_viewport(&mut backend).unwrap();
        assert_eq!(backend.draws.len(), 2);
    }

    /// An empty batch performs no upload and no draw.
    #[test]
    fn empty_draw_is_noop() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.draw_viewport(&mut backend).unwrap();
        assert!(backend.tile_uploads.is_empty());
        assert!(backend.draws.is_empty());
    }

    /// Records reach the backend in push order (painter's algorithm).
    #[test]
    fn fifo_submission_order() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(1, 1, 2, Rgba::RED, Rgba::BLACK).unwrap();
        term.push_grid(1, 1, 3, Rgba::BLUE, Rgba::BLACK).unwrap();
        term.draw_viewport(&mut backend).unwrap();
        let bytes = &backend.last_tile_bytes;
        let glyph_at = |tile: usize| {
            let off = tile * TILE_RECORD_SIZE + 8;
            u16::from_le_bytes([bytes[off], bytes[off + 1]])
        };
        assert_eq!(glyph_at(0), 2);
        assert_eq!(glyph_at(1), 3);
    }

    /// Out-of-grid pushes are reported and leave the count unchanged.
    #[test]
    fn grid_rejection() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2)] {
            assert_eq!(
                term.push_grid(x, y, 0, Rgba::WHITE, Rgba::BLACK),
                Err(TerminalError::TileRejected(RejectReason::OutOfBounds))
            );
        }
        assert_eq!(term.tile_count(), 0);
    }

    /// Free tiles are accepted while any pixel overlaps the console and
    /// rejected once fully outside.
    #[test]
    fn free_tile_culling() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_free(-7, -7, 0, Rgba::WHITE, Rgba::BLACK).unwrap();
        term.push_free(15, 15, 0, Rgba::WHITE, Rgba::BLACK).unwrap();
        assert_eq!(term.tile_count(), 2);
        assert_eq!(
            term.push_free(-8, 0, 0, Rgba::WHITE, Rgba::BLACK),
            Err(TerminalError::TileRejected(RejectReason::OutOfBounds))
        );
        assert_eq!(
            term.push_free(16, 0, 0, Rgba::WHITE, Rgba::BLACK),
            Err(TerminalError::TileRejected(RejectReason::OutOfBounds))
        );
        assert_eq!(term.tile_count(), 2);
    }

    /// Glyph ids beyond the atlas are rejected by every push variant.
    #[test]
    fn glyph_rejection() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        let rejected = Err(TerminalError::TileRejected(RejectReason::BadGlyph));
        assert_eq!(term.push_grid(0, 0, 8, Rgba::WHITE, Rgba::BLACK), rejected);
        assert_eq!(term.push_free(0, 0, 8, Rgba::WHITE, Rgba::BLACK), rejected);
        assert_eq!(term.push_fill(8, Rgba::WHITE, Rgba::BLACK), rejected);
        assert_eq!(term.tile_count(), 0);
    }

    /// The fill tile covers the whole console from the origin.
    #[test]
    fn fill_covers_console() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_fill(0, Rgba::TRANSPARENT, Rgba::NAVY).unwrap();
        term.draw_viewport(&mut backend).unwrap();
        let bytes = &backend.last_tile_bytes;
        let read_u16 = |off: usize| u16::from_le_bytes([bytes[off], bytes[off + 1]]);
        assert_eq!(i32::from(read_u16(0)) - crate::POSITION_BIAS, 0);
        assert_eq!(i32::from(read_u16(2)) - crate::POSITION_BIAS, 0);
        assert_eq!(read_u16(4), 16);
        assert_eq!(read_u16(6), 16);
    }

    /// Resizing invalidates pending tiles but keeps buffer capacity.
    #[test]
    fn resize_resets_tiles() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(0, 0, 1, Rgba::WHITE, Rgba::BLACK).unwrap();
        term.resize(TermSize::tiles(3, 3, 2, 8, 8)).unwrap();
        assert_eq!(term.tile_count(), 0);
        assert_eq!(term.grid_size(), (3, 3));
        assert_eq!(term.pixel_scale(), 2);
        assert_eq!(term.scaled_pixel_size(), (48, 48));
    }

    /// Replacing the atlas invalidates pending tiles and can change the
    /// fragment mode.
    #[test]
    fn atlas_replacement_resets_tiles() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(0, 0, 1, Rgba::WHITE, Rgba::BLACK).unwrap();
        let pixels = vec![0u8; 4];
        let stencil = AtlasData {
            pixels: &pixels,
            width: 2,
            height: 2,
            pages: 1,
            channel_size: 1,
            format: ColorFormat::G,
            glyphs: &GLYPHS[..4],
        };
        term.set_atlas(stencil, &mut backend).unwrap();
        assert_eq!(term.tile_count(), 0);
        assert_eq!(term.glyph_count(), 4);
        assert_eq!(term.fragment_mode(), FragmentMode::Stencil);
        assert_eq!(backend.atlas_sets, vec![FragmentMode::FullColor, FragmentMode::Stencil]);
    }

    /// A translated draw hands the backend the clamped scissor.
    #[test]
    fn translated_draw_scissor() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(0, 0, 1, Rgba::WHITE, Rgba::BLACK).unwrap();
        term.draw_translated(&mut backend, -4, 2, 100, 100).unwrap();
        assert_eq!(
            backend.draws,
            vec![(1, Some(ScissorRect { x: 0, y: 2, width: 12, height: 16 }))]
        );
    }

    /// A draw whose clip is empty uploads nothing visible and still
    /// honors auto-clear.
    #[test]
    fn fully_clipped_draw() {
        let mut backend = MockBackend::default();
        let mut term = terminal(&mut backend);
        term.push_grid(0, 0, 1, Rgba::WHITE, Rgba::BLACK).unwrap();
        term.draw_translated(&mut backend, 500, 0, 100, 100).unwrap();
        assert!(backend.draws.is_empty());
        assert_eq!(term.tile_count(), 0);
    }

    /// Invalid sizing parameters are caller errors, not rejections.
    #[test]
    fn invalid_sizes() {
        let mut backend = MockBackend::default();
        let pixels = vec![0u8; 16];
        assert!(matches!(
            Terminal::new(TermSize::tiles(0, 2, 1, 8, 8), atlas(&pixels), &mut backend),
            Err(TerminalError::InvalidArgument(_))
        ));
        assert!(matches!(
            Terminal::new(TermSize::tiles(2, 2, 0, 8, 8), atlas(&pixels), &mut backend),
            Err(TerminalError::InvalidArgument(_))
        ));
        let mut term = terminal(&mut backend);
        assert!(matches!(
            term.resize(TermSize::tiles(2, 2, 1, 0, 8)),
            Err(TerminalError::InvalidArgument(_))
        ));
    }

    /// Default tile dimensions that cannot be encoded in the wire size
    /// field fail at construction instead of corrupting later pushes.
    #[test]
    fn oversized_default_tile_size() {
        let mut backend = MockBackend::default();
        let pixels = vec![0u8; 16];
        assert!(matches!(
            Terminal::new(TermSize::tiles(1, 1, 1, 70_000, 8), atlas(&pixels), &mut backend),
            Err(TerminalError::InvalidArgument(_))
        ));
        let mut term = terminal(&mut backend);
        assert!(matches!(
            term.resize(TermSize::tiles(1, 1, 1, 8, 70_000)),
            Err(TerminalError::InvalidArgument(_))
        ));
        // 65535 is the largest encodable tile edge.
        term.resize(TermSize::tiles(1, 1, 1, 65_535, 8)).unwrap();
        term.push_grid(0, 0, 0, Rgba::WHITE, Rgba::BLACK).unwrap();
    }

    /// Grid sizes whose pixel dimensions overflow u32 are rejected instead
    /// of wrapping.
    #[test]
    fn console_dimension_overflow() {
        let mut backend = MockBackend::default();
        let pixels = vec![0u8; 16];
        assert!(matches!(
            Terminal::new(TermSize::tiles(u32::MAX, 1, 1, 8, 8), atlas(&pixels), &mut backend),
            Err(TerminalError::InvalidArgument(_))
        ));
        let mut term = terminal(&mut backend);
        assert!(matches!(
            term.resize(TermSize {
                width: 16,
                height: 16,
                mode: SizeMode::UnscaledPixels,
                floor_pixels_to_tiles: false,
                pixel_scale: u32::MAX,
                tile_width: 8,
                tile_height: 8,
            }),
            Err(TerminalError::InvalidArgument(_))
        ));
    }

    /// A pixel-sized console smaller than one tile has no usable grid and
    /// is rejected up front.
    #[test]
    fn sub_tile_console_rejected() {
        let mut backend = MockBackend::default();
        let pixels = vec![0u8; 16];
        let size = TermSize {
            width: 4,
            height: 4,
            mode: SizeMode::UnscaledPixels,
            floor_pixels_to_tiles: false,
            pixel_scale: 1,
            tile_width: 8,
            tile_height: 8,
        };
        assert!(matches!(
            Terminal::new(size, atlas(&pixels), &mut backend),
            Err(TerminalError::InvalidArgument(_))
        ));
    }
}
