//! Coordinate mapping and tile validation.
//!
//! Pure functions translating a caller's intent (grid cell or free pixel
//! position, default or explicit size) into a validated pixel rectangle, or
//! rejecting the tile. Every rejection is reported; nothing is silently
//! dropped.

use crate::error::{RejectReason, TerminalError};
use crate::record::{MAX_TILE_SIZE, POSITION_BIAS};

/// Console geometry the mapper validates against, in unscaled pixels.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub tiles_wide: u32,
    pub tiles_tall: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

/// Largest signed coordinate the biased u16 wire field can hold.
const MAX_BIASED_POSITION: i64 = (u16::MAX as i64) - POSITION_BIAS as i64;

#[inline]
fn rejected(reason: RejectReason) -> TerminalError {
    TerminalError::TileRejected(reason)
}

/// Check that a signed pixel position survives the bias encoding.
fn check_representable(x: i64, y: i64) -> Result<(), TerminalError> {
    let range = i64::from(-POSITION_BIAS)..=MAX_BIASED_POSITION;
    if range.contains(&x) && range.contains(&y) {
        Ok(())
    } else {
        Err(rejected(RejectReason::OutOfBounds))
    }
}

/// Map a grid cell to its pixel position, rejecting coordinates outside the
/// tile grid.
pub fn map_grid(geometry: &Geometry, grid_x: i32, grid_y: i32) -> Result<(i32, i32), TerminalError> {
    if grid_x < 0
        || grid_y < 0
        || grid_x as u32 >= geometry.tiles_wide
        || grid_y as u32 >= geometry.tiles_tall
    {
        return Err(rejected(RejectReason::OutOfBounds));
    }
    let pixel_x = i64::from(grid_x) * i64::from(geometry.tile_width);
    let pixel_y = i64::from(grid_y) * i64::from(geometry.tile_height);
    check_representable(pixel_x, pixel_y)?;
    Ok((pixel_x as i32, pixel_y as i32))
}

/// Validate an explicit tile size: both dimensions in `(0, MAX_TILE_SIZE]`,
/// further capped to what the u16 wire field can encode.
pub fn check_size(width: i32, height: i32) -> Result<(u32, u32), TerminalError> {
    let max = MAX_TILE_SIZE.min(u32::from(u16::MAX));
    if width <= 0 || height <= 0 || width as u32 > max || height as u32 > max {
        return Err(rejected(RejectReason::BadSize));
    }
    Ok((width as u32, height as u32))
}

/// Validate a free pixel-positioned tile: the rectangle must intersect the
/// console area `[0, pixel_width) x [0, pixel_height)`. A tile straddling an
/// edge is accepted; a fully off-screen one is not.
pub fn check_free(
    geometry: &Geometry,
    pixel_x: i32,
    pixel_y: i32,
    width: u32,
    height: u32,
) -> Result<(), TerminalError> {
    let x = i64::from(pixel_x);
    let y = i64::from(pixel_y);
    let onscreen = x + i64::from(width) > 0
        && x < i64::from(geometry.pixel_width)
        && y + i64::from(height) > 0
        && y < i64::from(geometry.pixel_height);
    if !onscreen {
        return Err(rejected(RejectReason::OutOfBounds));
    }
    check_representable(x, y)
}

/// Validate a glyph id against the atlas glyph count.
pub fn check_glyph(glyph: u16, glyph_count: usize) -> Result<(), TerminalError> {
    if usize::from(glyph) >= glyph_count {
        return Err(rejected(RejectReason::BadGlyph));
    }
    Ok(())
}
