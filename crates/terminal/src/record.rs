//! The tile wire record and the growable batch buffer.

use bytemuck::{Pod, Zeroable};

use crate::color::Rgba;
use crate::error::TerminalError;

/// Bias added to signed pixel positions before they are stored in the
/// unsigned 16-bit wire fields. Tiles hanging off the top/left edge keep a
/// representable position without a sign bit; the shader subtracts the same
/// constant. 16384 leaves headroom well beyond any sane off-screen excursion
/// while keeping the full console range addressable.
pub const POSITION_BIAS: i32 = 16384;

/// Largest accepted tile pixel dimension. Kept from the original
/// implementation constant so explicit sizes stay within the u16 wire field.
pub const MAX_TILE_SIZE: u32 = 65565;

/// One batched draw command, in the exact 18-byte layout uploaded to the GPU.
///
/// Layout (little-endian, `#[repr(C)]`, no padding):
///
/// | bytes  | field      | encoding                        |
/// |--------|------------|---------------------------------|
/// | 0..4   | `position` | `u16` x, y; biased by [`POSITION_BIAS`] |
/// | 4..8   | `size`     | `u16` width, height in pixels   |
/// | 8..10  | `glyph`    | `u16` atlas glyph index         |
/// | 10..14 | `fg`       | RGBA, one byte per channel      |
/// | 14..18 | `bg`       | RGBA, one byte per channel      |
///
/// Supported targets are little-endian, so casting a record slice to bytes
/// with bytemuck yields this layout directly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct TileRecord {
    position: [u16; 2],
    size: [u16; 2],
    glyph: u16,
    fg: Rgba,
    bg: Rgba,
}

/// Size in bytes of one packed [`TileRecord`].
pub const TILE_RECORD_SIZE: usize = std::mem::size_of::<TileRecord>();

impl TileRecord {
    /// Pack a validated tile. The caller (the coordinate mapper) guarantees
    /// `x + POSITION_BIAS` and `y + POSITION_BIAS` fit in `u16` and that
    /// `width`/`height` are in `(0, MAX_TILE_SIZE]`.
    #[inline]
    #[must_use]
    pub fn new(x: i32, y: i32, width: u32, height: u32, glyph: u16, fg: Rgba, bg: Rgba) -> Self {
        debug_assert!((0..=i32::from(u16::MAX)).contains(&(x + POSITION_BIAS)));
        debug_assert!((0..=i32::from(u16::MAX)).contains(&(y + POSITION_BIAS)));
        debug_assert!(width > 0 && width <= MAX_TILE_SIZE.min(u32::from(u16::MAX)));
        debug_assert!(height > 0 && height <= MAX_TILE_SIZE.min(u32::from(u16::MAX)));
        Self {
            position: [(x + POSITION_BIAS) as u16, (y + POSITION_BIAS) as u16],
            size: [width as u16, height as u16],
            glyph,
            fg,
            bg,
        }
    }

    /// Signed x position in console pixels, with the bias removed.
    #[inline]
    #[must_use]
    pub fn x(&self) -> i32 {
        i32::from(self.position[0]) - POSITION_BIAS
    }

    /// Signed y position in console pixels, with the bias removed.
    #[inline]
    #[must_use]
    pub fn y(&self) -> i32 {
        i32::from(self.position[1]) - POSITION_BIAS
    }

    /// Tile width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        u32::from(self.size[0])
    }

    /// Tile height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        u32::from(self.size[1])
    }

    /// Atlas glyph index.
    #[inline]
    #[must_use]
    pub fn glyph(&self) -> u16 {
        self.glyph
    }

    /// Foreground color.
    #[inline]
    #[must_use]
    pub fn fg(&self) -> Rgba {
        self.fg
    }

    /// Background color.
    #[inline]
    #[must_use]
    pub fn bg(&self) -> Rgba {
        self.bg
    }
}

/// Growable, append-only buffer of tile records.
///
/// `count <= capacity` always; capacity only grows (geometric doubling) and
/// never shrinks implicitly. A failed growth leaves the buffer exactly as it
/// was, so an in-progress push aborts with no partial record written.
#[derive(Debug)]
pub struct TileBuffer {
    records: Vec<TileRecord>,
}

/// Capacity an empty buffer jumps to on its first growth.
const MIN_GROWN_CAPACITY: usize = 8;

impl TileBuffer {
    /// Allocate a buffer with room for `capacity` records (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Ensure capacity for one more record, doubling the allocation if the
    /// buffer is full. On allocation failure returns
    /// [`TerminalError::OutOfMemory`] with contents and capacity untouched.
    pub fn reserve(&mut self) -> Result<(), TerminalError> {
        if self.records.len() < self.records.capacity() {
            return Ok(());
        }
        let additional = self.records.capacity().max(MIN_GROWN_CAPACITY);
        self.records
            .try_reserve_exact(additional)
            .map_err(|_| TerminalError::OutOfMemory)
    }

    /// Append a record. Only called after a successful [`Self::reserve`].
    #[inline]
    pub fn append(&mut self, record: TileRecord) {
        debug_assert!(self.records.len() < self.records.capacity());
        self.records.push(record);
    }

    /// Reset the live count to zero without releasing capacity. Idempotent.
    #[inline]
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of live records since the last clear.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no live records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocated record slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// The live records.
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    /// The live prefix as packed wire bytes (`len * 18`).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u16) -> TileRecord {
        TileRecord::new(i32::from(n), 0, 8, 8, n, Rgba::WHITE, Rgba::BLACK)
    }

    /// The wire record is exactly 18 bytes with no padding.
    #[test]
    fn record_layout() {
        assert_eq!(TILE_RECORD_SIZE, 18);
    }

    /// Bias packing round-trips signed positions, including negative ones.
    #[test]
    fn bias_round_trip() {
        for (x, y) in [(0, 0), (-7, -3), (1024, 768), (-16384, 49151)] {
            let rec = TileRecord::new(x, y, 8, 16, 3, Rgba::WHITE, Rgba::TRANSPARENT);
            assert_eq!(rec.x(), x);
            assert_eq!(rec.y(), y);
            assert_eq!(rec.width(), 8);
            assert_eq!(rec.height(), 16);
        }
    }

    /// Packed bytes follow the documented little-endian layout.
    #[test]
    fn record_bytes() {
        let rec = TileRecord::new(-4, 2, 8, 16, 0x0102, Rgba::new(1, 2, 3, 4), Rgba::new(5, 6, 7, 8));
        let bytes: &[u8] = bytemuck::bytes_of(&rec);
        let x = u16::from_le_bytes([bytes[0], bytes[1]]);
        let y = u16::from_le_bytes([bytes[2], bytes[3]]);
        assert_eq!(i32::from(x) - POSITION_BIAS, -4);
        assert_eq!(i32::from(y) - POSITION_BIAS, 2);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 8);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 16);
        assert_eq!(u16::from_le_bytes([bytes[8], bytes[9]]), 0x0102);
        assert_eq!(&bytes[10..14], &[1, 2, 3, 4]);
        assert_eq!(&bytes[14..18], &[5, 6, 7, 8]);
    }

    /// Growth preserves every record already written, for pushes well past
    /// the initial capacity.
    #[test]
    fn growth_preserves_contents() {
        let mut buffer = TileBuffer::with_capacity(4);
        assert_eq!(buffer.capacity(), 4);
        for n in 0..100u16 {
            buffer.reserve().unwrap();
            buffer.append(record(n));
        }
        assert_eq!(buffer.len(), 100);
        assert!(buffer.capacity() >= 100);
        for (n, rec) in buffer.records().iter().enumerate() {
            assert_eq!(*rec, record(n as u16));
        }
    }

    /// Records appear in the byte stream in FIFO push order.
    #[test]
    fn fifo_byte_order() {
        let mut buffer = TileBuffer::with_capacity(2);
        for n in 0..3u16 {
            buffer.reserve().unwrap();
            buffer.append(record(n));
        }
        let bytes = buffer.as_bytes();
        assert_eq!(bytes.len(), 3 * TILE_RECORD_SIZE);
        for n in 0..3usize {
            let glyph_off = n * TILE_RECORD_SIZE + 8;
            let glyph = u16::from_le_bytes([bytes[glyph_off], bytes[glyph_off + 1]]);
            assert_eq!(glyph, n as u16);
        }
    }

    /// Clear resets the count, keeps capacity, and is idempotent.
    #[test]
    fn clear_is_idempotent() {
        let mut buffer = TileBuffer::with_capacity(2);
        buffer.reserve().unwrap();
        buffer.append(record(0));
        let capacity = buffer.capacity();
        buffer.clear();
        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), capacity);
    }

    /// A zero-capacity request still allocates at least one slot.
    #[test]
    fn minimum_capacity() {
        let buffer = TileBuffer::with_capacity(0);
        assert!(buffer.capacity() >= 1);
    }
}
