//! RGBA color primitive shared by tile records and clear colors.

use bytemuck::{Pod, Zeroable};

/// An 8-bit-per-channel RGBA color.
///
/// This is the color type stored inside [`crate::TileRecord`], so it is
/// `#[repr(C)]` and `Pod`. Alpha is straight (not premultiplied); the
/// fragment stage blends `bg` toward `fg * glyph` by the sampled glyph alpha.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const LIME: Self = Self::new(0, 255, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const SILVER: Self = Self::new(192, 192, 192, 255);
    pub const GRAY: Self = Self::new(128, 128, 128, 255);
    pub const MAROON: Self = Self::new(128, 0, 0, 255);
    pub const YELLOW: Self = Self::new(255, 255, 0, 255);
    pub const OLIVE: Self = Self::new(128, 128, 0, 255);
    pub const GREEN: Self = Self::new(0, 128, 0, 255);
    pub const AQUA: Self = Self::new(0, 255, 255, 255);
    pub const TEAL: Self = Self::new(0, 128, 128, 255);
    pub const NAVY: Self = Self::new(0, 0, 128, 255);
    pub const FUCHSIA: Self = Self::new(255, 0, 255, 255);
    pub const PURPLE: Self = Self::new(128, 0, 128, 255);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a color from 8-bit channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from float channels in `[0, 1]`; values are clamped.
    #[inline]
    #[must_use]
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(channel(r), channel(g), channel(b), channel(a))
    }

    /// Convert to float channels in `[0, 1]`, in RGBA order.
    #[inline]
    #[must_use]
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Float conversion round-trips the channel values it can represent.
    #[test]
    fn f32_round_trip() {
        let color = Rgba::new(255, 0, 128, 64);
        let floats = color.to_f32_array();
        assert_eq!(Rgba::from_f32(floats[0], floats[1], floats[2], floats[3]), color);
    }

    /// Out-of-range float channels clamp instead of wrapping.
    #[test]
    fn from_f32_clamps() {
        assert_eq!(Rgba::from_f32(2.0, -1.0, 0.0, 1.0), Rgba::new(255, 0, 0, 255));
    }
}
