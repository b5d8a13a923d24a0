//! Frame placement: resolving a draw request into a transform matrix and a
//! clamped scissor rectangle.
//!
//! Console space is the unit square with origin at the top-left, y-down; the
//! screen matrix maps it to clip space. Scissor rectangles use framebuffer
//! pixels with the same top-left origin, applied uniformly across all
//! placement modes.

use glam::{Mat4, Vec4};

use crate::backend::ScissorRect;
use crate::error::TerminalError;

/// Horizontal placement of the console within a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical placement of the console within a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// How a terminal draw is placed on the render target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Stretch the console over the whole viewport. No clip; pixels may
    /// distort if the aspect ratios differ.
    Viewport,
    /// Pixel-perfect draw translated by an integer pixel offset, clipped to
    /// the console's on-screen extent.
    Translated {
        x: i32,
        y: i32,
        viewport_width: u32,
        viewport_height: u32,
    },
    /// Translated and non-uniformly scaled, clip scaled to match.
    Transformed {
        x: i32,
        y: i32,
        scale_x: f32,
        scale_y: f32,
        viewport_width: u32,
        viewport_height: u32,
    },
    /// Pixel-perfect draw aligned to the viewport edges or center.
    Aligned {
        h: HAlign,
        v: VAlign,
        viewport_width: u32,
        viewport_height: u32,
    },
    /// Arbitrary caller-supplied transform, no clip.
    Matrix(Mat4),
}

/// A resolved placement: the matrix to upload and the clip to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement {
    pub matrix: Mat4,
    pub scissor: Option<ScissorRect>,
}

impl ResolvedPlacement {
    /// Whether the scissor leaves nothing visible, making the draw a no-op.
    pub fn is_fully_clipped(&self) -> bool {
        self.scissor
            .is_some_and(|s| s.width == 0 || s.height == 0)
    }
}

/// Orthographic screen matrix mapping the unit square (origin top-left,
/// y-down) to clip space.
#[must_use]
pub fn screen_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::new(2.0, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -2.0, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(-1.0, 1.0, 0.0, 1.0),
    )
}

/// Screen matrix scaled to `console` pixels and translated by `(x, y)`
/// pixels within a viewport, both in framebuffer pixels, origin top-left.
fn placed_matrix(x: i32, y: i32, console: (f32, f32), viewport: (u32, u32)) -> Mat4 {
    let viewport_w = viewport.0 as f32;
    let viewport_h = viewport.1 as f32;
    let scale_x = console.0 / viewport_w;
    let scale_y = console.1 / viewport_h;
    let translate_x = 2.0f32.mul_add(x as f32 / viewport_w, -1.0);
    let translate_y = (-2.0f32).mul_add(y as f32 / viewport_h, 1.0);
    Mat4::from_cols(
        Vec4::new(2.0 * scale_x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -2.0 * scale_y, 0.0, 0.0),
        Vec4::Z,
        Vec4::new(translate_x, translate_y, 0.0, 1.0),
    )
}

/// Clamp a translated console rectangle into a scissor: the origin never goes
/// negative (the extent shrinks by the overhang) and the extent never escapes
/// the viewport.
fn clamped_scissor(x: i32, y: i32, width: f32, height: f32, viewport: (u32, u32)) -> ScissorRect {
    let mut scissor_x = x.max(0);
    let mut scissor_y = y.max(0);
    let mut scissor_w = width.max(0.0).ceil() as i64 + i64::from(x - scissor_x);
    let mut scissor_h = height.max(0.0).ceil() as i64 + i64::from(y - scissor_y);
    scissor_x = scissor_x.min(viewport.0 as i32);
    scissor_y = scissor_y.min(viewport.1 as i32);
    scissor_w = scissor_w.clamp(0, i64::from(viewport.0) - i64::from(scissor_x));
    scissor_h = scissor_h.clamp(0, i64::from(viewport.1) - i64::from(scissor_y));
    ScissorRect {
        x: scissor_x as u32,
        y: scissor_y as u32,
        width: scissor_w as u32,
        height: scissor_h as u32,
    }
}

fn check_viewport(width: u32, height: u32) -> Result<(), TerminalError> {
    if width == 0 || height == 0 {
        return Err(TerminalError::InvalidArgument(
            "viewport dimensions must be positive",
        ));
    }
    Ok(())
}

/// Resolve a placement for a console of `scaled_width x scaled_height`
/// on-screen pixels.
pub fn resolve(
    placement: Placement,
    scaled_width: u32,
    scaled_height: u32,
) -> Result<ResolvedPlacement, TerminalError> {
    match placement {
        Placement::Viewport => Ok(ResolvedPlacement {
            matrix: screen_matrix(),
            scissor: None,
        }),
        Placement::Matrix(matrix) => Ok(ResolvedPlacement {
            matrix,
            scissor: None,
        }),
        Placement::Translated {
            x,
            y,
            viewport_width,
            viewport_height,
        } => {
            check_viewport(viewport_width, viewport_height)?;
            let console = (scaled_width as f32, scaled_height as f32);
            Ok(ResolvedPlacement {
                matrix: placed_matrix(x, y, console, (viewport_width, viewport_height)),
                scissor: Some(clamped_scissor(
                    x,
                    y,
                    console.0,
                    console.1,
                    (viewport_width, viewport_height),
                )),
            })
        }
        Placement::Transformed {
            x,
            y,
            scale_x,
            scale_y,
            viewport_width,
            viewport_height,
        } => {
            check_viewport(viewport_width, viewport_height)?;
            if !(scale_x > 0.0 && scale_y > 0.0) {
                return Err(TerminalError::InvalidArgument(
                    "draw scale factors must be positive",
                ));
            }
            let console = (scaled_width as f32 * scale_x, scaled_height as f32 * scale_y);
            Ok(ResolvedPlacement {
                matrix: placed_matrix(x, y, console, (viewport_width, viewport_height)),
                scissor: Some(clamped_scissor(
                    x,
                    y,
                    console.0,
                    console.1,
                    (viewport_width, viewport_height),
                )),
            })
        }
        Placement::Aligned {
            h,
            v,
            viewport_width,
            viewport_height,
        } => {
            check_viewport(viewport_width, viewport_height)?;
            let dx = viewport_width as i64 - i64::from(scaled_width);
            let dy = viewport_height as i64 - i64::from(scaled_height);
            let x = match h {
                HAlign::Left => 0,
                HAlign::Center => dx / 2,
                HAlign::Right => dx,
            } as i32;
            let y = match v {
                VAlign::Top => 0,
                VAlign::Center => dy / 2,
                VAlign::Bottom => dy,
            } as i32;
            resolve(
                Placement::Translated {
                    x,
                    y,
                    viewport_width,
                    viewport_height,
                },
                scaled_width,
                scaled_height,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The viewport placement is the fixed orthographic screen matrix:
    /// (0,0) maps to the top-left clip corner, (1,1) to the bottom-right.
    #[test]
    fn viewport_matrix() {
        let resolved = resolve(Placement::Viewport, 64, 64).unwrap();
        assert!(resolved.scissor.is_none());
        let top_left = resolved.matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = resolved.matrix * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert_eq!(top_left, Vec4::new(-1.0, 1.0, 0.0, 1.0));
        assert_eq!(bottom_right, Vec4::new(1.0, -1.0, 0.0, 1.0));
    }

    /// A translated console occupies exactly its pixel rectangle within the
    /// viewport, in clip coordinates.
    #[test]
    fn translated_matrix() {
        let resolved = resolve(
            Placement::Translated {
                x: 10,
                y: 20,
                viewport_width: 100,
                viewport_height: 200,
            },
            50,
            100,
        )
        .unwrap();
        let top_left = resolved.matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = resolved.matrix * Vec4::new(1.0, 1.0, 0.0, 1.0);
        // x: 10..60 of 100 px -> clip -0.8..0.2; y: 20..120 of 200 -> 0.8..-0.2.
        assert!((top_left.x + 0.8).abs() < 1e-6);
        assert!((top_left.y - 0.8).abs() < 1e-6);
        assert!((bottom_right.x - 0.2).abs() < 1e-6);
        assert!((bottom_right.y + 0.2).abs() < 1e-6);
        assert_eq!(
            resolved.scissor.unwrap(),
            ScissorRect { x: 10, y: 20, width: 50, height: 100 }
        );
    }

    /// Negative translations clamp the scissor origin to zero and shrink the
    /// extent by the overhang, on both axes.
    #[test]
    fn scissor_clamps_at_origin() {
        let resolved = resolve(
            Placement::Translated {
                x: -16,
                y: -8,
                viewport_width: 100,
                viewport_height: 100,
            },
            64,
            64,
        )
        .unwrap();
        assert_eq!(
            resolved.scissor.unwrap(),
            ScissorRect { x: 0, y: 0, width: 48, height: 56 }
        );
    }

    /// The scissor never escapes the viewport, and a console pushed fully
    /// outside resolves as fully clipped.
    #[test]
    fn scissor_clips_to_viewport() {
        let resolved = resolve(
            Placement::Translated {
                x: 80,
                y: 0,
                viewport_width: 100,
                viewport_height: 100,
            },
            64,
            64,
        )
        .unwrap();
        assert_eq!(
            resolved.scissor.unwrap(),
            ScissorRect { x: 80, y: 0, width: 20, height: 64 }
        );

        let offscreen = resolve(
            Placement::Translated {
                x: 200,
                y: 0,
                viewport_width: 100,
                viewport_height: 100,
            },
            64,
            64,
        )
        .unwrap();
        assert!(offscreen.is_fully_clipped());
    }

    /// Scaling stretches both the matrix extent and the scissor.
    #[test]
    fn transformed_scales_scissor() {
        let resolved = resolve(
            Placement::Transformed {
                x: 0,
                y: 0,
                scale_x: 2.0,
                scale_y: 0.5,
                viewport_width: 200,
                viewport_height: 200,
            },
            64,
            64,
        )
        .unwrap();
        assert_eq!(
            resolved.scissor.unwrap(),
            ScissorRect { x: 0, y: 0, width: 128, height: 32 }
        );
    }

    /// Alignment puts the console flush against the requested edges.
    #[test]
    fn aligned_offsets() {
        let resolved = resolve(
            Placement::Aligned {
                h: HAlign::Right,
                v: VAlign::Bottom,
                viewport_width: 100,
                viewport_height: 100,
            },
            60,
            40,
        )
        .unwrap();
        assert_eq!(
            resolved.scissor.unwrap(),
            ScissorRect { x: 40, y: 60, width: 60, height: 40 }
        );

        let centered = resolve(
            Placement::Aligned {
                h: HAlign::Center,
                v: VAlign::Center,
                viewport_width: 100,
                viewport_height: 100,
            },
            60,
            40,
        )
        .unwrap();
        assert_eq!(
            centered.scissor.unwrap(),
            ScissorRect { x: 20, y: 30, width: 60, height: 40 }
        );
    }

    /// Degenerate viewports and non-positive scales are caller errors.
    #[test]
    fn invalid_arguments() {
        assert!(matches!(
            resolve(
                Placement::Translated { x: 0, y: 0, viewport_width: 0, viewport_height: 10 },
                8,
                8
            ),
            Err(TerminalError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve(
                Placement::Transformed {
                    x: 0,
                    y: 0,
                    scale_x: 0.0,
                    scale_y: 1.0,
                    viewport_width: 10,
                    viewport_height: 10,
                },
                8,
                8
            ),
            Err(TerminalError::InvalidArgument(_))
        ));
    }
}
