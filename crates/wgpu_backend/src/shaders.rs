//! WGSL shader for the batched tile draw.
//!
//! The vertex stage pulls tile records straight out of a storage buffer (six
//! vertices per tile, no vertex buffers). Records are 18 bytes packed, so the
//! buffer binds as `array<u32>` and fields are extracted with shifts. Every
//! u16 field sits at an even byte offset (the stride is 18 and the fields
//! start at 0, 2, 4, 6, 8), so a u16 never straddles a word boundary.
//!
//! Three fragment entry points share the module, one per atlas shading mode.

pub const TILE_SHADER: &str = r#"
struct DrawUniforms {
    matrix: mat4x4<f32>,
    // Size of one console pixel in console space: 1 / unscaled console size.
    console_unit_size: vec2<f32>,
    _pad: vec2<f32>,
}

@group(0) @binding(0) var<uniform> draw: DrawUniforms;
@group(0) @binding(1) var<storage, read> tiles: array<u32>;
// Five floats per glyph: left-U, right-U, top-V, bottom-V, page.
@group(0) @binding(2) var<storage, read> glyph_table: array<f32>;
@group(0) @binding(3) var atlas: texture_2d_array<f32>;
@group(0) @binding(4) var atlas_sampler: sampler;

const TILE_STRIDE: u32 = 18u;
const POSITION_BIAS: f32 = 16384.0;

fn tile_u16(byte_offset: u32) -> u32 {
    let word = tiles[byte_offset / 4u];
    return (word >> ((byte_offset % 4u) * 8u)) & 0xffffu;
}

fn tile_u8(byte_offset: u32) -> u32 {
    let word = tiles[byte_offset / 4u];
    return (word >> ((byte_offset % 4u) * 8u)) & 0xffu;
}

fn tile_color(byte_offset: u32) -> vec4<f32> {
    return vec4<f32>(
        f32(tile_u8(byte_offset)),
        f32(tile_u8(byte_offset + 1u)),
        f32(tile_u8(byte_offset + 2u)),
        f32(tile_u8(byte_offset + 3u)),
    ) / 255.0;
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) @interpolate(flat) page: u32,
    @location(2) @interpolate(flat) fg: vec4<f32>,
    @location(3) @interpolate(flat) bg: vec4<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let tile = vertex_index / 6u;
    let corner = vertex_index % 6u;
    let base = tile * TILE_STRIDE;

    let x = f32(tile_u16(base)) - POSITION_BIAS;
    let y = f32(tile_u16(base + 2u)) - POSITION_BIAS;
    let w = f32(tile_u16(base + 4u));
    let h = f32(tile_u16(base + 6u));
    let glyph = tile_u16(base + 8u);

    // Two counter-clockwise triangles: (l,t)(l,b)(r,b) and (l,t)(r,b)(r,t).
    var cx = 0.0;
    if corner == 2u || corner == 4u || corner == 5u {
        cx = 1.0;
    }
    var cy = 0.0;
    if corner == 1u || corner == 2u || corner == 4u {
        cy = 1.0;
    }

    let pixel = vec2<f32>(x + cx * w, y + cy * h);

    var out: VertexOutput;
    out.position = draw.matrix * vec4<f32>(pixel * draw.console_unit_size, 0.0, 1.0);

    let g = glyph * 5u;
    out.uv = vec2<f32>(
        mix(glyph_table[g], glyph_table[g + 1u], cx),
        mix(glyph_table[g + 2u], glyph_table[g + 3u], cy),
    );
    out.page = u32(glyph_table[g + 4u]);
    out.fg = tile_color(base + 10u);
    out.bg = tile_color(base + 14u);
    return out;
}

// Full-color atlas: glyph RGB tints the foreground, glyph alpha blends it
// over the background.
@fragment
fn fs_full(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(atlas, atlas_sampler, in.uv, in.page);
    let fg = vec4<f32>(in.fg.rgb * texel.rgb, in.fg.a);
    return mix(in.bg, fg, texel.a);
}

// Gray + alpha atlas: red carries the gray level, green carries the alpha.
@fragment
fn fs_green(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(atlas, atlas_sampler, in.uv, in.page);
    let fg = vec4<f32>(in.fg.rgb * texel.r, in.fg.a);
    return mix(in.bg, fg, texel.g);
}

// Single-channel atlas used as a pure stencil between bg and fg.
@fragment
fn fs_stencil(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(atlas, atlas_sampler, in.uv, in.page);
    return mix(in.bg, in.fg, texel.r);
}
"#;
