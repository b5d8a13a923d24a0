//! wgpu backend for the glyphterm batched tile renderer.
//!
//! Implements [`glyphterm::TerminalBackend`] on wgpu: tile records render by
//! vertex pulling from a storage buffer, six vertices per tile, one pipeline
//! per atlas shading mode.

mod pipelines;
mod renderer;
mod resources;
mod shaders;

pub use renderer::WgpuBackend;
pub use resources::texture_format;
