//! The wgpu terminal backend.
//!
//! Frame protocol: call [`WgpuBackend::begin_frame`] with the target view
//! (and an optional clear color), let one or more terminals draw into it,
//! then [`WgpuBackend::end_frame`]. Each batched draw submits its own render
//! pass; the clear color applies to the first pass of the frame.

use log::debug;

use glyphterm::{
    AtlasData, BackendError, DrawUniforms, FragmentMode, GlyphUv, Rgba, ScissorRect,
    TerminalBackend,
};

use crate::pipelines::Pipelines;
use crate::resources::Resources;

/// wgpu rendering backend for terminals.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: Pipelines,
    resources: Resources,
    fragment_mode: FragmentMode,
    current_view: Option<wgpu::TextureView>,
    pending_clear: Option<Rgba>,
}

impl WgpuBackend {
    /// Create a backend on a fresh headless device, rendering to targets of
    /// the given format.
    pub async fn new(target_format: wgpu::TextureFormat) -> Result<Self, BackendError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                BackendError::InitializationFailed("Failed to find suitable adapter".to_string())
            })?;

        // 16-bit-per-channel atlases need TEXTURE_FORMAT_16BIT_NORM; take it
        // when the adapter offers it.
        let required_features =
            adapter.features() & wgpu::Features::TEXTURE_FORMAT_16BIT_NORM;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Terminal Device"),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_device(device, queue, target_format))
    }

    /// Blocking wrapper around [`Self::new`] for callers without an executor.
    pub fn new_blocking(target_format: wgpu::TextureFormat) -> Result<Self, BackendError> {
        pollster::block_on(Self::new(target_format))
    }

    /// Create a backend on an existing device, e.g. one that also owns a
    /// surface. `target_format` must match the views passed to
    /// [`Self::begin_frame`].
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let pipelines = Pipelines::new(&device, target_format);
        let resources = Resources::new(&device);
        Self {
            device,
            queue,
            pipelines,
            resources,
            fragment_mode: FragmentMode::FullColor,
            current_view: None,
            pending_clear: None,
        }
    }

    #[must_use]
    pub const fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub const fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Start a frame on `view`. When `clear` is set, the first render pass of
    /// the frame clears the target to that color.
    pub fn begin_frame(&mut self, view: wgpu::TextureView, clear: Option<Rgba>) {
        self.current_view = Some(view);
        self.pending_clear = clear;
    }

    /// Finish the frame. A clear color that no draw consumed is applied in
    /// its own pass, so a frame with zero tiles still clears.
    pub fn end_frame(&mut self) -> Result<(), BackendError> {
        let view = self.current_view.take().ok_or_else(|| {
            BackendError::RenderError("end_frame without begin_frame".to_string())
        })?;
        if let Some(color) = self.pending_clear.take() {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color(color)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.queue.submit(Some(encoder.finish()));
        }
        Ok(())
    }
}

fn clear_color(color: Rgba) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    wgpu::Color {
        r: f64::from(r),
        g: f64::from(g),
        b: f64::from(b),
        a: f64::from(a),
    }
}

impl TerminalBackend for WgpuBackend {
    fn set_atlas(&mut self, data: &AtlasData<'_>, mode: FragmentMode) -> Result<(), BackendError> {
        debug!(
            target: "glyphterm_wgpu",
            "atlas upload: {}x{}x{} pages, {:?}, {} glyphs",
            data.width, data.height, data.pages, data.format, data.glyphs.len()
        );
        self.resources.upload_atlas(&self.device, &self.queue, data)?;
        self.fragment_mode = mode;
        Ok(())
    }

    fn upload_glyph_table(&mut self, table: &[GlyphUv]) -> Result<(), BackendError> {
        self.resources
            .upload_glyph_table(&self.device, &self.queue, bytemuck::cast_slice(table));
        Ok(())
    }

    fn upload_tiles(&mut self, bytes: &[u8], tile_count: usize) -> Result<(), BackendError> {
        debug!(target: "glyphterm_wgpu", "tile upload: {tile_count} records");
        self.resources.upload_tiles(&self.device, &self.queue, bytes);
        Ok(())
    }

    fn draw_batched(
        &mut self,
        uniforms: &DrawUniforms,
        tile_count: usize,
        scissor: Option<ScissorRect>,
    ) -> Result<(), BackendError> {
        let view = self.current_view.as_ref().ok_or_else(|| {
            BackendError::RenderError("draw_batched outside an active frame".to_string())
        })?;

        // write_buffer lands before the pass at the submit below, and each
        // draw submits immediately, so back-to-back draws with different
        // uniforms stay correct.
        self.queue.write_buffer(
            self.resources.uniform_buffer(),
            0,
            bytemuck::bytes_of(uniforms),
        );
        let bind_group = self
            .resources
            .bind_group(&self.device, self.pipelines.bind_group_layout())?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tile Draw Encoder"),
            });
        {
            let load = self.pending_clear.take().map_or(wgpu::LoadOp::Load, |color| {
                wgpu::LoadOp::Clear(clear_color(color))
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tile Draw Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(self.pipelines.for_mode(self.fragment_mode));
            pass.set_bind_group(0, bind_group, &[]);
            if let Some(rect) = scissor {
                pass.set_scissor_rect(rect.x, rect.y, rect.width, rect.height);
            }
            pass.draw(0..(tile_count as u32 * 6), 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}
