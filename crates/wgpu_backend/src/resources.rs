//! GPU resource management: atlas texture, tile/glyph storage buffers, and
//! the bind group tying them together.

use glyphterm::{AtlasData, BackendError, ColorFormat, DrawUniforms};

/// wgpu requires buffer writes to be 4-byte sized and aligned; packed tile
/// records are 18 bytes each, so odd record counts need 2 bytes of padding.
pub const COPY_ALIGNMENT: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

/// Round a byte length up to the copy alignment.
pub const fn aligned_len(len: usize) -> usize {
    len.div_ceil(COPY_ALIGNMENT) * COPY_ALIGNMENT
}

/// Map an atlas color format and bytes-per-channel to a texture format.
///
/// Wide-channel BGRA has no wgpu equivalent and is reported as a resource
/// error rather than silently reordered.
pub fn texture_format(
    format: ColorFormat,
    channel_size: u32,
) -> Result<wgpu::TextureFormat, BackendError> {
    use wgpu::TextureFormat as Tf;
    match (format, channel_size) {
        (ColorFormat::G, 1) => Ok(Tf::R8Unorm),
        (ColorFormat::G, 2) => Ok(Tf::R16Unorm),
        (ColorFormat::G, 4) => Ok(Tf::R32Float),
        (ColorFormat::Ga, 1) => Ok(Tf::Rg8Unorm),
        (ColorFormat::Ga, 2) => Ok(Tf::Rg16Unorm),
        (ColorFormat::Ga, 4) => Ok(Tf::Rg32Float),
        (ColorFormat::Rgba, 1) => Ok(Tf::Rgba8Unorm),
        (ColorFormat::Rgba, 2) => Ok(Tf::Rgba16Unorm),
        (ColorFormat::Rgba, 4) => Ok(Tf::Rgba32Float),
        (ColorFormat::Bgra, 1) => Ok(Tf::Bgra8Unorm),
        (ColorFormat::Bgra, _) => Err(BackendError::ResourceError(
            "BGRA atlases support only 1 byte per channel".to_string(),
        )),
        (_, other) => Err(BackendError::ResourceError(format!(
            "unsupported atlas channel size: {other} bytes"
        ))),
    }
}

/// GPU-side state for one terminal's atlas and tile stream.
pub struct Resources {
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    tile_buffer: Option<wgpu::Buffer>,
    tile_capacity: usize,
    glyph_buffer: Option<wgpu::Buffer>,
    atlas_view: Option<wgpu::TextureView>,
    // Rebuilt lazily whenever a bound resource is replaced.
    bind_group: Option<wgpu::BindGroup>,
}

impl Resources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tile Draw Uniforms"),
            size: std::mem::size_of::<DrawUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Glyph atlases are pixel art; sample with nearest neighbor.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            uniform_buffer,
            sampler,
            tile_buffer: None,
            tile_capacity: 0,
            glyph_buffer: None,
            atlas_view: None,
            bind_group: None,
        }
    }

    pub const fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    /// Replace the atlas texture array from validated atlas data.
    pub fn upload_atlas(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &AtlasData<'_>,
    ) -> Result<(), BackendError> {
        let format = texture_format(data.format, data.channel_size)?;
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: data.pages,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Glyph Atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let bytes_per_row = data.width * data.format.channels() * data.channel_size;
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(data.height),
            },
            size,
        );
        self.atlas_view = Some(texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Glyph Atlas View"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        }));
        self.bind_group = None;
        Ok(())
    }

    /// Replace the glyph UV table buffer.
    pub fn upload_glyph_table(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Glyph UV Table"),
            size: aligned_len(bytes.len()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&buffer, 0, bytes);
        self.glyph_buffer = Some(buffer);
        self.bind_group = None;
    }

    /// Write packed tile records, growing the storage buffer geometrically
    /// when the batch outgrows it.
    pub fn upload_tiles(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) {
        let needed = aligned_len(bytes.len());
        let buffer = match &mut self.tile_buffer {
            Some(buffer) if self.tile_capacity >= needed => buffer,
            slot => {
                let capacity = needed.max(self.tile_capacity * 2).max(COPY_ALIGNMENT);
                self.tile_capacity = capacity;
                self.bind_group = None;
                slot.insert(device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Tile Records"),
                    size: capacity as wgpu::BufferAddress,
                    usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }))
            }
        };
        if bytes.len() == needed {
            queue.write_buffer(buffer, 0, bytes);
        } else {
            let mut padded = Vec::with_capacity(needed);
            padded.extend_from_slice(bytes);
            padded.resize(needed, 0);
            queue.write_buffer(buffer, 0, &padded);
        }
    }

    /// The bind group over the current resources, rebuilding it if any of
    /// them changed since the last draw.
    pub fn bind_group(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
    ) -> Result<&wgpu::BindGroup, BackendError> {
        let bind_group = match self.bind_group.take() {
            Some(bind_group) => bind_group,
            None => {
                let tile_buffer = self.tile_buffer.as_ref().ok_or_else(|| {
                    BackendError::RenderError("no tile records uploaded".to_string())
                })?;
                let glyph_buffer = self.glyph_buffer.as_ref().ok_or_else(|| {
                    BackendError::RenderError("no glyph table uploaded".to_string())
                })?;
                let atlas_view = self.atlas_view.as_ref().ok_or_else(|| {
                    BackendError::RenderError("no atlas texture uploaded".to_string())
                })?;
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Tile Bind Group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: self.uniform_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: tile_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: glyph_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 3,
                            resource: wgpu::BindingResource::TextureView(atlas_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 4,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                })
            }
        };
        Ok(&*self.bind_group.insert(bind_group))
    }
}
