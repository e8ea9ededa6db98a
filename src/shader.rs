// shader.rs - shader program: pipeline, named uniforms and the panorama texture binding

use crate::renderer::RenderError;
use crate::texture::PanoramaTexture;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use wgpu::util::DeviceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl UniformKind {
    pub fn size(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
        }
    }
}

/// A field of the WGSL uniform struct at a fixed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformField {
    pub name: &'static str,
    pub offset: usize,
    pub kind: UniformKind,
}

/// Must match `struct Uniforms` in `shader_orientation.wgsl`.
pub const ORIENTATION_UNIFORMS: &[UniformField] = &[UniformField {
    name: "rotation",
    offset: 0,
    kind: UniformKind::Vec4,
}];

/// Texture name, texture binding, sampler binding.
const TEXTURE_SLOTS: &[(&str, u32, u32)] = &[("tex2D_1", 1, 2)];

/// CPU copy of a uniform buffer with a lazily filled name lookup.
///
/// Unknown names resolve to `None`; the miss is logged once and later writes
/// to that name are dropped.
#[derive(Debug)]
pub struct UniformBlock {
    layout: &'static [UniformField],
    data: Vec<u8>,
    locations: HashMap<String, Option<UniformField>>,
    mismatched: HashSet<String>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: &'static [UniformField]) -> Self {
        let size = layout
            .iter()
            .map(|f| f.offset + f.kind.size())
            .max()
            .unwrap_or(0);
        // uniform buffers are sized in 16-byte rows
        let size = size.div_ceil(16).max(1) * 16;
        Self {
            layout,
            data: vec![0; size],
            locations: HashMap::new(),
            mismatched: HashSet::new(),
            dirty: true,
        }
    }

    pub fn location(&mut self, name: &str) -> Option<UniformField> {
        if let Some(loc) = self.locations.get(name) {
            return *loc;
        }
        let loc = self.layout.iter().find(|f| f.name == name).copied();
        if loc.is_none() {
            log::warn!("Cannot get the location of uniform \"{name}\"");
        }
        self.locations.insert(name.to_string(), loc);
        loc
    }

    /// Number of names looked up so far, hits and misses.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn cached_locations(&self) -> usize {
        self.locations.len()
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) {
        let Some(field) = self.location(name) else {
            return;
        };
        if field.kind != kind {
            if self.mismatched.insert(name.to_string()) {
                log::warn!(
                    "uniform \"{name}\" is {:?}, ignoring {:?} write",
                    field.kind,
                    kind
                );
            }
            return;
        }
        let dst = &mut self.data[field.offset..field.offset + bytes.len()];
        if dst != bytes {
            dst.copy_from_slice(bytes);
            self.dirty = true;
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pass_int(&mut self, name: &str, i: i32) {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&i));
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pass_bool(&mut self, name: &str, b: bool) {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&(b as i32)));
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pass_float(&mut self, name: &str, f: f32) {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&f));
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pass_vec2(&mut self, name: &str, v: [f32; 2]) {
        self.write(name, UniformKind::Vec2, bytemuck::cast_slice(&v));
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn pass_vec3(&mut self, name: &str, v: [f32; 3]) {
        self.write(name, UniformKind::Vec3, bytemuck::cast_slice(&v));
    }

    pub fn pass_vec4(&mut self, name: &str, v: [f32; 4]) {
        self.write(name, UniformKind::Vec4, bytemuck::cast_slice(&v));
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the staged bytes if they changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        Some(&self.data)
    }
}

pub fn texture_bindings(slot: u32) -> Option<(u32, u32)> {
    let name = format!("tex2D_{slot}");
    TEXTURE_SLOTS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, tex, sampler)| (*tex, *sampler))
}

pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    uniform_buffer: wgpu::Buffer,
    pub uniforms: UniformBlock,
}

impl ShaderProgram {
    /// Compiles the orientation shader and builds its pipeline. Validation
    /// errors are returned instead of being left to the device's error
    /// handler.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self, RenderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("orientation_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "shader_orientation.wgsl"
            ))),
        });

        let uniforms = UniformBlock::new(ORIENTATION_UNIFORMS);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Orientation Uniforms"),
            contents: uniforms.bytes(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("orientation_bind_group_layout"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Orientation Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Orientation Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Shader(err.to_string()));
        }

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
            uniform_buffer,
            uniforms,
        })
    }

    /// Binds `texture` to the sampler named `tex2D_<slot>`.
    pub fn bind_texture(&mut self, device: &wgpu::Device, texture: &PanoramaTexture, slot: u32) {
        let Some((tex_binding, sampler_binding)) = texture_bindings(slot) else {
            log::warn!("Cannot get the location of texture \"tex2D_{slot}\"");
            return;
        };
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: tex_binding,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: sampler_binding,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("orientation_bind_group"),
        }));
    }

    /// Uploads uniform writes made since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if let Some(bytes) = self.uniforms.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, bytes);
        }
    }

    /// Draws the screen-filling quad. Does nothing until a texture is bound.
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..4, 0..1);
    }
}
