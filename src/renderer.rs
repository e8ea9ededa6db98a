// renderer.rs - surface, full-screen panorama pass and the HUD overlay

use crate::quaternion::Quaternion;
use crate::shader::ShaderProgram;
use crate::texture::{PanoramaTexture, TextureError};
use image::RgbaImage;
use winit::window::Window;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("surface reports no {0}")]
    UnsupportedSurface(&'static str),
    #[error("cannot open graphics device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("shader error: {0}")]
    Shader(String),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,

    program: ShaderProgram,
    panorama: PanoramaTexture,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    if sample_count <= 1 {
        return None;
    }
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("msaa_framebuffer"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

impl Renderer {
    pub async fn new(
        window: &Window,
        requested_samples: u32,
        image: RgbaImage,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // SAFETY: the window outlives the renderer; both are owned by the event loop closure.
        let surface = unsafe { instance.create_surface(window) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface("texture formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(RenderError::UnsupportedSurface("alpha modes"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let sample_count = if requested_samples <= 1 {
            1
        } else if adapter
            .get_texture_format_features(surface_format)
            .flags
            .sample_count_supported(requested_samples)
        {
            requested_samples
        } else {
            log::warn!("{requested_samples}x multisampling is not supported, rendering without it");
            1
        };
        let msaa_view = create_msaa_view(&device, &config, sample_count);

        let mut program = ShaderProgram::new(&device, config.format, sample_count)?;
        let panorama = PanoramaTexture::upload(&device, &queue, image);
        log::info!("panorama texture {}x{}", panorama.size.0, panorama.size.1);
        program.bind_texture(&device, &panorama, 1);

        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window);
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            msaa_view,
            program,
            panorama,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn panorama_size(&self) -> (u32, u32) {
        self.panorama.size
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.msaa_view = create_msaa_view(&self.device, &self.config, self.sample_count);
        }
    }

    /// Passes the window event to the HUD; true when the HUD consumed it.
    pub fn hud_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_event(&self.egui_ctx, event).consumed
    }

    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.program.uniforms.pass_vec4("rotation", rotation.to_gpu());
    }

    /// Draws the panorama, then the HUD when `run_ui` is given, and presents.
    pub fn render(
        &mut self,
        window: &Window,
        run_ui: Option<&dyn Fn(&egui::Context)>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.program.flush(&self.queue);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let (target, resolve_target) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Panorama Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.program.draw(&mut render_pass);
        }

        if let Some(run_ui) = run_ui {
            let raw_input = self.egui_state.take_egui_input(window);
            let full_output = self.egui_ctx.run(raw_input, |ctx| run_ui(ctx));
            self.egui_state
                .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
            let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

            let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: window.scale_factor() as f32,
            };

            for (id, delta) in &full_output.textures_delta.set {
                self.egui_renderer
                    .update_texture(&self.device, &self.queue, *id, delta);
            }
            self.egui_renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &clipped_primitives,
                &screen_descriptor,
            );

            {
                let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("HUD Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: true,
                        },
                    })],
                    depth_stencil_attachment: None,
                });
                self.egui_renderer
                    .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
            }

            for id in &full_output.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
