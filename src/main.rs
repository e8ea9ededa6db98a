// main.rs - window, frame loop and top-level failure reporting

mod config;
mod frame_clock;
mod hud;
mod input;
mod orientation;
mod panorama;
mod quaternion;
mod renderer;
mod shader;
mod texture;

use anyhow::{anyhow, Context};
use config::ViewerConfig;
use frame_clock::FrameClock;
use hud::HudInfo;
use input::InputState;
use orientation::ScreenSize;
use panorama::PanoramaViewer;
use renderer::Renderer;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_pause();

    if let Err(err) = run() {
        report_failure(&err);
    }
}

fn wait_for_enter() {
    eprintln!("Press Enter to exit.");
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}

/// Prints the whole error chain and holds the console open.
fn report_failure(err: &anyhow::Error) {
    log::error!("{err:#}");
    eprintln!("{err:?}");
    wait_for_enter();
}

fn install_panic_pause() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_hook(info);
        wait_for_enter();
    }));
}

/// Returns `path` if it exists, otherwise lets the user pick a panorama.
fn resolve_image(path: &Path) -> anyhow::Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    log::warn!("{} not found, asking for a panorama", path.display());
    rfd::FileDialog::new()
        .set_title("Open equirectangular panorama")
        .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
        .pick_file()
        .with_context(|| format!("{} not found and no image was chosen", path.display()))
}

fn run() -> anyhow::Result<()> {
    let config = ViewerConfig::from_env().context("reading configuration")?;
    let image_path = resolve_image(&config.image)?;
    let image = texture::load_image(&image_path)?;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(&config.title)
        .with_inner_size(PhysicalSize::new(config.width, config.height))
        .with_resizable(false)
        .build(&event_loop)
        .context("creating window")?;

    let mut renderer = Some(
        pollster::block_on(Renderer::new(&window, config.sample_count(), image))
            .context("initializing renderer")?,
    );

    let mut input = InputState::new();
    let mut viewer = PanoramaViewer::new(config.rotation_step, config.show_hud);
    let mut clock = FrameClock::new(config.frame_rate, Instant::now());
    let mut next_frame = Instant::now();
    let mut exiting = false;
    let mut failure: Option<anyhow::Error> = None;
    let image_label = image_path.display().to_string();

    log::info!("viewer ready ({}x{})", config.width, config.height);

    event_loop.run(move |event, _, control_flow| {
        if let Event::LoopDestroyed = event {
            // GPU resources go before the window they draw into
            drop(renderer.take());
            if let Some(err) = failure.take() {
                report_failure(&err);
            }
            return;
        }
        let Some(renderer) = renderer.as_mut() else {
            return;
        };

        match event {
            Event::WindowEvent { event, window_id } if window_id == window.id() => {
                let consumed = viewer.show_hud && renderer.hud_event(&event);
                if consumed && !input::must_reach_input(&event) {
                    return;
                }
                if let WindowEvent::Resized(size) = event {
                    renderer.resize(size);
                }
                input.handle_window_event(&event);
            }

            Event::MainEventsCleared if !exiting => {
                if Instant::now() < next_frame {
                    control_flow.set_wait_until(next_frame);
                    return;
                }
                let frame = input.take_frame();
                let size = renderer.size();
                match viewer.update(&frame, ScreenSize::new(size.width, size.height)) {
                    Ok(true) => window.request_redraw(),
                    Ok(false) => {
                        exiting = true;
                        control_flow.set_exit();
                    }
                    Err(e) => {
                        failure = Some(anyhow::Error::new(e).context("updating orientation"));
                        exiting = true;
                        control_flow.set_exit();
                    }
                }
            }

            Event::RedrawRequested(_) if !exiting => {
                renderer.set_rotation(viewer.rotation());

                let info = HudInfo {
                    rotation: viewer.rotation(),
                    fps: clock.fps(),
                    image: image_label.clone(),
                    texture_size: renderer.panorama_size(),
                    sample_count: renderer.sample_count(),
                };
                let draw = |ctx: &egui::Context| hud::draw_hud(ctx, &info);
                let run_ui: Option<&dyn Fn(&egui::Context)> =
                    if viewer.show_hud { Some(&draw) } else { None };

                match renderer.render(&window, run_ui) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size()),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        failure = Some(anyhow!("GPU out of memory while presenting"));
                        exiting = true;
                        control_flow.set_exit();
                        return;
                    }
                    Err(e) => log::warn!("frame skipped: {e}"),
                }

                next_frame = clock.tick(Instant::now());
                control_flow.set_wait_until(next_frame);
            }

            _ => {}
        }
    })
}
