// texture.rs - panorama image decoding and GPU upload

use image::io::Reader as ImageReader;
use image::{GenericImageView, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("cannot open image {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("image {0:?} has no pixels")]
    Empty(PathBuf),
}

/// Decodes an image file, guessing the format from its contents.
pub fn load_image(path: &Path) -> Result<RgbaImage, TextureError> {
    let file = File::open(path).map_err(|source| TextureError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let img = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(TextureError::Empty(path.to_path_buf()));
    }
    log::info!("loaded {} ({w}x{h})", path.display());
    Ok(img.to_rgba8())
}

/// Scales the image under `max_dimension` and pads it to 2:1 with black rows
/// on top when it is too short to cover the full sphere.
pub fn fit_equirectangular(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();

    let img = if src_w > max_dimension || src_h > max_dimension {
        let scale = max_dimension as f32 / src_w.max(src_h) as f32;
        let new_w = ((src_w as f32 * scale) as u32).max(1);
        let new_h = ((src_h as f32 * scale) as u32).max(1);
        log::warn!(
            "image {src_w}x{src_h} exceeds the GPU limit {max_dimension}, scaling to {new_w}x{new_h}"
        );
        image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let (w, h) = img.dimensions();
    let target_h = w / 2;
    if target_h > 0 && h < target_h {
        let mut canvas = RgbaImage::from_pixel(w, target_h, Rgba([0, 0, 0, 255]));
        image::imageops::replace(&mut canvas, &img, 0, (target_h - h) as i64);
        canvas
    } else {
        img
    }
}

pub struct PanoramaTexture {
    // owns the allocation `view` reads from; only dropped with the viewer
    #[allow(dead_code)]
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl PanoramaTexture {
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, img: RgbaImage) -> Self {
        let img = fit_equirectangular(img, device.limits().max_texture_dimension_2d);
        let (width, height) = img.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some("panorama_texture"),
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // longitude wraps, latitude does not
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("panorama_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_images_are_padded_on_top() {
        let img = RgbaImage::from_pixel(8, 2, Rgba([200, 100, 50, 255]));
        let out = fit_equirectangular(img, 4096);
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(7, 1), Rgba([0, 0, 0, 255]));
        assert_eq!(*out.get_pixel(3, 2), Rgba([200, 100, 50, 255]));
        assert_eq!(*out.get_pixel(3, 3), Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn two_to_one_images_pass_through() {
        let img = RgbaImage::from_pixel(16, 8, Rgba([1, 2, 3, 255]));
        let out = fit_equirectangular(img.clone(), 4096);
        assert_eq!(out, img);
    }

    #[test]
    fn oversized_images_are_scaled_down() {
        let img = RgbaImage::from_pixel(64, 32, Rgba([9, 9, 9, 255]));
        let out = fit_equirectangular(img, 16);
        assert_eq!(out.dimensions(), (16, 8));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = load_image(Path::new("definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, TextureError::Open { .. }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let path = std::env::temp_dir().join("quat_panorama_garbage.jpg");
        std::fs::write(&path, b"not an image at all").unwrap();
        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn png_round_trip_through_disk() {
        let path = std::env::temp_dir().join("quat_panorama_small.png");
        RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(*img.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }
}
