//! GPU textures: the depth buffer, 1x1 placeholders for assets still loading,
//! 8-bit sRGB images (matcaps, video frames) and half float HDR images.

use image::{ImageBuffer, Pixel, imageops};

/// A GPU texture with a view and optional sampler.
///
/// Colour textures carry a sampler and are bound through a
/// [`crate::data_structures::material::Material`]. The depth buffer has none.
/// Sizes are never checked here: callers scale images with [`fit_to_limit`]
/// first, since `create_texture` rejects anything beyond
/// `Limits::max_texture_dimension_2d`.
///
/// # Fields
///
/// - `texture` is the underlying GPU resource
/// - `view` covers the whole texture and is what bind groups reference
/// - `sampler` is `None` for render attachments
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Format used for HDR environment maps. Filterable on every backend including WebGL2.
    pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create a 1x1 texture of a single sRGB colour.
    ///
    /// Materials start out with one of these so their meshes can be drawn
    /// before the real image has arrived.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_rgba(device, queue, &image, Some(label))
    }

    /// Upload an 8-bit sRGB image, sampled with clamped edges.
    ///
    /// # Arguments
    ///
    /// * `rgba` - pixels in sRGB, at most `max_texture_dimension_2d` per side
    /// * `label` - debug label for the GPU resource
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &image::RgbaImage,
        label: Option<&str>,
    ) -> Self {
        let texture = create_2d(
            device,
            label,
            rgba.dimensions(),
            wgpu::TextureFormat::Rgba8UnormSrgb,
        );
        let texture = Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            sampler: Some(create_clamped_sampler(device)),
        };
        texture.write_rgba(queue, rgba);
        texture
    }

    /// Overwrite the texel data in place. `rgba` must match the texture size.
    pub fn write_rgba(&self, queue: &wgpu::Queue, rgba: &image::RgbaImage) {
        write_2d(queue, &self.texture, rgba, 4, rgba.dimensions());
    }

    /// Upload a linear HDR image as half floats.
    ///
    /// The sampler wraps horizontally so equirectangular lookups are seamless.
    pub fn from_hdr(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::Rgb32FImage,
        label: &str,
    ) -> Self {
        let texture = create_2d(device, Some(label), img.dimensions(), Self::HDR_FORMAT);
        let halves = hdr_to_rgba16(img);
        write_2d(queue, &texture, bytemuck::cast_slice(&halves), 8, img.dimensions());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("environment sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            sampler: Some(sampler),
        }
    }

    /// A 1x1 black HDR texture used until the environment map arrives.
    pub fn hdr_placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let img = image::Rgb32FImage::from_pixel(1, 1, image::Rgb([0.0, 0.0, 0.0]));
        Self::from_hdr(device, queue, &img, "environment placeholder")
    }
}

/// Size of an image scaled down to fit a `max` x `max` texture, keeping its
/// aspect ratio. `None` when it already fits.
///
/// Devices refuse textures beyond `Limits::max_texture_dimension_2d`, which is
/// only 2048 on WebGL2.
pub fn fit_within((width, height): (u32, u32), max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }
    let max = max.max(1);
    let scale = max as f64 / width.max(height) as f64;
    let fit = |v: u32| ((v as f64 * scale).round() as u32).clamp(1, max);
    Some((fit(width), fit(height)))
}

/// Downscale `img` when it exceeds the texture size limit `max`.
///
/// # Arguments
///
/// * `img` - decoded image, returned unchanged when it fits
/// * `max` - the device's `max_texture_dimension_2d`
/// * `label` - asset name for the warning logged when scaling
pub fn fit_to_limit<P>(
    img: ImageBuffer<P, Vec<P::Subpixel>>,
    max: u32,
    label: &str,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    match fit_within(img.dimensions(), max) {
        Some((width, height)) => {
            log::warn!(
                "{} is {}x{}, beyond the device limit of {}, scaling to {}x{}",
                label,
                img.width(),
                img.height(),
                max,
                width,
                height
            );
            imageops::resize(&img, width, height, imageops::FilterType::Triangle)
        }
        None => img,
    }
}

/// [`fit_to_limit`] for linear HDR images.
///
/// Resampling clamps float channels to `[0, 1]`, so the image is normalized by
/// its brightest channel before scaling and restored afterwards.
pub fn fit_hdr_to_limit(mut img: image::Rgb32FImage, max: u32, label: &str) -> image::Rgb32FImage {
    if fit_within(img.dimensions(), max).is_none() {
        return img;
    }
    let peak = img
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f32, f32::max);
    if peak <= 0.0 {
        return fit_to_limit(img, max, label);
    }
    img.iter_mut().for_each(|v| *v = (*v / peak).clamp(0.0, 1.0));
    let mut fitted = fit_to_limit(img, max, label);
    fitted.iter_mut().for_each(|v| *v *= peak);
    fitted
}

fn create_2d(
    device: &wgpu::Device,
    label: Option<&str>,
    (width, height): (u32, u32),
    format: wgpu::TextureFormat,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn write_2d(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    bytes: &[u8],
    bytes_per_texel: u32,
    (width, height): (u32, u32),
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_texel * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Pack float RGB into RGBA half floats with an opaque alpha channel.
pub(crate) fn hdr_to_rgba16(img: &image::Rgb32FImage) -> Vec<half::f16> {
    img.pixels()
        .flat_map(|p| {
            [
                half::f16::from_f32(p[0]),
                half::f16::from_f32(p[1]),
                half::f16::from_f32(p[2]),
                half::f16::ONE,
            ]
        })
        .collect()
}

pub fn create_clamped_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_within_the_limit_are_left_alone() {
        assert_eq!(fit_within((2048, 1024), 2048), None);
        assert_eq!(fit_within((1, 1), 2048), None);
    }

    #[test]
    fn oversized_images_shrink_to_the_limit_keeping_aspect() {
        assert_eq!(fit_within((4096, 2048), 2048), Some((2048, 1024)));
        assert_eq!(fit_within((1000, 5000), 2048), Some((410, 2048)));
        assert_eq!(fit_within((100_000, 1), 2048), Some((2048, 1)));
    }

    #[test]
    fn oversized_hdr_is_resized_keeping_its_range() {
        let img = image::Rgb32FImage::from_pixel(4096, 64, image::Rgb([0.5, 1.0, 4.0]));
        let fitted = fit_hdr_to_limit(img, 2048, "sky");
        assert_eq!(fitted.dimensions(), (2048, 32));
        let p = fitted.get_pixel(100, 10);
        assert!((p[0] - 0.5).abs() < 1e-3);
        assert!((p[2] - 4.0).abs() < 1e-3);

        let small = image::RgbaImage::new(8, 8);
        assert_eq!(fit_to_limit(small, 2048, "matcap").dimensions(), (8, 8));
    }

    #[test]
    fn hdr_pixels_expand_to_four_halves() {
        let img = image::Rgb32FImage::from_raw(2, 1, vec![1.0, 2.0, 0.5, 8.0, 0.0, 0.25]).unwrap();
        let halves = hdr_to_rgba16(&img);
        let floats: Vec<f32> = halves.iter().map(|h| h.to_f32()).collect();
        assert_eq!(floats, vec![1.0, 2.0, 0.5, 1.0, 8.0, 0.0, 0.25, 1.0]);
    }
}
