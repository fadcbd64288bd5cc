//! GPU textures and procedural texture construction.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and [`GradientTexture`], the CPU-side radial gradient used for glow sprites.

use anyhow::*;
use image::GenericImageView;

/// A GPU texture with a view and optional sampler.
///
/// Wraps WGPU texture objects along with associated views and samplers.
/// Textures are used for color maps, glow gradients, depth, and other data
/// bound to shaders. Typically created via [`from_image`](Self::from_image) or
/// via [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// The returned texture is suitable for use as a `RENDER_ATTACHMENT`
    /// in render passes.
    ///
    /// # Arguments
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
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Create a single-colour texture.
    ///
    /// Used as a stand-in diffuse map for materials that carry only a base
    /// colour factor and no image, so the mesh pipeline never has to branch
    /// on "textured or not".
    pub fn create_solid(
        rgba: [u8; 4],
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
    ) -> Texture {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
    ) -> Result<Self> {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();
        Self::from_rgba8(device, queue, &rgba, dimensions, label)
    }

    /// Upload a radial gradient as a non-sRGB texture.
    ///
    /// Glow alpha must stay linear so the ramp samples exactly as rasterized.
    pub fn from_gradient(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        gradient: &GradientTexture,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: gradient.size(),
            height: gradient.size(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            gradient.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * gradient.size()),
                rows_per_image: Some(gradient.size()),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &image::RgbaImage,
        dimensions: (u32, u32),
        label: Option<&str>,
    ) -> Result<Self> {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// Release the GPU memory backing this texture.
    ///
    /// Views and samplers referencing it become invalid; dropping them later
    /// is still safe.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// A square radial gradient rasterized into an immutable pixel buffer.
///
/// The buffer fades from full-opacity white at the center to fully
/// transparent at the edge and is sized once at construction. Glow sprites
/// upload it via [`Texture::from_gradient`] and scale the unit quad to the
/// configured world size.
#[derive(Clone, Debug)]
pub struct GradientTexture {
    size: u32,
    pixels: image::RgbaImage,
}

impl GradientTexture {
    /// Default side length for glow gradients.
    pub const DEFAULT_SIZE: u32 = 512;

    /// Rasterize a radial gradient of side length `size`.
    ///
    /// Each pixel's normalized radius is its distance from the buffer center
    /// divided by the half-width, so the ramp reaches zero exactly at the
    /// inscribed circle.
    pub fn new(size: u32) -> Self {
        let size = size.max(1);
        let half = size as f32 / 2.0;
        let pixels = image::RgbaImage::from_fn(size, size, |x, y| {
            // Sample at the pixel center
            let dx = x as f32 + 0.5 - half;
            let dy = y as f32 + 0.5 - half;
            let radius = (dx * dx + dy * dy).sqrt() / half;
            let (color, alpha) = Self::ramp(radius);
            image::Rgba([
                (color[0] * 255.0).round() as u8,
                (color[1] * 255.0).round() as u8,
                (color[2] * 255.0).round() as u8,
                (alpha * 255.0).round() as u8,
            ])
        });
        Self { size, pixels }
    }

    /// The gradient ramp: normalized radius in [0, 1] to (color, alpha).
    ///
    /// Color is fixed at full-intensity white; alpha falls off linearly from
    /// 1.0 at the center to 0.0 at the edge. Radii past 1.0 stay transparent.
    pub fn ramp(radius: f32) -> ([f32; 3], f32) {
        let alpha = (1.0 - radius).clamp(0.0, 1.0);
        ([1.0, 1.0, 1.0], alpha)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }
}

impl Default for GradientTexture {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_is_opaque_at_center_and_transparent_at_edge() {
        let (color, alpha) = GradientTexture::ramp(0.0);
        assert_eq!(color, [1.0, 1.0, 1.0]);
        assert!((alpha - 1.0).abs() < f32::EPSILON);

        let (_, alpha) = GradientTexture::ramp(1.0);
        assert!(alpha.abs() < f32::EPSILON);
    }

    #[test]
    fn ramp_is_monotonically_non_increasing() {
        let mut previous = f32::INFINITY;
        for step in 0..=100 {
            let radius = step as f32 / 100.0;
            let (_, alpha) = GradientTexture::ramp(radius);
            assert!(
                alpha <= previous,
                "alpha increased from {previous} to {alpha} at radius {radius}"
            );
            previous = alpha;
        }
    }

    #[test]
    fn ramp_clamps_past_the_edge() {
        let (_, alpha) = GradientTexture::ramp(1.5);
        assert_eq!(alpha, 0.0);
    }

    #[test]
    fn rasterized_center_is_opaque_white() {
        let gradient = GradientTexture::new(64);
        // 2x2 block around the exact center
        for (x, y) in [(31, 31), (32, 31), (31, 32), (32, 32)] {
            let pixel = gradient.pixels().get_pixel(x, y);
            assert_eq!(pixel.0[0], 255);
            assert_eq!(pixel.0[1], 255);
            assert_eq!(pixel.0[2], 255);
            assert!(pixel.0[3] >= 253, "center alpha was {}", pixel.0[3]);
        }
    }

    #[test]
    fn rasterized_corners_are_transparent() {
        let gradient = GradientTexture::new(64);
        for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63)] {
            assert_eq!(gradient.pixels().get_pixel(x, y).0[3], 0);
        }
    }

    #[test]
    fn degenerate_size_is_clamped() {
        let gradient = GradientTexture::new(0);
        assert_eq!(gradient.size(), 1);
        assert_eq!(gradient.pixels().dimensions(), (1, 1));
    }
}
