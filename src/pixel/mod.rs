//! Floating-point pixel grids
//!
//! [`PixelImage`] is the in-memory representation every comparison works on:
//! a `height × width × channels` grid of `f32` samples normalized to `0..=1`.
//! Loading and saving go through the `image` crate's PNG codec, and the number
//! of channels is preserved in both directions (a grayscale reference stays
//! grayscale, no alpha channel is ever added).

use crate::error::{Error, Result, Shape};
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use std::path::Path;
use tracing::debug;

/// A `height × width × channels` grid of normalized samples.
///
/// Samples are stored row-major with channels interleaved, which is the
/// layout raster codecs use.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    shape: Shape,
    samples: Vec<f32>,
}

impl PixelImage {
    /// Build an image from raw interleaved samples.
    ///
    /// Fails when the sample count does not match the shape.
    pub fn from_samples(shape: Shape, samples: Vec<f32>) -> Result<Self> {
        if samples.len() != shape.num_samples() {
            return Err(Error::Config(format!(
                "{} samples do not fit shape {}",
                samples.len(),
                shape
            )));
        }
        Ok(Self { shape, samples })
    }

    /// An all-zero image of the given shape.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            samples: vec![0.0; shape.num_samples()],
        }
    }

    /// Read and decode a raster file.
    ///
    /// A missing file yields [`Error::ImageNotFound`] so callers can tell it
    /// apart from a corrupt one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ImageNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(Error::Decode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        debug!(path = %path.display(), bytes = bytes.len(), "decoding image");
        Self::decode(&bytes).map_err(|e| match e {
            Error::Decode { message, .. } => Error::Decode {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Decode an in-memory raster file.
    ///
    /// 8-bit sources are divided by 255 and 16-bit sources by 65535; float
    /// sources are taken as-is.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let dynamic = image::load_from_memory(bytes).map_err(|e| Error::Decode {
            path: Default::default(),
            message: e.to_string(),
        })?;

        let width = dynamic.width() as usize;
        let height = dynamic.height() as usize;

        let (channels, samples) = match dynamic {
            DynamicImage::ImageLuma8(buf) => (1, normalize_u8(buf.into_raw())),
            DynamicImage::ImageLumaA8(buf) => (2, normalize_u8(buf.into_raw())),
            DynamicImage::ImageRgb8(buf) => (3, normalize_u8(buf.into_raw())),
            DynamicImage::ImageRgba8(buf) => (4, normalize_u8(buf.into_raw())),
            DynamicImage::ImageLuma16(buf) => (1, normalize_u16(buf.into_raw())),
            DynamicImage::ImageLumaA16(buf) => (2, normalize_u16(buf.into_raw())),
            DynamicImage::ImageRgb16(buf) => (3, normalize_u16(buf.into_raw())),
            DynamicImage::ImageRgba16(buf) => (4, normalize_u16(buf.into_raw())),
            DynamicImage::ImageRgb32F(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba32F(buf) => (4, buf.into_raw()),
            other => (4, other.to_rgba32f().into_raw()),
        };

        Self::from_samples(Shape::new(height, width, channels), samples)
    }

    /// Encode as an 8-bit PNG with the same number of channels.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let color = match self.shape.channels {
            1 => ExtendedColorType::L8,
            2 => ExtendedColorType::La8,
            3 => ExtendedColorType::Rgb8,
            4 => ExtendedColorType::Rgba8,
            n => {
                return Err(Error::Encode {
                    path: Default::default(),
                    message: format!("cannot encode {} channels as PNG", n),
                });
            }
        };

        let bytes: Vec<u8> = self.samples.iter().map(|&v| denormalize(v)).collect();

        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&bytes, self.width() as u32, self.height() as u32, color)
            .map_err(|e| Error::Encode {
                path: Default::default(),
                message: e.to_string(),
            })?;
        Ok(out)
    }

    /// Encode and write to a PNG file, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let png = self.encode_png().map_err(|e| match e {
            Error::Encode { message, .. } => Error::Encode {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        debug!(path = %path.display(), shape = %self.shape, "writing image");
        std::fs::write(path, png)?;
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.shape.width
    }

    pub fn height(&self) -> usize {
        self.shape.height
    }

    pub fn num_channels(&self) -> usize {
        self.shape.channels
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Interleaved samples in row-major order
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

fn normalize_u8(raw: Vec<u8>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 255.0).collect()
}

fn normalize_u16(raw: Vec<u16>) -> Vec<f32> {
    raw.into_iter().map(|v| v as f32 / 65535.0).collect()
}

fn denormalize(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
