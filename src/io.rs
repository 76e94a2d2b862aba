//! Image source and sink.
//!
//! Decoding goes through the `image` crate and lands in one of the two
//! supported depths. Encoding always produces PNG and is atomic: the image is
//! written to a temporary file next to the target and renamed into place, so
//! a failed encode never leaves a partial file behind.

use crate::core::error::{RasterError, RasterResult};
use crate::core::types::{DynamicBuffer, PixelBuffer};
use image::{ColorType, DynamicImage, ImageError, ImageFormat};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Decode the image at `path` into an 8-bit or 16-bit RGBA buffer.
///
/// Gray, gray-alpha and RGB images are widened to RGBA of the same depth.
/// Floating-point images are rejected with [`RasterError::UnsupportedFormat`].
pub fn read_image(path: impl AsRef<Path>) -> RasterResult<DynamicBuffer> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| decode_error(path, e))?;
    let (width, height) = (image.width(), image.height());
    let color = image.color();

    let buffer = match color {
        ColorType::Rgba8 | ColorType::Rgb8 | ColorType::L8 | ColorType::La8 => {
            if color != ColorType::Rgba8 {
                log::debug!("Converting {:?} to Rgba8: {}", color, path.display());
            }
            PixelBuffer::from_raw(width, height, image.into_rgba8().into_raw()).map(DynamicBuffer::Rgba8)
        }
        ColorType::Rgba16 | ColorType::Rgb16 | ColorType::L16 | ColorType::La16 => {
            if color != ColorType::Rgba16 {
                log::debug!("Converting {:?} to Rgba16: {}", color, path.display());
            }
            PixelBuffer::from_raw(width, height, image.into_rgba16().into_raw()).map(DynamicBuffer::Rgba16)
        }
        other => {
            return Err(RasterError::UnsupportedFormat {
                path: path.to_path_buf(),
                color_type: format!("{:?}", other),
            })
        }
    };

    buffer.ok_or(RasterError::EmptyImage { width, height })
}

/// Encode `buffer` as PNG at `path`, returning the written path.
///
/// Missing parent directories are created.
pub fn write_image(path: impl AsRef<Path>, buffer: &DynamicBuffer) -> RasterResult<PathBuf> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| RasterError::Io {
        path: path.to_path_buf(),
        source,
    };

    let image = to_dynamic_image(buffer).ok_or(RasterError::EmptyImage {
        width: buffer.width(),
        height: buffer.height(),
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_error)?;

    let temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    let mut writer = BufWriter::new(temp);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|source| RasterError::Encode {
            path: path.to_path_buf(),
            source,
        })?;

    let temp = writer.into_inner().map_err(|e| io_error(e.into_error()))?;
    temp.persist(path).map_err(|e| io_error(e.error))?;

    log::debug!("Wrote {}x{} {} image to {}", buffer.width(), buffer.height(), buffer.depth(), path.display());
    Ok(path.to_path_buf())
}

/// Default output path for `input` filtered with `filter`: `<stem>_<filter>.png`
/// next to the input.
pub fn default_output_path(input: impl AsRef<Path>, filter: &str) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_{}.png", stem, filter))
}

fn to_dynamic_image(buffer: &DynamicBuffer) -> Option<DynamicImage> {
    match buffer {
        DynamicBuffer::Rgba8(b) => {
            image::RgbaImage::from_raw(b.width(), b.height(), b.as_raw().to_vec()).map(DynamicImage::ImageRgba8)
        }
        DynamicBuffer::Rgba16(b) => image::ImageBuffer::from_raw(b.width(), b.height(), b.as_raw().to_vec())
            .map(DynamicImage::ImageRgba16),
    }
}

fn decode_error(path: &Path, error: ImageError) -> RasterError {
    match error {
        ImageError::IoError(source) => RasterError::Io {
            path: path.to_path_buf(),
            source,
        },
        ImageError::Unsupported(e) => RasterError::UnsupportedFormat {
            path: path.to_path_buf(),
            color_type: e.to_string(),
        },
        other => RasterError::Decode {
            path: path.to_path_buf(),
            source: other,
        },
    }
}
