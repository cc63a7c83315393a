//! Raster editor backed by the `image` crate.
//!
//! The format is sniffed from the file contents, not the extension, and the
//! resized image is written back in that same format. EXIF orientation is
//! applied to the pixels on open, so dimensions are the displayed ones and the
//! re-encoded file (which carries no EXIF) still shows upright.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use tracing::{debug, warn};

use super::{EditorProvider, ImageEditor};
use crate::error::{Result, ShrinkError};

/// JPEG quality used when re-encoding.
pub const DEFAULT_JPEG_QUALITY: u8 = 82;

/// Resampling filter for every resize.
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// Opens image files with the `image` crate.
#[derive(Debug, Clone)]
pub struct RasterEditorProvider {
    jpeg_quality: u8,
}

impl Default for RasterEditorProvider {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl RasterEditorProvider {
    /// Provider re-encoding JPEGs at quality 82.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different JPEG quality (clamped to 1..=100).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

impl EditorProvider for RasterEditorProvider {
    fn open(&self, path: &Path) -> Result<Option<Box<dyn ImageEditor>>> {
        let reader = ImageReader::open(path)
            .map_err(|e| ShrinkError::io(path, e))?
            .with_guessed_format()
            .map_err(|e| ShrinkError::io(path, e))?;

        let Some(format) = reader.format() else {
            debug!(path = %path.display(), "Not a recognized image format");
            return Ok(None);
        };
        if !format.writing_enabled() {
            debug!(path = %path.display(), ?format, "No encoder for image format");
            return Ok(None);
        }

        // The file opened fine, so a failure here (including an unexpected
        // EOF from a truncated file) means the contents are unusable.
        let image = match decode_upright(reader) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image could not be decoded");
                return Ok(None);
            }
        };

        Ok(Some(Box::new(RasterEditor {
            image,
            format,
            jpeg_quality: self.jpeg_quality,
        })))
    }
}

/// Decode and rotate/flip the pixels as the EXIF orientation says.
fn decode_upright(reader: ImageReader<BufReader<File>>) -> image::ImageResult<DynamicImage> {
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// A decoded image held in memory.
struct RasterEditor {
    image: DynamicImage,
    format: ImageFormat,
    jpeg_quality: u8,
}

impl ImageEditor for RasterEditor {
    fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    fn resize(&mut self, width: u32, height: u32, crop: bool) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(ShrinkError::InvalidConfig(format!(
                "cannot resize to {width}x{height}"
            )));
        }
        self.image = if crop {
            self.image.resize_to_fill(width, height, RESAMPLE_FILTER)
        } else {
            self.image.resize_exact(width, height, RESAMPLE_FILTER)
        };
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ShrinkError::io(path, e))?;
        let mut writer = BufWriter::new(file);

        let encoded = if self.format == ImageFormat::Jpeg {
            // The JPEG encoder has no alpha support.
            let rgb;
            let image = if self.image.color().has_alpha() {
                rgb = DynamicImage::ImageRgb8(self.image.to_rgb8());
                &rgb
            } else {
                &self.image
            };
            image.write_with_encoder(JpegEncoder::new_with_quality(
                &mut writer,
                self.jpeg_quality,
            ))
        } else {
            self.image.write_to(&mut writer, self.format)
        };

        match encoded {
            Ok(()) => {}
            Err(ImageError::IoError(e)) => return Err(ShrinkError::io(path, e)),
            Err(e) => return Err(ShrinkError::image(path, e)),
        }

        std::io::Write::flush(&mut writer).map_err(|e| ShrinkError::io(path, e))
    }
}
