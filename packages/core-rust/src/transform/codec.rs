//! Decoding and encoding through the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage};

use crate::error::ImageError;
use crate::types::OutputFormat;

/// A decoded image plus the encoding it arrived in.
#[derive(Debug)]
pub struct Decoded {
    pub image: DynamicImage,
    /// `None` when the source was decodable but is not an output format
    /// (e.g. TIFF).
    pub source_format: Option<OutputFormat>,
}

impl Decoded {
    /// Format to re-encode in when the operation does not pick one.
    #[must_use]
    pub fn reencode_format(&self) -> OutputFormat {
        self.source_format.unwrap_or(OutputFormat::Png)
    }
}

/// Decodes `bytes`, sniffing the container format from its magic number.
///
/// # Errors
///
/// Returns `ImageError::Processing` if the bytes are not a recognised or
/// decodable image.
pub fn decode(bytes: &[u8]) -> Result<Decoded, ImageError> {
    let format = image::guess_format(bytes)
        .map_err(|e| ImageError::Processing(format!("Unrecognized image data: {e}")))?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok(Decoded {
        image,
        source_format: OutputFormat::from_image_format(format),
    })
}

/// Encodes `image` as `format`, converting the pixel layout where the target
/// encoder requires it.
///
/// # Errors
///
/// Returns `ImageError::Processing` if the encoder fails.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
            match image.color() {
                ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder)?,
                _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?,
            }
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut out);
            match image.color() {
                ColorType::L8
                | ColorType::La8
                | ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::L16
                | ColorType::La16
                | ColorType::Rgb16
                | ColorType::Rgba16 => image.write_with_encoder(encoder)?,
                _ => DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?,
            }
        }
        OutputFormat::Webp => {
            let encoder = WebPEncoder::new_lossless(&mut out);
            match image.color() {
                ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                    image.write_with_encoder(encoder)?;
                }
                color if color.has_alpha() => {
                    DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
                }
                _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?,
            }
        }
    }
    Ok(out)
}
