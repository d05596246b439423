//! Output format handling service
//!
//! Keeps format conversion and encoding apart from the processing pipeline.

use crate::{
    config::OutputFormat,
    error::{BgRemoverError, Result},
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Service for handling output format conversions
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Convert an RGBA image to what the output format can store
    ///
    /// Formats with an alpha channel keep the image as is. JPEG output is
    /// composited onto opaque white using the alpha channel as blend mask.
    ///
    /// # Examples
    /// ```rust
    /// use bgremover_pro::{services::OutputFormatHandler, config::OutputFormat};
    /// use image::{Rgba, RgbaImage};
    ///
    /// let transparent = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
    /// let flattened = OutputFormatHandler::convert_format(transparent, OutputFormat::Jpeg);
    /// assert_eq!(flattened.to_rgb8().get_pixel(0, 0).0, [255, 255, 255]);
    /// ```
    #[must_use]
    pub fn convert_format(rgba_image: RgbaImage, format: OutputFormat) -> DynamicImage {
        if Self::supports_transparency(format) {
            return DynamicImage::ImageRgba8(rgba_image);
        }

        DynamicImage::ImageRgb8(Self::composite_on_white(&rgba_image))
    }

    /// Blend an RGBA image over an opaque white background
    #[must_use]
    pub fn composite_on_white(rgba_image: &RgbaImage) -> RgbImage {
        let (width, height) = rgba_image.dimensions();
        let mut rgb_image = RgbImage::new(width, height);

        for (x, y, pixel) in rgba_image.enumerate_pixels() {
            let alpha = u32::from(pixel[3]);
            let blend = |channel: u8| -> u8 {
                let value = u32::from(channel) * alpha + 255 * (255 - alpha);
                ((value + 127) / 255) as u8
            };
            rgb_image.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
        }

        rgb_image
    }

    /// File extension (without the dot) written for a format
    ///
    /// # Examples
    /// ```rust
    /// use bgremover_pro::{services::OutputFormatHandler, config::OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpeg");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::WebP => "webp",
        }
    }

    /// Check if a format supports transparency (alpha channel)
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP => true,
            OutputFormat::Jpeg => false,
        }
    }

    /// Whether a cut-out keeps its transparency in `format`; warns when it will not
    pub fn validate_for_background_removal(format: OutputFormat) -> bool {
        let keeps_alpha = Self::supports_transparency(format);
        if !keeps_alpha {
            log::warn!(
                "Output format {} does not support transparency. Removed backgrounds will be white.",
                format
            );
        }
        keeps_alpha
    }

    /// Encode an already converted image
    ///
    /// `quality` only applies to JPEG. WebP is encoded lossless.
    ///
    /// # Errors
    /// - Encoder failures
    /// - WebP requested without the `webp-support` feature
    pub fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());

        match format {
            OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buffer))?,
            OutputFormat::Jpeg => {
                let quality = quality.clamp(1, 100);
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
            },
            OutputFormat::WebP => Self::encode_webp(image, &mut buffer)?,
        }

        Ok(buffer.into_inner())
    }

    #[cfg(feature = "webp-support")]
    fn encode_webp(image: &DynamicImage, buffer: &mut Cursor<Vec<u8>>) -> Result<()> {
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        rgba.write_with_encoder(image::codecs::webp::WebPEncoder::new_lossless(buffer))?;
        Ok(())
    }

    #[cfg(not(feature = "webp-support"))]
    fn encode_webp(_image: &DynamicImage, _buffer: &mut Cursor<Vec<u8>>) -> Result<()> {
        Err(BgRemoverError::unsupported_format(
            "WEBP output requires the webp-support feature",
        ))
    }

    /// Convert and encode an RGBA image in one step
    ///
    /// # Errors
    /// - See [`OutputFormatHandler::encode`]
    pub fn convert_and_encode(
        rgba_image: RgbaImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<Vec<u8>> {
        let converted = Self::convert_format(rgba_image, format);
        Self::encode(&converted, format, quality).map_err(|e| match e {
            BgRemoverError::Image(err) => BgRemoverError::processing_stage_error(
                "encode",
                &err.to_string(),
                Some(format.display_name()),
            ),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_convert_format_keeps_alpha() {
        let rgba_image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 10]));
        let converted = OutputFormatHandler::convert_format(rgba_image.clone(), OutputFormat::Png);
        assert_eq!(converted, DynamicImage::ImageRgba8(rgba_image.clone()));

        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::WebP);
        assert!(matches!(converted, DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_jpeg_composites_onto_white() {
        let mut rgba_image = RgbaImage::new(3, 1);
        rgba_image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba_image.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        rgba_image.put_pixel(2, 0, Rgba([0, 0, 0, 128]));

        let converted = OutputFormatHandler::convert_format(rgba_image, OutputFormat::Jpeg);
        let DynamicImage::ImageRgb8(rgb) = converted else {
            panic!("Expected RGB8 image for JPEG format");
        };

        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
        // Half transparent black blends to mid grey
        assert_eq!(rgb.get_pixel(2, 0).0, [127, 127, 127]);
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Jpeg), "jpeg");
        assert_eq!(OutputFormatHandler::get_extension(OutputFormat::WebP), "webp");
    }

    #[test]
    fn test_supports_transparency() {
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::Png));
        assert!(OutputFormatHandler::supports_transparency(OutputFormat::WebP));
        assert!(!OutputFormatHandler::supports_transparency(OutputFormat::Jpeg));
    }

    #[test]
    fn test_validate_for_background_removal() {
        assert!(OutputFormatHandler::validate_for_background_removal(OutputFormat::Png));
        assert!(!OutputFormatHandler::validate_for_background_removal(OutputFormat::Jpeg));
    }

    #[test]
    fn test_encode_png_and_jpeg() {
        let rgba_image = RgbaImage::from_pixel(4, 4, Rgba([0, 128, 255, 0]));

        let png = OutputFormatHandler::convert_and_encode(rgba_image.clone(), OutputFormat::Png, 90)
            .unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);

        let jpeg = OutputFormatHandler::convert_and_encode(rgba_image, OutputFormat::Jpeg, 90)
            .unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert!(!decoded.color().has_alpha());
        let pixel = decoded.to_rgb8().get_pixel(2, 2).0;
        assert!(pixel.iter().all(|&c| c >= 250), "expected white, got {:?}", pixel);
    }

    #[cfg(feature = "webp-support")]
    #[test]
    fn test_encode_webp_lossless() {
        let rgba_image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 40]));
        let webp = OutputFormatHandler::convert_and_encode(rgba_image.clone(), OutputFormat::WebP, 90)
            .unwrap();
        let decoded = image::load_from_memory(&webp).unwrap().to_rgba8();
        assert_eq!(decoded, rgba_image);
    }
}
