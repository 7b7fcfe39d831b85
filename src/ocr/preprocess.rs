//! Image normalization for the vision backend.
//!
//! Decodes arbitrary uploads to RGB, resizes so the longer edge is exactly
//! 1024 px (aspect preserved, Lanczos resampling), and re-encodes as PNG
//! for the model CLI.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};

use super::backend::OcrError;

/// Target length of the longer image edge before inference.
pub const TARGET_LONGEST_EDGE: u32 = 1024;

/// Decode, normalize, and re-encode an image for model input.
pub fn prepare_image(content: &[u8]) -> Result<Vec<u8>, OcrError> {
    let img = image::load_from_memory(content)
        .map_err(|e| OcrError::ImageError(format!("Failed to decode image: {}", e)))?;
    let resized = resize_longest_edge(img.to_rgb8(), TARGET_LONGEST_EDGE);
    encode_png(&resized)
}

/// Resize so the longer edge equals `target`, preserving aspect ratio.
pub fn resize_longest_edge(img: RgbImage, target: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let scale = |edge: u32, other: u32| ((edge as u64 * target as u64 / other as u64) as u32).max(1);
    let (new_width, new_height) = if width >= height {
        (target, scale(height, width))
    } else {
        (scale(width, height), target)
    };
    image::imageops::resize(&img, new_width, new_height, FilterType::Lanczos3)
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| OcrError::ImageError(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_landscape() {
        let img = RgbImage::new(2048, 1024);
        let resized = resize_longest_edge(img, 1024);
        assert_eq!(resized.dimensions(), (1024, 512));
    }

    #[test]
    fn test_resize_portrait() {
        let img = RgbImage::new(500, 2000);
        let resized = resize_longest_edge(img, 1024);
        assert_eq!(resized.dimensions(), (256, 1024));
    }

    #[test]
    fn test_resize_square_and_upscale() {
        let img = RgbImage::new(100, 100);
        let resized = resize_longest_edge(img, 1024);
        assert_eq!(resized.dimensions(), (1024, 1024));
    }

    #[test]
    fn test_prepare_image_rejects_garbage() {
        assert!(matches!(
            prepare_image(b"not an image"),
            Err(OcrError::ImageError(_))
        ));
    }

    #[test]
    fn test_prepare_image_round_trip() {
        let img = RgbImage::from_pixel(64, 32, image::Rgb([200, 10, 10]));
        let png = encode_png(&img).unwrap();
        let prepared = prepare_image(&png).unwrap();
        let reloaded = image::load_from_memory(&prepared).unwrap();
        assert_eq!(reloaded.width(), 1024);
        assert_eq!(reloaded.height(), 512);
    }
}
