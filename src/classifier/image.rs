use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use ndarray::Array4;

use super::error::ClassifierError;

/// File extensions accepted from the upload widget.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg", "webp", "tiff"];

/// ImageNet channel statistics, matching the normalisation the model was
/// trained with.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Checks an uploaded file name against the supported extension set.
/// Camera captures bypass this check; they arrive without a name.
pub fn is_supported_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Decodes raw image bytes into an EXIF-orientation-corrected RGB image.
///
/// The format is sniffed from the bytes rather than trusted from the file
/// name. Formats outside the supported set are rejected with
/// `UnsupportedFormat`; undecodable bytes are an `ImageError`. Both are
/// user-input errors the session layer degrades gracefully on.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, ClassifierError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ClassifierError::ImageError(format!("Failed to sniff image format: {}", e)))?;

    let format = reader.format().ok_or_else(|| {
        ClassifierError::UnsupportedFormat("Could not determine image format".to_string())
    })?;
    if !matches!(
        format,
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff
    ) {
        return Err(ClassifierError::UnsupportedFormat(format!(
            "{:?} images are not supported",
            format
        )));
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| ClassifierError::ImageError(format!("Failed to decode image: {}", e)))?;
    // Orientation metadata is best effort; a missing or broken EXIF block
    // falls back to the pixels as stored.
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| ClassifierError::ImageError(format!("Failed to decode image: {}", e)))?;
    img.apply_orientation(orientation);

    Ok(img.to_rgb8())
}

/// Converts an RGB image into a normalised NCHW float tensor of shape
/// `[1, 3, input_size, input_size]`.
pub(crate) fn to_input_tensor(img: &RgbImage, input_size: u32) -> Array4<f32> {
    let resized = image::imageops::resize(img, input_size, input_size, FilterType::Triangle);

    let mut tensor = Array4::<f32>::zeros((1, 3, input_size as usize, input_size as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (value - MEAN[c]) / STD[c];
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("photo.jpg"));
        assert!(is_supported_extension("photo.JPEG"));
        assert!(is_supported_extension("scan.tiff"));
        assert!(is_supported_extension("pic.webp"));
        assert!(!is_supported_extension("clip.gif"));
        assert!(!is_supported_extension("document.pdf"));
        assert!(!is_supported_extension("no_extension"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(
            result,
            Err(ClassifierError::UnsupportedFormat(_)) | Err(ClassifierError::ImageError(_))
        ));
    }

    #[test]
    fn test_decode_png_round_trip() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([200, 10, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgb([200, 10, 30]));
    }

    #[test]
    fn test_input_tensor_shape_and_normalisation() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let tensor = to_input_tensor(&img, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        // White pixels normalise to (1.0 - mean) / std per channel.
        let expected = (1.0 - MEAN[0]) / STD[0];
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-5);
    }
}
