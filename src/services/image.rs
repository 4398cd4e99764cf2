use image::ImageReader;
use std::io::Cursor;

// Proof photos must stay legible, so the bound is generous.
const MAX_WIDTH: u32 = 1280;
const MAX_HEIGHT: u32 = 1280;
const JPEG_QUALITY: u8 = 80;

pub struct ProcessedImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub extension: String,
}

/// Decode, downscale if oversized, and re-encode as JPEG. Every image the
/// service uploads goes through here, whatever format the client sent.
pub fn process_image(data: &[u8]) -> Result<ProcessedImage, String> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image format: {}", e))?
        .decode()
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    let (width, height) = (img.width(), img.height());

    let processed = if width > MAX_WIDTH || height > MAX_HEIGHT {
        // Calculate new dimensions maintaining aspect ratio
        let ratio = (MAX_WIDTH as f64 / width as f64).min(MAX_HEIGHT as f64 / height as f64);
        let new_width = (width as f64 * ratio) as u32;
        let new_height = (height as f64 * ratio) as u32;

        tracing::info!(
            "Resizing image from {}x{} to {}x{}",
            width,
            height,
            new_width,
            new_height
        );

        img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    let mut buffer = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
    encoder
        .encode_image(&processed)
        .map_err(|e| format!("Failed to encode JPEG: {}", e))?;

    Ok(ProcessedImage {
        data: buffer,
        content_type: "image/jpeg".to_string(),
        extension: "jpg".to_string(),
    })
}
