//! Encodes a rendered `FrameBuffer` to disk. BMP or PNG is chosen by the
//! output path's extension, defaulting to PNG when absent or unknown.

use crate::error::RenderError;
use crate::framebuffer::FrameBuffer;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::path::Path;

pub fn write_image(fb: &FrameBuffer, path: &Path, gamma: f64) -> Result<(), RenderError> {
    let rgb8 = fb.to_rgb8(gamma);
    let image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(fb.width, fb.height, rgb8)
        .ok_or_else(|| RenderError::Encode("frame buffer size mismatch".into()))?;

    let format = match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "bmp" => ImageFormat::Bmp,
        _ => ImageFormat::Png,
    };

    image.save_with_format(path, format).map_err(|e| RenderError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer_size() {
        let fb = FrameBuffer::new(4, 4);
        let raw = vec![0u8; 3]; // deliberately too short
        assert!(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(fb.width, fb.height, raw).is_none());
    }
}
