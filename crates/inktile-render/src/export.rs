//! PNG serialization of a composited raster.

use thiserror::Error;
use tiny_skia::Pixmap;

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("viewport has no drawable area")]
    EmptySurface,
    #[error("surface allocation failed")]
    Allocation,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Encode a pixmap as PNG bytes (RGBA, 8-bit).
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    // tiny-skia stores premultiplied alpha; PNG wants straight RGBA.
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    #[test]
    fn test_encode_png_produces_valid_signature() {
        let mut pixmap = Pixmap::new(16, 16).unwrap();
        pixmap.fill(Color::from_rgba8(200, 100, 50, 255));

        let bytes = encode_png(&pixmap).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn test_encode_png_transparent_surface() {
        let pixmap = Pixmap::new(8, 8).unwrap();
        let bytes = encode_png(&pixmap).unwrap();
        assert!(!bytes.is_empty());
    }
}
