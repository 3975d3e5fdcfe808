//! Image decoding for texture assets.

use image::{ImageFormat, load_from_memory, load_from_memory_with_format};

use crate::{
    data_structures::texture::TextureData,
    error::{RenderError, Result},
};

/// Decode an encoded image (PNG, JPEG, ...) into RGBA8 pixels.
///
/// `format` is an optional file extension hint; without it the format is
/// guessed from the bytes.
pub fn decode(bytes: &[u8], format: Option<&str>) -> Result<TextureData> {
    let img = match format.and_then(ImageFormat::from_extension) {
        Some(fmt) => load_from_memory_with_format(bytes, fmt),
        None => load_from_memory(bytes),
    }
    .map_err(|e| RenderError::Resource(format!("could not decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(TextureData {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, Rgba};

    use super::*;

    #[test]
    fn decodes_png_to_rgba() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(2, 3, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let data = decode(&bytes, Some("png")).unwrap();
        assert_eq!((data.width, data.height), (2, 3));
        assert_eq!(&data.pixels[4..8], &[1, 0, 7, 255]);
    }

    #[test]
    fn garbage_is_a_resource_error() {
        assert!(matches!(
            decode(b"not an image", None),
            Err(RenderError::Resource(_))
        ));
    }
}
