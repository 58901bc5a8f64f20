//! Raster plumbing for icon resolution
//!
//! Everything the resolver needs to turn an on-disk candidate into
//! displayable PNG bytes: decode validation, SVG rasterization, PNG
//! encoding and data-URI formatting.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use resvg::{tiny_skia::Pixmap, usvg};
use std::io::Cursor;
use std::path::Path;

/// Extensions accepted for user-supplied icon overrides.
const IMAGE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".ico", ".icns",
];

/// True when the path ends in a recognized image extension.
pub fn is_image_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Decode image bytes, rejecting anything empty or corrupt.
pub fn decode(bytes: &[u8]) -> Option<DynamicImage> {
    if bytes.is_empty() {
        return None;
    }
    let img = image::load_from_memory(bytes).ok()?;
    if img.width() == 0 || img.height() == 0 {
        return None;
    }
    Some(img)
}

/// Load an image file from disk. SVG is rasterized; every other format
/// goes through the regular decoder. Any failure yields None so strategy
/// chains can fall through.
pub fn load_file(path: &Path) -> Option<DynamicImage> {
    let data = std::fs::read(path).ok()?;
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
    {
        rasterize_svg(&data)
    } else {
        decode(&data)
    }
}

/// Render an SVG document to an RGBA image at its intrinsic size.
pub fn rasterize_svg(data: &[u8]) -> Option<DynamicImage> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default()).ok()?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())?;
    resvg::render(&tree, usvg::Transform::default(), &mut pixmap.as_mut());

    let rgba = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.take())?;
    Some(DynamicImage::ImageRgba8(rgba))
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .ok()?;
    if bytes.is_empty() { None } else { Some(bytes) }
}

/// Format PNG bytes as a `data:` URI the UI layer can display directly.
pub fn to_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png() -> Vec<u8> {
        let img = DynamicImage::new_rgba8(4, 4);
        encode_png(&img).unwrap()
    }

    #[test]
    fn recognizes_image_extensions() {
        assert!(is_image_file("/tmp/icon.PNG"));
        assert!(is_image_file("C:\\icons\\app.ico"));
        assert!(is_image_file("/Applications/Foo.app/icon.icns"));
        assert!(!is_image_file("/usr/bin/foo"));
        assert!(!is_image_file("/tmp/picture.svg"));
    }

    #[test]
    fn decode_rejects_garbage_and_empty() {
        assert!(decode(&[]).is_none());
        assert!(decode(b"definitely not an image").is_none());
        assert!(decode(&sample_png()).is_some());
    }

    #[test]
    fn png_round_trip_is_byte_stable() {
        let png = sample_png();
        let again = encode_png(&decode(&png).unwrap()).unwrap();
        assert_eq!(png, again);
    }

    #[test]
    fn rasterizes_svg() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8">
            <rect width="8" height="8" fill="red"/></svg>"#;
        let img = rasterize_svg(svg).unwrap();
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 8);
    }

    #[test]
    fn data_uri_format() {
        let uri = to_data_uri(&sample_png());
        assert!(uri.starts_with("data:image/png;base64,"));
    }
}
