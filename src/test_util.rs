//! Fixtures shared by the unit tests.

use std::io::Cursor;

use image::RgbaImage;

/// Encode a blank `w`x`h` RGBA image as PNG bytes.
pub(crate) fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgba8(RgbaImage::new(w, h));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
