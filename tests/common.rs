use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::Path;

/// Gradient image with enough structure to survive compression without
/// collapsing to a handful of bytes.
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x ^ y) % 256) as u8,
        ]);
    }
    DynamicImage::ImageRgb8(img)
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient_image(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient_image(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

/// A valid PNG comfortably under the 1024-byte skip threshold.
pub fn write_tiny_png(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([120, 40, 200])));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
    assert!(fs::metadata(path).unwrap().len() < 1024);
}
