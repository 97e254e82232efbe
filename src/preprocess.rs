use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use crate::error::PredictError;

/// Decode raw upload bytes into an 8-bit RGB image. The format is sniffed
/// from the bytes, not taken from the declared content type.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PredictError> {
    let img = image::load_from_memory(bytes).map_err(|_| PredictError::UndecodableImage)?;
    Ok(img.to_rgb8())
}

/// Input transform published with the pretrained weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocess {
    pub resize_size: u32,
    pub crop_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for Preprocess {
    // ResNet50 ImageNet1K v2
    fn default() -> Self {
        Self {
            resize_size: 232,
            crop_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

impl Preprocess {
    /// Shape of the tensor `apply` produces.
    pub fn input_shape(&self) -> [usize; 4] {
        let side = self.crop_size as usize;
        [1, 3, side, side]
    }

    /// Resize-shorter-side then center-crop, done in the other order: the
    /// source window that lands in the crop is cut out first and only that
    /// window is resized. Work stays bounded by the crop size whatever the
    /// aspect ratio of the upload.
    pub fn apply(&self, image: &RgbImage) -> Array4<f32> {
        let crop = self.crop_size;
        let (left, top, width, height) = self.source_window(image.dimensions());
        let window = imageops::crop_imm(image, left, top, width, height).to_image();
        let cropped = if window.dimensions() == (crop, crop) {
            window
        } else {
            imageops::resize(&window, crop, crop, FilterType::Triangle)
        };

        let side = crop as usize;
        Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            let pixel = cropped.get_pixel(x as u32, y as u32);
            (pixel[c] as f32 / 255.0 - self.mean[c]) / self.std[c]
        })
    }

    /// Centered region of the source, in source pixels, that the crop covers
    /// once the shorter side is scaled to `resize_size`.
    fn source_window(&self, (w, h): (u32, u32)) -> (u32, u32, u32, u32) {
        let target = self.resize_size.max(self.crop_size) as f64;
        let short = w.min(h).max(1) as f64;
        let span = self.crop_size as f64 * short / target;

        let axis = |len: u32| -> (u32, u32) {
            let extent = span.round().clamp(1.0, len.max(1) as f64) as u32;
            let offset = ((len as f64 - extent as f64) / 2.0).round().max(0.0) as u32;
            (offset, extent.min(len - offset))
        };
        let (left, width) = axis(w);
        let (top, height) = axis(h);
        (left, top, width, height)
    }
}
