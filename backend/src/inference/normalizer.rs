use image::imageops::{self, FilterType};
use ndarray::Array4;

pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;
pub const CHANNELS: usize = 3;
/// Tensor shape the service feeds its classifier.
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, CHANNELS];

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Target size must be non-zero, got {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },
}

/// NHWC batch of one RGB image with channel values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    pub fn new(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// `[1, height, width, 3]`
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn view(&self) -> ndarray::ArrayView4<'_, f32> {
        self.data.view()
    }
}

/// Decodes `raw` and stretches it to `width x height` RGB, scaled to `[0, 1]`.
pub fn normalize(raw: &[u8], width: u32, height: u32) -> Result<ImageTensor, NormalizeError> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::EmptyTarget { width, height });
    }

    let rgb = image::load_from_memory(raw)?.to_rgb8();
    let resized = imageops::resize(&rgb, width, height, FilterType::CatmullRom);

    let data = Array4::from_shape_fn(
        (1, height as usize, width as usize, CHANNELS),
        |(_, y, x, c)| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0,
    );
    Ok(ImageTensor::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
        })
    }

    #[test]
    fn output_has_batch_nhwc_shape_and_unit_range() {
        for (w, h) in [(640, 480), (50, 300), (1, 1), (224, 224)] {
            let png = encode(DynamicImage::ImageRgb8(gradient(w, h)), ImageFormat::Png);
            let tensor = normalize(&png, INPUT_WIDTH, INPUT_HEIGHT).unwrap();

            assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
            assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn non_square_target_keeps_height_before_width() {
        let png = encode(DynamicImage::ImageRgb8(gradient(10, 10)), ImageFormat::Png);
        let tensor = normalize(&png, 32, 16).unwrap();
        assert_eq!(tensor.shape(), &[1, 16, 32, 3]);
    }

    #[test]
    fn solid_colour_scales_by_255() {
        let solid = RgbImage::from_pixel(8, 8, Rgb([255, 0, 51]));
        let png = encode(DynamicImage::ImageRgb8(solid), ImageFormat::Png);
        let tensor = normalize(&png, 4, 4).unwrap();

        let view = tensor.view();
        assert_eq!(view[[0, 2, 3, 0]], 1.0);
        assert_eq!(view[[0, 2, 3, 1]], 0.0);
        assert!((view[[0, 2, 3, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn alpha_and_grayscale_become_three_channels() {
        let rgba = RgbaImage::from_pixel(5, 7, Rgba([10, 20, 30, 0]));
        let gray = GrayImage::from_pixel(5, 7, Luma([200]));

        let from_rgba =
            normalize(&encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png), 6, 6).unwrap();
        let from_gray =
            normalize(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png), 6, 6).unwrap();

        assert_eq!(from_rgba.shape(), &[1, 6, 6, 3]);
        assert!((from_rgba.view()[[0, 0, 0, 2]] - 30.0 / 255.0).abs() < 1e-6);
        let pixel = from_gray.view();
        assert_eq!(pixel[[0, 3, 3, 0]], pixel[[0, 3, 3, 1]]);
        assert_eq!(pixel[[0, 3, 3, 1]], pixel[[0, 3, 3, 2]]);
    }

    #[test]
    fn jpeg_input_is_supported() {
        let jpeg = encode(DynamicImage::ImageRgb8(gradient(300, 200)), ImageFormat::Jpeg);
        let tensor = normalize(&jpeg, INPUT_WIDTH, INPUT_HEIGHT).unwrap();
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn identical_bytes_give_identical_tensors() {
        let png = encode(DynamicImage::ImageRgb8(gradient(123, 77)), ImageFormat::Png);
        let first = normalize(&png, INPUT_WIDTH, INPUT_HEIGHT).unwrap();
        let second = normalize(&png, INPUT_WIDTH, INPUT_HEIGHT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = normalize(b"definitely not an image", INPUT_WIDTH, INPUT_HEIGHT).unwrap_err();
        assert!(matches!(err, NormalizeError::Decode(_)));
        assert!(normalize(&[], INPUT_WIDTH, INPUT_HEIGHT).is_err());
    }

    #[test]
    fn zero_target_is_rejected() {
        let png = encode(DynamicImage::ImageRgb8(gradient(4, 4)), ImageFormat::Png);
        assert!(matches!(
            normalize(&png, 0, 10),
            Err(NormalizeError::EmptyTarget { .. })
        ));
    }
}
