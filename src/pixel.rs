//! Decoded pixel buffers handed to the detectors.

use image::{DynamicImage, GrayImage};
use kornia::{
    image::{Image, ImageSize, allocator::CpuAllocator},
    imgproc,
};

use crate::error::KolamError;

type CpuImage<T, const C: usize> = Image<T, C, CpuAllocator>;

/// Immutable width x height intensity field, optionally carrying the RGB
/// samples it was converted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelField {
    width: usize,
    height: usize,
    gray: Vec<u8>,
    rgb: Option<Vec<u8>>,
}

impl PixelField {
    /// Wrap a row-major 8-bit grayscale buffer.
    pub fn from_gray(width: usize, height: usize, gray: Vec<u8>) -> Result<Self, KolamError> {
        let expected = checked_len(width, height, 1)?;
        if gray.len() != expected {
            return Err(KolamError::InvalidInput(format!(
                "gray buffer has {} samples, expected {expected} for {width}x{height}",
                gray.len()
            )));
        }
        Ok(Self {
            width,
            height,
            gray,
            rgb: None,
        })
    }

    /// Wrap an interleaved RGB8 buffer; the intensity channel is derived with kornia.
    pub fn from_rgb(width: usize, height: usize, rgb: Vec<u8>) -> Result<Self, KolamError> {
        let expected = checked_len(width, height, 3)?;
        if rgb.len() != expected {
            return Err(KolamError::InvalidInput(format!(
                "rgb buffer has {} samples, expected {expected} for {width}x{height}",
                rgb.len()
            )));
        }
        if width == 0 || height == 0 {
            return Ok(Self {
                width,
                height,
                gray: Vec::new(),
                rgb: Some(rgb),
            });
        }

        let image = CpuImage::<u8, 3>::new(ImageSize { width, height }, rgb.clone(), CpuAllocator)?;
        let mut gray = CpuImage::<u8, 1>::from_size_val(image.size(), 0u8, CpuAllocator)?;
        imgproc::color::gray_from_rgb_u8(&image, &mut gray)?;

        Ok(Self {
            width,
            height,
            gray: gray.as_slice().to_vec(),
            rgb: Some(rgb),
        })
    }

    /// Build a field from an image decoded by the `image` crate.
    pub fn from_image(source: &DynamicImage) -> Result<Self, KolamError> {
        match source {
            DynamicImage::ImageLuma8(gray) => {
                let (w, h) = gray.dimensions();
                Self::from_gray(w as usize, h as usize, gray.as_raw().clone())
            }
            other => {
                let rgb = other.to_rgb8();
                let (w, h) = rgb.dimensions();
                Self::from_rgb(w as usize, h as usize, rgb.into_raw())
            }
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) and build a field from it.
    pub fn decode(bytes: &[u8]) -> Result<Self, KolamError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| KolamError::InvalidInput(format!("invalid image format: {e}")))?;
        Self::from_image(&img)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn gray(&self) -> &[u8] {
        &self.gray
    }

    pub fn rgb(&self) -> Option<&[u8]> {
        self.rgb.as_deref()
    }

    #[inline]
    pub fn intensity(&self, x: usize, y: usize) -> u8 {
        self.gray[y * self.width + x]
    }

    /// Gaussian-smoothed copy of the intensity channel. Even kernel sizes are
    /// widened to the next odd size; a non-positive sigma is derived from the
    /// kernel size.
    pub fn smoothed(&self, kernel_size: usize, sigma: f32) -> Result<GrayImage, KolamError> {
        if self.is_empty() {
            return Ok(self.to_gray_image());
        }
        let k = kernel_size.max(1) | 1;
        let size = ImageSize {
            width: self.width,
            height: self.height,
        };
        let src = CpuImage::<u8, 1>::new(size, self.gray.clone(), CpuAllocator)?;
        let mut dst = CpuImage::<u8, 1>::from_size_val(size, 0u8, CpuAllocator)?;
        imgproc::filter::gaussian_blur_u8(&src, &mut dst, (k, k), (sigma, sigma))?;

        GrayImage::from_raw(self.width as u32, self.height as u32, dst.as_slice().to_vec())
            .ok_or_else(|| KolamError::InvalidInput(format!("{}x{} smoothing buffer", self.width, self.height)))
    }

    /// Copy the intensity channel into an `image` buffer for `imageproc`.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_raw(self.width as u32, self.height as u32, self.gray.clone())
            .unwrap_or_else(|| GrayImage::new(self.width as u32, self.height as u32))
    }
}

fn checked_len(width: usize, height: usize, channels: usize) -> Result<usize, KolamError> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| KolamError::InvalidInput(format!("{width}x{height} overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_length_mismatch_is_invalid_input() {
        let err = PixelField::from_gray(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(err, KolamError::InvalidInput(_)));
    }

    #[test]
    fn rgb_white_stays_bright() {
        let field = PixelField::from_rgb(2, 2, vec![255; 12]).unwrap();
        assert_eq!(field.gray().len(), 4);
        assert!(field.gray().iter().all(|&v| v >= 250));
        assert!(field.rgb().is_some());
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = PixelField::decode(b"not an image").unwrap_err();
        assert!(matches!(err, KolamError::InvalidInput(_)));
    }

    #[test]
    fn gray_image_roundtrips_dimensions() {
        let field = PixelField::from_gray(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let img = field.to_gray_image();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1)[0], 6);
        assert_eq!(field.intensity(1, 1), 5);
    }

    #[test]
    fn smoothing_keeps_flat_fields_flat() {
        let field = PixelField::from_gray(16, 12, vec![77; 16 * 12]).unwrap();
        let out = field.smoothed(9, 2.0).unwrap();
        assert_eq!(out.dimensions(), (16, 12));
        assert!(out.pixels().all(|p| p[0].abs_diff(77) <= 1));
    }

    #[test]
    fn smoothing_softens_a_step_edge() {
        let gray: Vec<u8> = (0..20 * 8).map(|i| if i % 20 < 10 { 0 } else { 255 }).collect();
        let field = PixelField::from_gray(20, 8, gray).unwrap();
        for k in [5, 8] {
            let out = field.smoothed(k, 1.0).unwrap();
            let v = out.get_pixel(10, 4)[0];
            assert!(v > 0 && v < 255, "kernel {k}: {v}");
        }
    }

    #[test]
    fn smoothing_an_empty_field_is_empty() {
        let field = PixelField::from_gray(0, 0, Vec::new()).unwrap();
        assert_eq!(field.smoothed(9, 2.0).unwrap().dimensions(), (0, 0));
    }
}
