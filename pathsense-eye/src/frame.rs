//! Camera frames and pixel-space boxes

use crate::error::{PerceptionError, Result};
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel space: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Convert normalized corner coordinates to a pixel box clamped to the
    /// frame. Returns `None` when nothing of the box remains inside it.
    pub fn from_normalized_corners(
        xmin: f32,
        ymin: f32,
        xmax: f32,
        ymax: f32,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let fw = frame_width as f32;
        let fh = frame_height as f32;

        let x0 = (xmin * fw).clamp(0.0, fw);
        let y0 = (ymin * fh).clamp(0.0, fh);
        let x1 = (xmax * fw).clamp(0.0, fw);
        let y1 = (ymax * fh).clamp(0.0, fh);

        let width = x1 - x0;
        let height = y1 - y0;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        Some(Self::new(x0, y0, width, height))
    }
}

/// A single RGBA camera frame. Caller-owned and never retained by the core.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    /// Build a frame from a tightly packed RGBA buffer
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PerceptionError::InvalidFrame(format!(
                "frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|p| p.checked_mul(4))
            .ok_or_else(|| PerceptionError::InvalidFrame("frame size overflows".to_string()))?;

        if pixels.len() != expected {
            return Err(PerceptionError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }

        let image = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| PerceptionError::InvalidFrame("pixel buffer rejected".to_string()))?;
        Ok(Self { image })
    }

    /// Wrap an already decoded image
    pub fn from_image(image: RgbaImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PerceptionError::InvalidFrame(
                "frame dimensions must be non-zero".to_string(),
            ));
        }
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn area(&self) -> f32 {
        self.width() as f32 * self.height() as f32
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copy out the region covered by `bbox`, rounded outward to whole pixels
    /// and clamped to the frame.
    pub fn crop(&self, bbox: &PixelBox) -> Option<RgbaImage> {
        let (fw, fh) = (self.width(), self.height());

        let x0 = bbox.x.floor().max(0.0) as u32;
        let y0 = bbox.y.floor().max(0.0) as u32;
        let x1 = ((bbox.x + bbox.width).ceil().max(0.0) as u32).min(fw);
        let y1 = ((bbox.y + bbox.height).ceil().max(0.0) as u32).min(fh);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        Some(imageops::crop_imm(&self.image, x0, y0, x1 - x0, y1 - y0).to_image())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_frame_from_rgba() {
        let frame = Frame::from_rgba(4, 2, vec![0u8; 4 * 2 * 4]).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.area(), 8.0);
    }

    #[test]
    fn test_frame_rejects_bad_buffer() {
        assert!(matches!(
            Frame::from_rgba(4, 2, vec![0u8; 10]),
            Err(PerceptionError::InvalidFrame(_))
        ));
        assert!(matches!(
            Frame::from_rgba(0, 2, vec![]),
            Err(PerceptionError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_normalized_corners_to_pixels() {
        let bbox = PixelBox::from_normalized_corners(0.25, 0.5, 0.75, 1.0, 640, 480).unwrap();
        assert_eq!(bbox, PixelBox::new(160.0, 240.0, 320.0, 240.0));
        assert_eq!(bbox.center_x(), 320.0);
    }

    #[test]
    fn test_normalized_corners_clamped() {
        let bbox = PixelBox::from_normalized_corners(-0.5, -0.5, 1.5, 0.5, 100, 100).unwrap();
        assert_eq!(bbox, PixelBox::new(0.0, 0.0, 100.0, 50.0));

        // Entirely outside the frame
        assert!(PixelBox::from_normalized_corners(1.2, 0.0, 1.4, 0.5, 100, 100).is_none());
        // Inverted corners
        assert!(PixelBox::from_normalized_corners(0.6, 0.0, 0.4, 0.5, 100, 100).is_none());
    }

    #[test]
    fn test_crop_copies_region() {
        let mut image = RgbaImage::new(10, 10);
        image.put_pixel(3, 4, Rgba([255, 0, 0, 255]));
        let frame = Frame::from_image(image).unwrap();

        let region = frame.crop(&PixelBox::new(2.5, 3.2, 4.0, 4.0)).unwrap();
        // Rounded outward: x 2..7, y 3..8
        assert_eq!(region.dimensions(), (5, 5));
        assert_eq!(region.get_pixel(1, 1), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_outside_frame() {
        let frame = Frame::from_image(RgbaImage::new(10, 10)).unwrap();
        assert!(frame.crop(&PixelBox::new(12.0, 0.0, 4.0, 4.0)).is_none());
        let clipped = frame.crop(&PixelBox::new(8.0, 8.0, 10.0, 10.0)).unwrap();
        assert_eq!(clipped.dimensions(), (2, 2));
    }
}
