// Data structures for video frames fed into the pipeline

use crate::models::hand::{DetectionError, DetectionResult};

/// A single raster frame from a camera, a video file or an image on disk
#[derive(Debug, Clone)]
pub struct Frame {
    pub timestamp: i64, // Capture time in milliseconds, informational only
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: PixelFormat,
}

/// Pixel layout of frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    RGB8,
    BGR8,
    RGBA8,
    BGRA8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGB8 | PixelFormat::BGR8 => 3,
            PixelFormat::RGBA8 | PixelFormat::BGRA8 => 4,
        }
    }

    /// Byte offsets of the red, green and blue channels within one pixel
    fn rgb_offsets(&self) -> (usize, usize, usize) {
        match self {
            PixelFormat::RGB8 | PixelFormat::RGBA8 => (0, 1, 2),
            PixelFormat::BGR8 | PixelFormat::BGRA8 => (2, 1, 0),
        }
    }
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, format: PixelFormat) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp_millis(),
            width,
            height,
            data,
            format,
        }
    }

    /// Build an RGB frame from a decoded image
    pub fn from_image(image: image::DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(width, height, rgb.into_raw(), PixelFormat::RGB8)
    }

    /// Number of bytes the data buffer must hold for the declared size and format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Check that the buffer matches the declared dimensions
    pub fn validate(&self) -> DetectionResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DetectionError::MalformedFrame(format!(
                "frame has zero size ({}x{})",
                self.width, self.height
            )));
        }

        if self.data.len() != self.expected_len() {
            return Err(DetectionError::MalformedFrame(format!(
                "expected {} bytes for {}x{} {:?}, got {}",
                self.expected_len(),
                self.width,
                self.height,
                self.format,
                self.data.len()
            )));
        }

        Ok(())
    }

    /// Convert to packed RGB8, the layout hand detection models consume
    ///
    /// The conversion only reorders channels and drops alpha, so pixel values are preserved.
    pub fn to_rgb8(&self) -> DetectionResult<Frame> {
        self.validate()?;

        if self.format == PixelFormat::RGB8 {
            return Ok(self.clone());
        }

        let bpp = self.format.bytes_per_pixel();
        let (r, g, b) = self.format.rgb_offsets();
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for pixel in self.data.chunks_exact(bpp) {
            data.push(pixel[r]);
            data.push(pixel[g]);
            data.push(pixel[b]);
        }

        Ok(Frame {
            timestamp: self.timestamp,
            width: self.width,
            height: self.height,
            data,
            format: PixelFormat::RGB8,
        })
    }
}
