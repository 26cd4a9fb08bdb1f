//! Figure rendering capability

use std::io::Cursor;

use experiment_core::{Error, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

/// Capability to rasterize a figure into PNG bytes at a target resolution
pub trait Figure {
    /// Encode the figure as PNG at `width` x `height` pixels
    fn render_png(&self, width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Figure backed by an in-memory raster image
///
/// Borrowed by the output writer, so the caller keeps the image for
/// further use; dropping it is the caller's choice.
#[derive(Debug, Clone)]
pub struct RasterFigure {
    image: DynamicImage,
}

impl RasterFigure {
    /// Wrap an image as a savable figure
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }
}

impl From<DynamicImage> for RasterFigure {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl Figure for RasterFigure {
    fn render_png(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let resized = self.image.resize_exact(width, height, FilterType::Lanczos3);
        let mut buf = Cursor::new(Vec::new());
        resized
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| Error::Serialization(format!("PNG encoding failed: {}", e)))?;
        Ok(buf.into_inner())
    }
}
