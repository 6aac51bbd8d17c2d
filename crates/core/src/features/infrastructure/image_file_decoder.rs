use std::path::Path;

use crate::features::domain::pixel_decoder::PixelDecoder;
use crate::shared::constants::{ANALYSIS_MAX_EDGE, IMAGE_EXTENSIONS};
use crate::shared::photo::PhotoRecord;
use crate::shared::pixel_buffer::PixelBuffer;

/// Decodes photos from local files using the `image` crate.
///
/// The record's `pixel_ref` is treated as a file path. Large photos are
/// downsampled so the long edge is at most `max_edge` pixels; every feature
/// the engine computes is scale-invariant, so full resolution buys nothing.
pub struct ImageFileDecoder {
    max_edge: u32,
}

impl ImageFileDecoder {
    pub fn new(max_edge: u32) -> Self {
        Self {
            max_edge: max_edge.max(1),
        }
    }
}

impl Default for ImageFileDecoder {
    fn default() -> Self {
        Self::new(ANALYSIS_MAX_EDGE)
    }
}

impl PixelDecoder for ImageFileDecoder {
    fn decode(
        &self,
        photo: &PhotoRecord,
    ) -> Result<PixelBuffer, Box<dyn std::error::Error + Send + Sync>> {
        let path = Path::new(&photo.pixel_ref);
        if !has_image_extension(path) {
            return Err(format!("unsupported image type: {}", path.display()).into());
        }

        let img = image::open(path)?;
        let (source_width, source_height) = (img.width(), img.height());
        let img = if img.width() > self.max_edge || img.height() > self.max_edge {
            img.thumbnail(self.max_edge, self.max_edge)
        } else {
            img
        };

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(PixelBuffer::new(rgb.into_raw(), width, height)
            .with_source_size(source_width, source_height))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
