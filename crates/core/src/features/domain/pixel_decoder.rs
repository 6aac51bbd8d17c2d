use crate::shared::photo::PhotoRecord;
use crate::shared::pixel_buffer::PixelBuffer;

/// Domain interface for turning a stored image reference into pixels.
///
/// May fail for any individual photo; callers degrade rather than abort.
/// Shared across the worker threads of one extraction batch, hence `Sync`.
pub trait PixelDecoder: Send + Sync {
    fn decode(
        &self,
        photo: &PhotoRecord,
    ) -> Result<PixelBuffer, Box<dyn std::error::Error + Send + Sync>>;
}
