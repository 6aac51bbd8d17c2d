/// Joint RGB histogram levels per channel (4 x 4 x 4 = 64 bins).
pub const HISTOGRAM_LEVELS: usize = 4;
pub const HISTOGRAM_BINS: usize = HISTOGRAM_LEVELS * HISTOGRAM_LEVELS * HISTOGRAM_LEVELS;

/// Neutral composition and complexity used when pixels are unavailable.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Characteristic decay of the temporal similarity term, in seconds.
pub const TEMPORAL_DECAY_SECS: f64 = 60.0;

/// Photos closer than this are treated as one burst.
pub const BURST_WINDOW_SECS: f64 = 10.0;
pub const BURST_BONUS: f64 = 0.15;

/// Long-edge size decoded photos are downsampled to before analysis.
pub const ANALYSIS_MAX_EDGE: u32 = 512;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
