/// Decoded photo pixels: contiguous RGB bytes in row-major order.
///
/// Decoding and downsampling happen at the infrastructure boundary; feature
/// extraction only ever reads from this buffer. `source_size` keeps the
/// dimensions of the stored image before any downsampling.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    source_size: (u32, u32),
}

impl PixelBuffer {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            source_size: (width, height),
        }
    }

    pub fn with_source_size(mut self, width: u32, height: u32) -> Self {
        self.source_size = (width, height);
        self
    }

    /// A buffer filled with one color, mostly useful for tests and stubs.
    pub fn solid(r: u8, g: u8, b: u8, width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(pixels * Self::CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&[r, g, b]);
        }
        Self::new(data, width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// Rec. 601 luma per pixel on a 0-255 scale, row-major.
    pub fn luminance(&self) -> Vec<f64> {
        self.data
            .chunks_exact(Self::CHANNELS)
            .map(|px| 0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64)
            .collect()
    }
}
