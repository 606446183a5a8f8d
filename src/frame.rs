//! The HTTP-side cached copy of the current JPEG frame.

/// Width of the embedded blank frame in pixels.
pub const BLANK_WIDTH: u32 = 640;
/// Height of the embedded blank frame in pixels.
pub const BLANK_HEIGHT: u32 = 480;

/// Minimal baseline JPEG served while no producer frame is available.
///
/// SOI, JFIF APP0, SOF0 carrying the 640x480 geometry, one Huffman table,
/// SOS and a single entropy-coded byte. Decoders render it as a black
/// "no signal" image.
pub static BLANK_JPEG: [u8; 90] = [
    // SOI
    0xFF, 0xD8, //
    // APP0 (JFIF, 72 dpi, no thumbnail)
    0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x01, //
    0x00, 0x48, 0x00, 0x48, 0x00, 0x00, //
    // SOF0 (baseline DCT, 8-bit, 480x640, YCbCr)
    0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0xE0, 0x02, 0x80, 0x03, //
    0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, //
    // DHT
    0xFF, 0xC4, 0x00, 0x1F, 0x00, //
    0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, //
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, //
    0x08, 0x09, 0x0A, 0x0B, //
    // SOS
    0xFF, 0xDA, 0x00, 0x0C, 0x03, 0x01, 0x00, 0x02, 0x11, 0x03, 0x11, //
    0x00, 0x3F, 0x00, //
    // Entropy-coded data
    0xFF, 0x00, //
    // EOI
    0xFF, 0xD9,
];

/// The frame the HTTP side serves: latest JPEG bytes, dimensions and an
/// online flag telling whether the bytes came from a real producer capture
/// or from the embedded blank.
///
/// Mutated only by the refresh scheduler; everything else takes read-only
/// snapshots. The backing buffer grows monotonically and never shrinks, so
/// bursty frame sizes do not churn the allocator.
#[derive(Debug)]
pub struct ExposedFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    online: bool,
}

impl ExposedFrame {
    /// Create a frame holding the embedded blank JPEG, offline.
    pub fn new() -> Self {
        Self {
            data: BLANK_JPEG.to_vec(),
            width: BLANK_WIDTH,
            height: BLANK_HEIGHT,
            online: false,
        }
    }

    /// Grow the backing buffer so it can hold at least `n` bytes.
    /// Never shrinks. Contents are unspecified until the next copy.
    pub fn ensure_capacity(&mut self, n: usize) {
        if self.data.capacity() < n {
            self.data.reserve(n - self.data.len());
        }
    }

    /// Overwrite the frame with producer bytes.
    pub fn copy_from(&mut self, bytes: &[u8], width: u32, height: u32, online: bool) {
        self.ensure_capacity(bytes.len());
        self.data.clear();
        self.data.extend_from_slice(bytes);
        self.width = width;
        self.height = height;
        self.online = online;
    }

    /// Install the blank JPEG and clear the online flag.
    ///
    /// Early-returns when the frame is already blank, so repeated calls do
    /// not copy.
    pub fn set_blank(&mut self) {
        if !self.online && self.data.len() == BLANK_JPEG.len() {
            return;
        }
        self.copy_from(&BLANK_JPEG, BLANK_WIDTH, BLANK_HEIGHT, false);
    }

    /// Current JPEG bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the current JPEG in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Allocated capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True iff the last refresh reflected a real producer frame.
    pub fn online(&self) -> bool {
        self.online
    }
}

impl Default for ExposedFrame {
    fn default() -> Self {
        Self::new()
    }
}
