use ndarray::ArrayView3;

/// A single decoded camera frame: contiguous 8-bit pixels in row-major order.
///
/// Frames are immutable once decoded. Format conversion happens at the
/// decoding boundary only; classification treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
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

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Mean intensity over every channel of every pixel, in `[0, 255]`.
    ///
    /// An empty frame reads as fully dark.
    pub fn mean_intensity(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum = self
            .as_ndarray()
            .fold(0u64, |acc, &value| acc + u64::from(value));
        sum as f64 / self.data.len() as f64
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
