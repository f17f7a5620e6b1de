use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::imaging::domain::frame_decoder::{strip_data_uri, DecodeError, FrameDecoder};
use crate::shared::frame::Frame;

/// Decodes base64 image payloads with the `image` crate.
///
/// Any format the `image` crate reads is accepted. Output is always
/// 3-channel RGB: grayscale is expanded and alpha is dropped.
pub struct Base64FrameDecoder;

impl Base64FrameDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Base64FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for Base64FrameDecoder {
    fn decode(&self, payload: &str) -> Result<Frame, DecodeError> {
        let encoded: String = strip_data_uri(payload)
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD.decode(encoded)?;
        let rgb = image::load_from_memory(&bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Frame::new(rgb.into_raw(), width, height, 3))
    }
}
