use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Domain interface for turning a transport-encoded image into a [`Frame`].
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, payload: &str) -> Result<Frame, DecodeError>;
}

/// Drops a data-URI header (`data:image/png;base64,`) if present.
///
/// Everything up to and including the first comma is removed.
pub fn strip_data_uri(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    }
}
