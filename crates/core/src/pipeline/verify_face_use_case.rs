use crate::imaging::domain::frame_decoder::FrameDecoder;
use crate::pipeline::classify_frame_use_case::ClassifyFrameUseCase;
use crate::verification::domain::verdict::Verdict;

pub const NO_IMAGE_MESSAGE: &str = "No image provided";
pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image format";

/// Turns one request payload into a verdict: decode, then classify.
///
/// Only a missing or undecodable image yields `status: "error"`. Everything
/// past decoding is a success or a warning.
pub struct VerifyFaceUseCase {
    decoder: Box<dyn FrameDecoder>,
    classifier: ClassifyFrameUseCase,
}

impl VerifyFaceUseCase {
    pub fn new(decoder: Box<dyn FrameDecoder>, classifier: ClassifyFrameUseCase) -> Self {
        Self {
            decoder,
            classifier,
        }
    }

    /// `image` is the base64 payload, optionally wrapped in a data URI.
    /// `None` means the request carried no image at all; an empty payload is
    /// present but undecodable.
    pub fn execute(&self, image: Option<&str>) -> Verdict {
        let Some(payload) = image else {
            return Verdict::error(NO_IMAGE_MESSAGE);
        };

        let frame = match self.decoder.decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Rejected image payload ({} bytes): {e}", payload.len());
                return Verdict::error(INVALID_IMAGE_MESSAGE);
            }
        };

        self.classifier.classify(&frame)
    }
}
