use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for counting faces in a frame.
///
/// Inference sessions mutate internal buffers, hence `&mut self`.
/// Callers sharing one locator across threads must serialize access.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
