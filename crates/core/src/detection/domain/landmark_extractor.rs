use crate::detection::domain::face_landmarks::FaceLandmarkSet;
use crate::shared::frame::Frame;

/// Domain interface for facial landmarks of the most prominent face.
///
/// Returns `Ok(None)` when no face could be tracked.
pub trait LandmarkExtractor: Send {
    fn extract(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<FaceLandmarkSet>, Box<dyn std::error::Error>>;
}
