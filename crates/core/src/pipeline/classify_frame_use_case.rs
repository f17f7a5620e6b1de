use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::detection::domain::face_landmarks::FaceLandmarkSet;
use crate::detection::domain::face_locator::FaceLocator;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::frame::Frame;
use crate::verification::domain::head_pose::estimate_pose;
use crate::verification::domain::policy::VerificationPolicy;
use crate::verification::domain::verdict::Verdict;

/// Classifies one frame as verified or as a specific, user-correctable warning.
///
/// Checks run in a fixed order and the first failing check decides the
/// verdict: brightness, face count, landmark tracking, roll, then yaw.
///
/// The locator and extractor are long-lived and shared by every request, so
/// each sits behind its own mutex; concurrent callers are serialized per
/// model. Backend failures are logged and read as "nothing detected", which
/// degrades to a `no_face` warning instead of an error.
pub struct ClassifyFrameUseCase {
    locator: Mutex<Box<dyn FaceLocator>>,
    extractor: Mutex<Box<dyn LandmarkExtractor>>,
    policy: VerificationPolicy,
}

impl ClassifyFrameUseCase {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        extractor: Box<dyn LandmarkExtractor>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            locator: Mutex::new(locator),
            extractor: Mutex::new(extractor),
            policy,
        }
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    pub fn classify(&self, frame: &Frame) -> Verdict {
        let started = Instant::now();
        let verdict = self.run_checks(frame);
        log::debug!(
            "Classified {}x{} frame in {:.1}ms: {}",
            frame.width(),
            frame.height(),
            started.elapsed().as_secs_f64() * 1000.0,
            verdict.message()
        );
        verdict
    }

    fn run_checks(&self, frame: &Frame) -> Verdict {
        if self.policy.is_too_dark(frame.mean_intensity()) {
            return Verdict::camera_blocked();
        }

        let face_count = self.count_faces(frame);
        if face_count == 0 {
            return Verdict::no_face();
        }
        if self.policy.is_too_many_faces(face_count) {
            return Verdict::multiple_faces(face_count);
        }

        let Some(landmarks) = self.extract_landmarks(frame) else {
            return Verdict::landmarks_lost();
        };

        let pose = estimate_pose(&landmarks, frame.width(), frame.height());
        if self.policy.is_tilted(pose.roll_deg) {
            return Verdict::head_tilted(pose);
        }
        if self.policy.is_looking_away(pose.yaw_deg) {
            return Verdict::looking_away(pose);
        }

        Verdict::success(pose)
    }

    fn count_faces(&self, frame: &Frame) -> usize {
        match lock(&self.locator, "face locator").locate(frame) {
            Ok(regions) => regions.len(),
            Err(e) => {
                log::warn!("Face locator failed, treating as no face: {e}");
                0
            }
        }
    }

    fn extract_landmarks(&self, frame: &Frame) -> Option<FaceLandmarkSet> {
        match lock(&self.extractor, "landmark extractor").extract(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                log::warn!("Landmark extractor failed, treating as untracked: {e}");
                None
            }
        }
    }
}

/// Locks a shared model, recovering it if a previous holder panicked.
fn lock<'a, T: ?Sized>(mutex: &'a Mutex<Box<T>>, name: &str) -> MutexGuard<'a, Box<T>> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("Recovering {name} after a panic in another request");
        poisoned.into_inner()
    })
}
