//! Face-presence verification for single camera frames.
//!
//! Decodes a base64 frame, locates faces, estimates head pose from facial
//! landmarks and folds the results into a single [`Verdict`].
//!
//! [`Verdict`]: verification::domain::verdict::Verdict

pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;
pub mod verification;
