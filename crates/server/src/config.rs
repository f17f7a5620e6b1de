use std::path::PathBuf;

use clap::Parser;

use facecheck_core::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
};
use facecheck_core::verification::domain::policy::{
    VerificationPolicy, MAX_FACES, MIN_BRIGHTNESS, ROLL_THRESHOLD_DEG, YAW_THRESHOLD_DEG,
};

/// Face-presence verification service for proctored sessions.
#[derive(Parser, Debug, Clone)]
#[command(name = "facecheck", version)]
pub struct Cli {
    /// Address to bind.
    #[arg(long, env = "FACECHECK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "FACECHECK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// YOLO pose model (downloaded to the cache when omitted).
    #[arg(long, env = "FACECHECK_YOLO_MODEL")]
    pub yolo_model: Option<PathBuf>,

    /// BlazeFace model; when set it replaces YOLO for face counting.
    #[arg(long, env = "FACECHECK_BLAZEFACE_MODEL")]
    pub blazeface_model: Option<PathBuf>,

    /// Directory for downloaded models.
    #[arg(long, env = "FACECHECK_MODEL_CACHE_DIR")]
    pub model_cache_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, env = "FACECHECK_CONFIDENCE", default_value_t = DEFAULT_DETECTION_CONFIDENCE)]
    pub confidence: f64,

    /// Allowed CORS origins (comma-separated, `*` for any).
    #[arg(
        long,
        env = "FACECHECK_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "FACECHECK_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Mean intensity below which the camera counts as blocked (0-255).
    #[arg(long, env = "FACECHECK_MIN_BRIGHTNESS", default_value_t = MIN_BRIGHTNESS)]
    pub min_brightness: f64,

    /// Most faces allowed in frame.
    #[arg(long, env = "FACECHECK_MAX_FACES", default_value_t = MAX_FACES)]
    pub max_faces: usize,

    /// Largest accepted head tilt in degrees.
    #[arg(long, env = "FACECHECK_ROLL_THRESHOLD", default_value_t = ROLL_THRESHOLD_DEG)]
    pub roll_threshold: f64,

    /// Largest accepted head turn in degrees.
    #[arg(long, env = "FACECHECK_YAW_THRESHOLD", default_value_t = YAW_THRESHOLD_DEG)]
    pub yaw_threshold: f64,
}

impl Cli {
    pub fn policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            min_brightness: self.min_brightness,
            max_faces: self.max_faces,
            roll_threshold_deg: self.roll_threshold,
            yaw_threshold_deg: self.yaw_threshold,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )
            .into());
        }
        if !(0.0..=255.0).contains(&self.min_brightness) {
            return Err(format!(
                "Minimum brightness must be between 0 and 255, got {}",
                self.min_brightness
            )
            .into());
        }
        if self.max_faces == 0 {
            return Err("Max faces must be at least 1".into());
        }
        if !(0.0..=180.0).contains(&self.roll_threshold) {
            return Err(format!(
                "Roll threshold must be between 0 and 180 degrees, got {}",
                self.roll_threshold
            )
            .into());
        }
        if !(self.yaw_threshold.is_finite() && self.yaw_threshold >= 0.0) {
            return Err(format!(
                "Yaw threshold must be a non-negative number, got {}",
                self.yaw_threshold
            )
            .into());
        }
        if self.max_body_bytes == 0 {
            return Err("Max body bytes must be positive".into());
        }
        Ok(())
    }
}
