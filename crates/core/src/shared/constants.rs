pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Minimum detection score for a face to be counted.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// Base64 inflates the encoded image by 4/3; sized for 1080p PNG frames.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
