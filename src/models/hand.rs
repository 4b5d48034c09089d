// Data models for hand tracking

use serde::{Deserialize, Serialize};

/// Number of landmarks the hand pose model reports per hand
pub const HAND_LANDMARK_COUNT: usize = 21;

// ==============================================================================
// Detector Output (normalized coordinates)
// ==============================================================================

/// A 3D keypoint with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint3D {
    pub x: f32, // Normalized [0, 1] for image coordinates
    pub y: f32, // Normalized [0, 1] for image coordinates
    pub z: f32, // Depth relative to the wrist
    pub confidence: f32, // Detection confidence [0, 1]
}

impl Keypoint3D {
    pub fn new(x: f32, y: f32, z: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            z,
            confidence,
        }
    }
}

/// One detected hand, as reported by a [`HandDetector`](crate::platform::pose::HandDetector)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandPose {
    pub handedness: Handedness,
    pub landmarks: Vec<Keypoint3D>, // 21 hand landmarks in model order
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

/// MediaPipe Hand Landmark indices (21 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexFingerMcp = 5,
    IndexFingerPip = 6,
    IndexFingerDip = 7,
    IndexFingerTip = 8,
    MiddleFingerMcp = 9,
    MiddleFingerPip = 10,
    MiddleFingerDip = 11,
    MiddleFingerTip = 12,
    RingFingerMcp = 13,
    RingFingerPip = 14,
    RingFingerDip = 15,
    RingFingerTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

// ==============================================================================
// Pixel-Space Landmarks
// ==============================================================================

/// A hand joint mapped to pixel coordinates of the source frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    pub index: usize,
    pub x: i32,
    pub y: i32,
}

/// Landmarks of the selected hand in one frame
///
/// Either empty (no hand) or exactly [`HAND_LANDMARK_COUNT`] entries, ordered by joint index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkList(Vec<Landmark>);

impl LandmarkList {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, joint: HandLandmark) -> Option<&Landmark> {
        self.0.get(joint as usize)
    }
}

impl From<Vec<Landmark>> for LandmarkList {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }
}

impl<'a> IntoIterator for &'a LandmarkList {
    type Item = &'a Landmark;
    type IntoIter = std::slice::Iter<'a, Landmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub static_image_mode: bool,           // Run detection on every frame instead of tracking
    pub max_hands: u32,                    // Maximum number of hands to track (default: 2)
    pub model_complexity: ModelComplexity, // Model complexity (0=lite, 1=full, 2=heavy)
    pub min_detection_confidence: f32,     // Minimum confidence for detection (default: 0.1)
    pub min_tracking_confidence: f32,      // Minimum confidence for tracking (default: 0.1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            static_image_mode: false,
            max_hands: 2,
            model_complexity: ModelComplexity::Full,
            min_detection_confidence: 0.1,
            min_tracking_confidence: 0.1,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> DetectionResult<()> {
        if self.max_hands == 0 || self.max_hands > 4 {
            return Err(DetectionError::InvalidConfig(format!(
                "max_hands must be between 1 and 4, got {}",
                self.max_hands
            )));
        }

        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectionError::InvalidConfig(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Model loading failed: {0}")]
    ModelLoadFailed(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Expected {expected} landmarks per hand, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Hand index {index} out of range ({detected} hands detected)")]
    HandIndexOutOfRange { index: usize, detected: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DetectionResult<T> = Result<T, DetectionError>;
