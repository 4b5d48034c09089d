// Landmark extraction - turns detector output into pixel-space landmarks

use crate::models::frame::Frame;
use crate::models::hand::{
    DetectionError, DetectionResult, HandPose, Landmark, LandmarkList, HAND_LANDMARK_COUNT,
};
use crate::platform::pose::HandDetector;

/// Runs a [`HandDetector`] on frames and maps one hand to pixel coordinates
pub struct LandmarkExtractor<D> {
    detector: D,
}

impl<D: HandDetector> LandmarkExtractor<D> {
    pub fn new(detector: D) -> Self {
        Self { detector }
    }

    /// Detect all hands in a frame
    ///
    /// The frame is converted to RGB first; detector failures are returned unchanged.
    pub fn detect_hands(&mut self, frame: &Frame) -> DetectionResult<Vec<HandPose>> {
        let rgb = frame.to_rgb8()?;
        let hands = self.detector.detect(&rgb)?;
        log::trace!("Detected {} hand(s) in {}x{} frame", hands.len(), frame.width, frame.height);
        Ok(hands)
    }

    /// Pixel-space landmarks for the hand at `hand_index`, or an empty list if no hand is present
    ///
    /// `hand_index` must be below the number of hands detected in this frame.
    pub fn extract(&mut self, frame: &Frame, hand_index: usize) -> DetectionResult<LandmarkList> {
        let hands = self.detect_hands(frame)?;
        if hands.is_empty() {
            return Ok(LandmarkList::empty());
        }

        let hand = hands
            .get(hand_index)
            .ok_or(DetectionError::HandIndexOutOfRange {
                index: hand_index,
                detected: hands.len(),
            })?;

        to_pixel_landmarks(hand, frame.width, frame.height)
    }
}

/// Map normalized landmarks onto a `width` x `height` frame, keeping model order
pub fn to_pixel_landmarks(hand: &HandPose, width: u32, height: u32) -> DetectionResult<LandmarkList> {
    if hand.landmarks.len() != HAND_LANDMARK_COUNT {
        return Err(DetectionError::LandmarkCount {
            expected: HAND_LANDMARK_COUNT,
            actual: hand.landmarks.len(),
        });
    }

    let (w, h) = (width as f32, height as f32);
    let landmarks = hand
        .landmarks
        .iter()
        .enumerate()
        .map(|(index, kp)| Landmark {
            index,
            x: (kp.x * w).round() as i32,
            y: (kp.y * h).round() as i32,
        })
        .collect::<Vec<_>>();

    Ok(landmarks.into())
}
