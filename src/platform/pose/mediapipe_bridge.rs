// MediaPipe integration bridge
// Provides an abstraction over the MediaPipe Hands model
// Implemented over PyO3 (Python) when the `ml-pyo3` feature is enabled

use crate::models::frame::Frame;
use crate::models::hand::{DetectionError, DetectionResult, DetectorConfig, HandPose, Handedness, Keypoint3D};
use serde_json::Value;

/// The hand pose detection capability
///
/// Implementations receive RGB8 frames and report every hand they find, up to the configured
/// maximum, each with its landmarks in model order and normalized to `[0, 1]`.
pub trait HandDetector: Send {
    /// Run detection on a frame
    fn detect(&mut self, frame: &Frame) -> DetectionResult<Vec<HandPose>>;

    /// Get model info
    fn model_info(&self) -> String {
        "unknown hand detector".to_string()
    }
}

impl<D: HandDetector + ?Sized> HandDetector for Box<D> {
    fn detect(&mut self, frame: &Frame) -> DetectionResult<Vec<HandPose>> {
        (**self).detect(frame)
    }

    fn model_info(&self) -> String {
        (**self).model_info()
    }
}

// ==============================================================================
// Inference Output
// ==============================================================================

/// Parse the JSON reported by the `hand_inference` Python module
///
/// A non-null `error` becomes [`DetectionError::InferenceFailed`]. A missing `hands` array means no
/// hands were found.
pub fn parse_inference_output(json_str: &str) -> DetectionResult<Vec<HandPose>> {
    let result: Value = serde_json::from_str(json_str)
        .map_err(|e| DetectionError::InferenceFailed(format!("Failed to parse JSON: {}", e)))?;

    if let Some(error) = result.get("error").and_then(|e| e.as_str()) {
        return Err(DetectionError::InferenceFailed(error.to_string()));
    }

    match result.get("hands").and_then(|h| h.as_array()) {
        Some(hands) => hands.iter().map(parse_hand).collect(),
        None => Ok(Vec::new()),
    }
}

fn parse_hand(data: &Value) -> DetectionResult<HandPose> {
    let keypoints = data
        .get("keypoints")
        .and_then(|k| k.as_array())
        .ok_or_else(|| DetectionError::InferenceFailed("Missing hand keypoints".to_string()))?;

    let landmarks: Vec<Keypoint3D> = keypoints
        .iter()
        .map(|kp| {
            let coord = |axis: &str| kp.get(axis).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
            Keypoint3D::new(coord("x"), coord("y"), coord("z"), 1.0)
        })
        .collect();

    let handedness = match data.get("hand_type").and_then(|t| t.as_str()) {
        Some("Right") => Handedness::Right,
        _ => Handedness::Left,
    };

    let confidence = data
        .get("confidence")
        .and_then(|c| c.as_f64())
        .unwrap_or(0.0) as f32;

    Ok(HandPose {
        handedness,
        landmarks,
        confidence,
    })
}

// ==============================================================================
// PyO3 Implementation (Python MediaPipe)
// ==============================================================================

/// Python MediaPipe backend.
///
/// Imports the `hand_inference` module from `$HANDWATCH_PYTHON_DIR` (default `./python`) and calls
/// its `process_image_bytes(**kwargs)` function once per frame. The function returns a JSON string
/// of the form `{"hands": [{"keypoints": [{"x", "y", "z"}, ...], "hand_type": "Left",
/// "confidence": 0.97}], "error": null}`.
#[cfg(feature = "ml-pyo3")]
pub mod pyo3_backend {
    use super::*;
    use crate::models::frame::PixelFormat;
    use pyo3::prelude::*;
    use pyo3::types::{PyBytes, PyDict};
    use std::path::PathBuf;

    pub struct PyO3MediaPipe {
        inference_module: Py<PyModule>,
        config: DetectorConfig,
    }

    impl PyO3MediaPipe {
        pub fn new(config: &DetectorConfig) -> DetectionResult<Self> {
            config.validate()?;

            let python_dir = std::env::var_os("HANDWATCH_PYTHON_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("python"));
            let python_dir = python_dir.to_str().map(str::to_string).ok_or_else(|| {
                DetectionError::ModelLoadFailed(format!(
                    "Python directory is not valid UTF-8: {:?}",
                    python_dir
                ))
            })?;

            Python::with_gil(|py| {
                let sys = py
                    .import_bound("sys")
                    .map_err(|e| DetectionError::ModelLoadFailed(format!("Failed to import sys: {}", e)))?;

                let path_list = sys
                    .getattr("path")
                    .map_err(|e| DetectionError::ModelLoadFailed(format!("Failed to get sys.path: {}", e)))?;

                path_list.call_method1("insert", (0, python_dir.as_str())).map_err(|e| {
                    DetectionError::ModelLoadFailed(format!("Failed to add python dir to path: {}", e))
                })?;

                let inference_module = py.import_bound("hand_inference").map_err(|e| {
                    DetectionError::ModelLoadFailed(format!(
                        "Failed to import hand_inference: {}. Make sure mediapipe is installed (pip install mediapipe)",
                        e
                    ))
                })?;

                log::info!(
                    "PyO3MediaPipe initialized: max_hands={}, complexity={:?}, detection={}, tracking={}",
                    config.max_hands,
                    config.model_complexity,
                    config.min_detection_confidence,
                    config.min_tracking_confidence
                );

                Ok(Self {
                    inference_module: inference_module.unbind(),
                    config: config.clone(),
                })
            })
        }
    }

    impl HandDetector for PyO3MediaPipe {
        fn detect(&mut self, frame: &Frame) -> DetectionResult<Vec<HandPose>> {
            if frame.format != PixelFormat::RGB8 {
                return Err(DetectionError::MalformedFrame(format!(
                    "MediaPipe expects RGB8 input, got {:?}",
                    frame.format
                )));
            }

            let json_str = Python::with_gil(|py| -> DetectionResult<String> {
                let module = self.inference_module.bind(py);

                let process_fn = module.getattr("process_image_bytes").map_err(|e| {
                    DetectionError::InferenceFailed(format!("Failed to get process_image_bytes: {}", e))
                })?;

                let kwargs = PyDict::new_bound(py);
                let set = |key: &str, value: PyObject| {
                    kwargs
                        .set_item(key, value)
                        .map_err(|e| DetectionError::InferenceFailed(format!("Failed to set {}: {}", key, e)))
                };
                set("image_bytes", PyBytes::new_bound(py, &frame.data).into_py(py))?;
                set("width", frame.width.into_py(py))?;
                set("height", frame.height.into_py(py))?;
                set("static_image_mode", self.config.static_image_mode.into_py(py))?;
                set("max_num_hands", self.config.max_hands.into_py(py))?;
                set("model_complexity", (self.config.model_complexity as u8).into_py(py))?;
                set("min_detection_confidence", self.config.min_detection_confidence.into_py(py))?;
                set("min_tracking_confidence", self.config.min_tracking_confidence.into_py(py))?;

                let result = process_fn
                    .call((), Some(&kwargs))
                    .map_err(|e| DetectionError::InferenceFailed(format!("MediaPipe inference failed: {}", e)))?;

                result
                    .extract()
                    .map_err(|e| DetectionError::InferenceFailed(format!("Failed to extract JSON: {}", e)))
            })?;

            parse_inference_output(&json_str)
        }

        fn model_info(&self) -> String {
            format!(
                "PyO3 MediaPipe Hands (Python backend) - max_hands: {}, complexity: {:?}",
                self.config.max_hands, self.config.model_complexity
            )
        }
    }
}

// ==============================================================================
// Dummy Implementation (for compilation without features)
// ==============================================================================

#[cfg(not(feature = "ml-pyo3"))]
pub struct DummyMediaPipe {
    config: DetectorConfig,
}

#[cfg(not(feature = "ml-pyo3"))]
impl DummyMediaPipe {
    pub fn new(config: &DetectorConfig) -> DetectionResult<Self> {
        config.validate()?;
        log::warn!("Using dummy MediaPipe implementation (no inference)");
        log::warn!("Enable the 'ml-pyo3' feature for actual hand detection");
        Ok(Self {
            config: config.clone(),
        })
    }
}

#[cfg(not(feature = "ml-pyo3"))]
impl HandDetector for DummyMediaPipe {
    fn detect(&mut self, _frame: &Frame) -> DetectionResult<Vec<HandPose>> {
        Ok(Vec::new())
    }

    fn model_info(&self) -> String {
        format!(
            "Dummy MediaPipe (no ML inference, max_hands: {}) - enable 'ml-pyo3' feature",
            self.config.max_hands
        )
    }
}

// ==============================================================================
// Default Backend Selection
// ==============================================================================

#[cfg(feature = "ml-pyo3")]
pub type DefaultHandDetector = pyo3_backend::PyO3MediaPipe;

#[cfg(not(feature = "ml-pyo3"))]
pub type DefaultHandDetector = DummyMediaPipe;
