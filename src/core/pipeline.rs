use crate::core::config::Config;
use crate::core::dispatcher::{DispatchMetrics, Dispatcher};
use crate::core::landmark_extractor::LandmarkExtractor;
use crate::core::notification_gate::NotificationGate;
use crate::models::frame::Frame;
use crate::models::hand::{DetectionResult, LandmarkList};
use crate::models::notification::PayloadTemplate;
use crate::platform::pose::HandDetector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==============================================================================
// Statistics
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub frames_processed: u64,
    pub frames_with_hands: u64,
    pub notifications_approved: u64,
}

// ==============================================================================
// Hand Pipeline
// ==============================================================================

/// Per-frame detection-to-notification pipeline
///
/// Each frame runs through the extractor. Frames that contain a hand consult the gate once, and
/// an open gate hands a notification to the dispatcher. Frame processing never waits on the
/// network.
pub struct HandPipeline<D> {
    extractor: LandmarkExtractor<D>,
    gate: Arc<NotificationGate>,
    dispatcher: Dispatcher,
    template: PayloadTemplate,
    stats: PipelineStats,
}

impl<D: HandDetector> HandPipeline<D> {
    pub fn new(
        detector: D,
        gate: Arc<NotificationGate>,
        dispatcher: Dispatcher,
        template: PayloadTemplate,
    ) -> Self {
        log::info!(
            "Hand pipeline ready: detector={}, cooldown={:?}, endpoint configured={}",
            detector.model_info(),
            gate.cooldown(),
            dispatcher.is_configured()
        );

        Self {
            extractor: LandmarkExtractor::new(detector),
            gate,
            dispatcher,
            template,
            stats: PipelineStats::default(),
        }
    }

    /// Build a pipeline with the gate and payload described by `config`
    pub fn from_config(detector: D, dispatcher: Dispatcher, config: &Config) -> Self {
        Self::new(
            detector,
            Arc::new(NotificationGate::with_cooldown(config.cooldown())),
            dispatcher,
            config.payload_template(),
        )
    }

    /// Process a frame at the current wall-clock time
    pub fn process_frame(&mut self, frame: &Frame) -> DetectionResult<LandmarkList> {
        self.process_frame_at(frame, Utc::now())
    }

    /// Process a frame as if it arrived at `now`
    ///
    /// Returns the landmarks of the first detected hand. Detection errors are returned before the
    /// gate is consulted.
    pub fn process_frame_at(
        &mut self,
        frame: &Frame,
        now: DateTime<Utc>,
    ) -> DetectionResult<LandmarkList> {
        let landmarks = self.extractor.extract(frame, 0)?;
        self.stats.frames_processed += 1;

        if landmarks.is_empty() {
            return Ok(landmarks);
        }
        self.stats.frames_with_hands += 1;

        if self.gate.try_acquire(now) {
            self.stats.notifications_approved += 1;
            log::debug!("Hand detected, notification approved at {}", now);
            self.dispatcher.dispatch(self.template.stamp(now));
        }

        Ok(landmarks)
    }

    pub fn gate(&self) -> &Arc<NotificationGate> {
        &self.gate
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Wait for outstanding notifications and return the final counts
    pub async fn shutdown(self) -> (PipelineStats, DispatchMetrics) {
        let metrics = self.dispatcher.shutdown().await;
        (self.stats, metrics)
    }
}
