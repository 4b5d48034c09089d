pub mod config;

// Per-frame pipeline
pub mod landmark_extractor;
pub mod notification_gate;
pub mod pipeline;

// Outbound notifications
pub mod dispatcher;
pub mod transport;
