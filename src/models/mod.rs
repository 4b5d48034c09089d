// Data models for frames, hand tracking results and notifications

pub mod frame;
pub mod hand;
pub mod notification;
