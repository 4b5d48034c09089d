// Integrations with code outside the crate: the hand pose model and frame sources

pub mod frame_source;
pub mod pose;
