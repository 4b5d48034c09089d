use anyhow::Context;
use handwatch_lib::core::config::Config;
use handwatch_lib::core::dispatcher::Dispatcher;
use handwatch_lib::core::pipeline::HandPipeline;
use handwatch_lib::core::transport::HttpTransport;
use handwatch_lib::models::hand::HandLandmark;
use handwatch_lib::platform::frame_source::{FrameSource, ImageSequence};
use handwatch_lib::platform::pose::DefaultHandDetector;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    handwatch_lib::init_logger();

    let frames_dir = match std::env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => anyhow::bail!("usage: handwatch <frames-dir>"),
    };

    let config = Config::load().context("failed to load configuration")?;
    if config.api_endpoint.is_none() {
        log::warn!("No notification endpoint configured, hand detections will not be reported");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let detector = DefaultHandDetector::new(&config.detector_config())
        .context("failed to initialize hand detector")?;
    let transport = HttpTransport::new(config.request_timeout())
        .context("failed to build HTTP client")?;
    let dispatcher = Dispatcher::spawn(
        config.dispatcher_config(),
        Arc::new(transport),
        runtime.handle(),
    );
    let mut pipeline = HandPipeline::from_config(detector, dispatcher, &config);

    let mut frames = ImageSequence::open(&frames_dir)
        .with_context(|| format!("failed to open {}", frames_dir.display()))?;
    log::info!("Processing {} frames from {}", frames.remaining(), frames_dir.display());

    loop {
        let frame = match frames.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Skipping unreadable frame: {}", e);
                continue;
            }
        };

        match pipeline.process_frame(&frame) {
            Ok(landmarks) => {
                if let Some(tip) = landmarks.get(HandLandmark::ThumbTip) {
                    log::debug!("Thumb tip at ({}, {})", tip.x, tip.y);
                }
            }
            Err(e) => {
                log::error!("Hand detection failed: {}", e);
                break;
            }
        }
    }

    let (stats, metrics) = runtime.block_on(pipeline.shutdown());
    log::info!(
        "Processed {} frames ({} with hands), {} notifications approved",
        stats.frames_processed,
        stats.frames_with_hands,
        stats.notifications_approved
    );
    log::info!(
        "Notifications: {} sent, {} failed, {} dropped, {} skipped without endpoint",
        metrics.sent,
        metrics.failed,
        metrics.dropped,
        metrics.skipped_unconfigured
    );

    Ok(())
}
