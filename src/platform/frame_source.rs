// Frame sources that drive the pipeline

use crate::models::frame::Frame;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

pub type FrameSourceResult<T> = Result<T, FrameSourceError>;

/// A sequence of frames; `Ok(None)` marks the end of the stream
pub trait FrameSource {
    fn next_frame(&mut self) -> FrameSourceResult<Option<Frame>>;
}

/// Still images in a directory, played back in file name order
pub struct ImageSequence {
    paths: std::vec::IntoIter<PathBuf>,
}

impl ImageSequence {
    pub fn open(dir: &Path) -> FrameSourceResult<Self> {
        let io_err = |source| FrameSourceError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && Self::is_image(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        log::debug!("Found {} images in {:?}", paths.len(), dir);

        Ok(Self {
            paths: paths.into_iter(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> FrameSourceResult<Option<Frame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };

        let image = image::open(&path).map_err(|source| FrameSourceError::Decode {
            path: path.clone(),
            source,
        })?;

        log::trace!("Decoded {:?} ({}x{})", path, image.width(), image.height());
        Ok(Some(Frame::from_image(image)))
    }
}
