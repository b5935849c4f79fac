use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};
use crate::image_data::DataUrl;

/// Platform primitive that grabs the currently visible tab as PNG bytes.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    async fn capture_visible_tab(&self) -> Result<Vec<u8>>;
}

/// Serves a PNG frame from disk as the visible viewport.
pub struct FileCapturer {
    path: PathBuf,
}

impl FileCapturer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScreenCapturer for FileCapturer {
    async fn capture_visible_tab(&self) -> Result<Vec<u8>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::read(&path).with_context(|| format!("failed to read frame {}", path.display()))
        })
        .await
        .context("frame capture worker join failed")?
    }
}

/// Full-viewport capture. Coordinates never reach this step; cropping happens
/// on the page side.
#[derive(Clone)]
pub struct CaptureService {
    capturer: Arc<dyn ScreenCapturer>,
}

impl CaptureService {
    pub fn new(capturer: Arc<dyn ScreenCapturer>) -> Self {
        Self { capturer }
    }

    pub async fn capture(&self) -> PipelineResult<DataUrl> {
        let png = self
            .capturer
            .capture_visible_tab()
            .await
            .map_err(|err| PipelineError::Capture(format!("{err:#}")))?;

        if png.is_empty() {
            return Err(PipelineError::Capture(
                "no image data received from the capture primitive".into(),
            ));
        }

        Ok(DataUrl::from_png(&png))
    }
}
