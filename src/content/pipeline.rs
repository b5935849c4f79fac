use std::sync::Arc;

use uuid::Uuid;

use crate::background::RelayReply;
use crate::error::{PipelineError, PipelineResult};
use crate::image_data::DataUrl;
use crate::messaging::{BackgroundRequest, BackgroundResponse, RequestSender};
use crate::settings::SettingsStore;

use super::crop::crop;
use super::ocr::OcrAdapter;
use super::overlay::FinalizedSelection;
use super::render::{RenderOutcome, ResponseRenderer};
use super::view::Viewer;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub type BackgroundSender = RequestSender<BackgroundRequest, BackgroundResponse>;

/// Everything a selection needs from its page, handed over explicitly.
#[derive(Clone)]
pub struct PipelineHandles {
    pub background: BackgroundSender,
    pub ocr: Arc<OcrAdapter>,
    pub renderer: ResponseRenderer,
    pub viewer: Arc<dyn Viewer>,
    pub settings: Arc<SettingsStore>,
    pub device_pixel_ratio: f64,
}

/// One finalized selection on its way through
/// capture → crop → OCR → relay → render.
pub struct SelectionTask {
    attempt: Uuid,
    selection: FinalizedSelection,
    handles: PipelineHandles,
}

impl SelectionTask {
    pub fn new(selection: FinalizedSelection, handles: PipelineHandles) -> Self {
        Self {
            attempt: Uuid::new_v4(),
            selection,
            handles,
        }
    }

    pub fn attempt(&self) -> Uuid {
        self.attempt
    }

    /// Runs every stage once, in order. The first failure ends the attempt.
    pub async fn run(self) -> PipelineResult<RenderOutcome> {
        let result = self.execute().await;
        match &result {
            Ok(RenderOutcome::Shown(_)) => log_info!("selection {} answered", self.attempt),
            Ok(RenderOutcome::Skipped) => log_info!(
                "selection {} answered while another response was visible; skipped",
                self.attempt
            ),
            Err(err) => log_error!(
                "selection {} failed during {}: {err}",
                self.attempt,
                err.stage()
            ),
        }
        result
    }

    async fn execute(&self) -> PipelineResult<RenderOutcome> {
        let rect = self.selection.rect;
        let flags = self.selection.flags;

        let screenshot = self.capture().await?;
        let cropped = crop(&screenshot, rect, self.handles.device_pixel_ratio)?;
        log_info!(
            "selection {} cropped to {:?} (ratio {})",
            self.attempt,
            rect,
            self.handles.device_pixel_ratio
        );

        if flags.open_screenshot {
            self.open_image(cropped.clone());
        }

        let text = self.handles.ocr.recognize(&cropped).await?;
        log_info!("selection {} recognized {} chars", self.attempt, text.len());

        if flags.open_ocr_text {
            self.open_text(text.clone());
        }
        if text.is_empty() {
            return Err(PipelineError::MissingText);
        }

        let reply = self.relay(text).await?;
        Ok(self.handles.renderer.render(&reply.answer, reply.stealth_mode))
    }

    async fn capture(&self) -> PipelineResult<DataUrl> {
        let request = BackgroundRequest::SelectionComplete {
            coords: self.selection.rect,
            stealth_mode: self.selection.flags.stealth_mode,
        };
        match self.handles.background.request(request).await? {
            BackgroundResponse::Screenshot { screenshot_base64 } => DataUrl::parse(screenshot_base64)
                .map_err(|err| PipelineError::Capture(err.to_string())),
            BackgroundResponse::Error { error } => Err(PipelineError::Capture(error)),
            other => Err(PipelineError::Messaging(format!(
                "unexpected reply to selection-complete: {other:?}"
            ))),
        }
    }

    async fn relay(&self, text: String) -> PipelineResult<RelayReply> {
        // Read at send time so the renderer uses the flag the request went out with.
        let stealth_mode = self.handles.settings.snapshot().stealth_mode;
        let request = BackgroundRequest::SendOcrText { text, stealth_mode };
        match self.handles.background.request(request).await? {
            BackgroundResponse::Answer {
                answer,
                stealth_mode,
            } => Ok(RelayReply {
                answer,
                stealth_mode,
            }),
            BackgroundResponse::Error { error } => Err(PipelineError::Relay(error)),
            other => Err(PipelineError::Messaging(format!(
                "unexpected reply to send-ocr-text: {other:?}"
            ))),
        }
    }

    fn open_image(&self, image: DataUrl) {
        let viewer = Arc::clone(&self.handles.viewer);
        tokio::spawn(async move {
            if let Err(err) = viewer.open_image(&image).await {
                log_warn!("failed to open screenshot view: {err:#}");
            }
        });
    }

    fn open_text(&self, text: String) {
        let viewer = Arc::clone(&self.handles.viewer);
        tokio::spawn(async move {
            if let Err(err) = viewer.open_text(&text).await {
                log_warn!("failed to open OCR text view: {err:#}");
            }
        });
    }
}
