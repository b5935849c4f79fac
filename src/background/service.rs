use std::sync::{Arc, RwLock};

use crate::error::{PipelineError, PipelineResult};
use crate::messaging::{
    BackgroundRequest, BackgroundResponse, ContentRequest, ContentResponse, RequestSender,
};
use crate::settings::SettingsStore;

use super::{CaptureService, RelayClient};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub type TabSender = RequestSender<ContentRequest, ContentResponse>;

/// Global keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartOcrSelection,
}

impl Command {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start-ocr-selection" => Some(Command::StartOcrSelection),
            _ => None,
        }
    }
}

/// Privileged side: screen capture, relay round trips and keyboard commands.
pub struct BackgroundService {
    capture: CaptureService,
    relay: RelayClient,
    settings: Arc<SettingsStore>,
    active_tab: RwLock<Option<TabSender>>,
}

impl BackgroundService {
    pub fn new(capture: CaptureService, relay: RelayClient, settings: Arc<SettingsStore>) -> Self {
        Self {
            capture,
            relay,
            settings,
            active_tab: RwLock::new(None),
        }
    }

    /// Points keyboard commands at the page that currently has focus.
    pub fn attach_tab(&self, tab: TabSender) {
        if let Ok(mut guard) = self.active_tab.write() {
            *guard = Some(tab);
        }
    }

    pub fn detach_tab(&self) {
        if let Ok(mut guard) = self.active_tab.write() {
            *guard = None;
        }
    }

    pub async fn handle(&self, request: BackgroundRequest) -> BackgroundResponse {
        match request {
            BackgroundRequest::SelectionComplete { .. } => {
                log_info!("handling selection-complete");
                match self.capture.capture().await {
                    Ok(url) => BackgroundResponse::Screenshot {
                        screenshot_base64: url.into_string(),
                    },
                    Err(err) => {
                        log_error!("error capturing visible tab: {err}");
                        BackgroundResponse::error(err)
                    }
                }
            }
            BackgroundRequest::SendOcrText { text, stealth_mode } => {
                let model = self.settings.snapshot().selected_model;
                match self.relay.relay(&text, &model, stealth_mode).await {
                    Ok(reply) => BackgroundResponse::Answer {
                        answer: reply.answer,
                        stealth_mode: reply.stealth_mode,
                    },
                    Err(PipelineError::MissingText) => {
                        log_warn!("no text provided for OCR processing");
                        BackgroundResponse::error(PipelineError::MissingText)
                    }
                    Err(err) => {
                        log_error!("error communicating with relay: {err}");
                        BackgroundResponse::error(err)
                    }
                }
            }
        }
    }

    /// Dispatches a global shortcut by name. Unknown names are ignored.
    pub async fn on_command(&self, name: &str) -> PipelineResult<Option<ContentResponse>> {
        match Command::parse(name) {
            Some(Command::StartOcrSelection) => {
                log_info!("keyboard shortcut triggered: start OCR selection");
                self.start_selection().await.map(Some)
            }
            None => {
                log_warn!("unknown command received: {name}");
                Ok(None)
            }
        }
    }

    async fn start_selection(&self) -> PipelineResult<ContentResponse> {
        let tab = self
            .active_tab
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| PipelineError::Messaging("no active tab found".into()))?;

        let settings = self.settings.snapshot();
        let request = ContentRequest::StartOcrSelection {
            open_screenshot: settings.open_screenshot,
            open_ocr_text: settings.open_ocr_text,
            stealth_mode: settings.stealth_mode,
        };

        match tab.request(request).await {
            Ok(response) => {
                log_info!("OCR selection started via keyboard shortcut");
                Ok(response)
            }
            Err(err) => {
                log_error!("error sending message to content script: {err}");
                Err(err)
            }
        }
    }
}
