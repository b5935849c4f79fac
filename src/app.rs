use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::background::{
    BackgroundController, BackgroundService, CaptureService, RelayClient, ScreenCapturer,
};
use crate::config::AppConfig;
use crate::content::{
    run_content, ContentChannels, ContentScript, OcrAdapter, OcrEngine, Page, PipelineHandles,
    PointerEvent, RenderOutcome, ResponseRenderer, Viewer,
};
use crate::error::{PipelineError, PipelineResult};
use crate::messaging::{request_channel, ContentRequest, ContentResponse, RequestSender};
use crate::settings::SettingsStore;
use crate::utils::logging;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

const CHANNEL_CAPACITY: usize = 32;

/// Both contexts wired together: the background task, the content task and
/// the channels a driver uses to poke at them.
pub struct App {
    settings: Arc<SettingsStore>,
    background: BackgroundController,
    tab: RequestSender<ContentRequest, ContentResponse>,
    pointer: mpsc::Sender<PointerEvent>,
    outcomes: mpsc::UnboundedReceiver<PipelineResult<RenderOutcome>>,
    page: Page,
    ocr: Arc<OcrAdapter>,
    content: JoinHandle<()>,
    content_cancel: CancellationToken,
    logger: JoinHandle<()>,
}

impl App {
    /// Loads settings from `config.settings_path` and starts both contexts.
    pub fn start(
        config: AppConfig,
        capturer: Arc<dyn ScreenCapturer>,
        engine: Arc<dyn OcrEngine>,
        viewer: Arc<dyn Viewer>,
    ) -> Result<Self> {
        let settings = Arc::new(SettingsStore::new(config.settings_path.clone())?);
        Self::start_with_settings(config, settings, capturer, engine, viewer)
    }

    pub fn start_with_settings(
        config: AppConfig,
        settings: Arc<SettingsStore>,
        capturer: Arc<dyn ScreenCapturer>,
        engine: Arc<dyn OcrEngine>,
        viewer: Arc<dyn Viewer>,
    ) -> Result<Self> {
        logging::init_stealth(settings.snapshot().stealth_mode);
        let logger = tokio::spawn(logging::follow_settings(settings.subscribe()));

        let relay = RelayClient::new(&config.relay_url)?;
        let service = Arc::new(BackgroundService::new(
            CaptureService::new(capturer),
            relay,
            Arc::clone(&settings),
        ));
        let mut background = BackgroundController::new(Arc::clone(&service));
        let (background_tx, background_inbox) = request_channel(CHANNEL_CAPACITY);
        background.start(background_inbox)?;

        let page = Page::new();
        let ocr = Arc::new(OcrAdapter::new(engine, config.ocr_languages.clone()));
        let handles = PipelineHandles {
            background: background_tx,
            ocr: Arc::clone(&ocr),
            renderer: ResponseRenderer::new(page.clone(), config.render),
            viewer,
            settings: Arc::clone(&settings),
            device_pixel_ratio: config.device_pixel_ratio,
        };

        let (tab, content_inbox) = request_channel(CHANNEL_CAPACITY);
        let (pointer, pointer_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let content_cancel = CancellationToken::new();
        let content = tokio::spawn(run_content(
            ContentScript::new(page.clone(), handles),
            ContentChannels {
                inbox: content_inbox,
                pointer: pointer_rx,
                outcomes: outcome_tx,
            },
            content_cancel.clone(),
        ));

        service.attach_tab(tab.clone());
        log_info!("snapask started (relay={})", config.relay_url);

        Ok(Self {
            settings,
            background,
            tab,
            pointer,
            outcomes,
            page,
            ocr,
            content,
            content_cancel,
            logger,
        })
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Waits for the OCR engine load the content task kicked off. A load that
    /// already failed reports its error again without reloading.
    pub async fn ocr_ready(&self) -> Result<()> {
        self.ocr.initialize().await
    }

    /// Fires a global keyboard command.
    pub async fn command(&self, name: &str) -> PipelineResult<Option<ContentResponse>> {
        self.background.service().on_command(name).await
    }

    /// Sends a message to the page the way the settings popup does.
    pub async fn send_to_tab(&self, request: ContentRequest) -> PipelineResult<ContentResponse> {
        self.tab.request(request).await
    }

    pub async fn pointer(&self, event: PointerEvent) -> PipelineResult<()> {
        self.pointer
            .send(event)
            .await
            .map_err(|_| PipelineError::Messaging("content script is gone".into()))
    }

    /// Next settled selection, in completion order.
    pub async fn next_outcome(&mut self) -> Option<PipelineResult<RenderOutcome>> {
        self.outcomes.recv().await
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.background.service().detach_tab();
        self.content_cancel.cancel();
        self.content
            .await
            .context("content script task failed to join")?;
        self.background.stop().await?;
        self.logger.abort();
        log_info!("snapask stopped");
        Ok(())
    }
}
