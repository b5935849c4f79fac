use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, PipelineResult};
use crate::messaging::{ContentRequest, ContentResponse, Envelope};

use super::overlay;
use super::page::{Page, PointerEvent};
use super::pipeline::{PipelineHandles, SelectionTask};
use super::render::RenderOutcome;
use super::state::{SelectionFlags, SessionState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub type ContentInbox = mpsc::Receiver<Envelope<ContentRequest, ContentResponse>>;

/// The page side: owns the document, the session state and the handles each
/// selection takes with it.
pub struct ContentScript {
    page: Page,
    state: SessionState,
    handles: PipelineHandles,
}

impl ContentScript {
    pub fn new(page: Page, handles: PipelineHandles) -> Self {
        Self {
            page,
            state: SessionState::new(),
            handles,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle_message(&mut self, request: ContentRequest) -> ContentResponse {
        match request {
            ContentRequest::StartOcrSelection {
                open_screenshot,
                open_ocr_text,
                stealth_mode,
            } => {
                log_info!("starting OCR selection");
                let flags = SelectionFlags {
                    open_screenshot,
                    open_ocr_text,
                    stealth_mode,
                };
                overlay::arm(&self.page, &mut self.state, flags);
                ContentResponse::Status {
                    status: "Selection overlay started.".into(),
                }
            }
            ContentRequest::CheckTesseractReady => {
                self.state.ocr_ready = self.handles.ocr.is_ready();
                ContentResponse::Ready {
                    tesseract_ready: self.state.ocr_ready,
                }
            }
        }
    }

    /// Returns the pipeline task when the event finalizes a selection.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<SelectionTask> {
        overlay::handle_pointer(&self.page, &mut self.state, event)
            .map(|selection| SelectionTask::new(selection, self.handles.clone()))
    }

    pub fn settle(&mut self) {
        self.state.settle();
    }

    pub fn mark_ocr_ready(&mut self, ready: bool) {
        self.state.ocr_ready = ready;
    }
}

pub struct ContentChannels {
    pub inbox: ContentInbox,
    pub pointer: mpsc::Receiver<PointerEvent>,
    pub outcomes: mpsc::UnboundedSender<PipelineResult<RenderOutcome>>,
}

/// Page event loop. Loads the OCR engine, answers messages, feeds pointer
/// events to the overlay and runs finalized selections. A new selection may
/// be armed while an earlier one is still in flight.
pub async fn run_content(
    mut script: ContentScript,
    channels: ContentChannels,
    cancel_token: CancellationToken,
) {
    let ContentChannels {
        mut inbox,
        mut pointer,
        outcomes,
    } = channels;

    let ocr = Arc::clone(&script.handles.ocr);
    let engine_load = async move { ocr.initialize().await.is_ok() };
    tokio::pin!(engine_load);
    let mut loading = true;

    let mut in_flight = JoinSet::new();
    let mut inbox_open = true;
    let mut pointer_open = true;

    loop {
        tokio::select! {
            ready = &mut engine_load, if loading => {
                loading = false;
                script.mark_ocr_ready(ready);
            }
            envelope = inbox.recv(), if inbox_open => {
                match envelope {
                    Some(envelope) => {
                        let (request, responder) = envelope.into_parts();
                        responder.send(script.handle_message(request));
                    }
                    None => inbox_open = false,
                }
            }
            event = pointer.recv(), if pointer_open => {
                match event {
                    Some(event) => {
                        if let Some(task) = script.handle_pointer(event) {
                            log_info!("selection {} finalized", task.attempt());
                            in_flight.spawn(task.run());
                        }
                    }
                    None => pointer_open = false,
                }
            }
            Some(joined) = in_flight.join_next() => {
                script.settle();
                let outcome = joined.unwrap_or_else(|err| {
                    log_error!("selection task failed to join: {err}");
                    Err(PipelineError::Aborted(err.to_string()))
                });
                let _ = outcomes.send(outcome);
            }
            _ = cancel_token.cancelled() => {
                log_info!("content script shutting down");
                break;
            }
        }

        if !inbox_open && !pointer_open && in_flight.is_empty() && !loading {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::{BackgroundController, BackgroundService, CaptureService, RelayClient};
    use crate::config::RenderTiming;
    use crate::content::ocr::{LanguagePair, OcrAdapter, OcrEngine};
    use crate::content::overlay::{SELECTION_OVERLAY_ID, SELECTION_RECT_ID};
    use crate::content::render::{ResponseRenderer, RESPONSE_OVERLAY_ID};
    use crate::content::state::SelectionPhase;
    use crate::messaging::{request_channel, RequestSender};
    use crate::settings::{Settings, SettingsStore};
    use crate::testutil::{gradient_png, RecordingViewer, ScriptedEngine, StaticFrame};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::task::JoinHandle;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct PanickingEngine;

    #[async_trait]
    impl OcrEngine for PanickingEngine {
        async fn load(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn recognize(&self, _png: &[u8], _languages: &LanguagePair) -> anyhow::Result<String> {
            panic!("recognizer crashed");
        }
    }

    fn script_with(
        relay_url: &str,
        engine: Arc<dyn OcrEngine>,
    ) -> (ContentScript, BackgroundController) {
        let settings = Arc::new(SettingsStore::in_memory(Settings::default()));
        let service = BackgroundService::new(
            CaptureService::new(Arc::new(StaticFrame(gradient_png(640, 480)))),
            RelayClient::new(relay_url).unwrap(),
            Arc::clone(&settings),
        );
        let mut controller = BackgroundController::new(Arc::new(service));
        let (background, inbox) = request_channel(8);
        controller.start(inbox).unwrap();

        let page = Page::new();
        let (viewer, _opened) = RecordingViewer::new();
        let handles = PipelineHandles {
            background,
            ocr: Arc::new(OcrAdapter::new(engine, LanguagePair::default())),
            renderer: ResponseRenderer::new(page.clone(), RenderTiming::default()),
            viewer,
            settings,
            device_pixel_ratio: 1.0,
        };
        (ContentScript::new(page, handles), controller)
    }

    fn script(relay_url: &str) -> (ContentScript, BackgroundController) {
        script_with(relay_url, ScriptedEngine::new("2+2 = ? A) 4 B) 5"))
    }

    struct Running {
        tab: RequestSender<ContentRequest, ContentResponse>,
        pointer: mpsc::Sender<PointerEvent>,
        outcomes: mpsc::UnboundedReceiver<PipelineResult<RenderOutcome>>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    }

    impl Running {
        async fn wait_until_ready(&self) {
            for _ in 0..100 {
                let response = self
                    .tab
                    .request(ContentRequest::CheckTesseractReady)
                    .await
                    .unwrap();
                if response == (ContentResponse::Ready { tesseract_ready: true }) {
                    return;
                }
                tokio::task::yield_now().await;
            }
            panic!("OCR engine never became ready");
        }

        async fn drag(&self, from: (f64, f64), to: (f64, f64)) {
            for event in [
                PointerEvent::down(from.0, from.1),
                PointerEvent::moved(to.0, to.1),
                PointerEvent::up(to.0, to.1),
            ] {
                self.pointer.send(event).await.unwrap();
            }
        }

        async fn stop(self) {
            self.cancel.cancel();
            self.task.await.unwrap();
        }
    }

    fn spawn_loop(script: ContentScript) -> Running {
        let (tab, inbox) = request_channel(8);
        let (pointer, pointer_rx) = mpsc::channel(16);
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_content(
            script,
            ContentChannels {
                inbox,
                pointer: pointer_rx,
                outcomes: outcome_tx,
            },
            cancel.clone(),
        ));
        Running {
            tab,
            pointer,
            outcomes,
            cancel,
            task,
        }
    }

    fn start() -> ContentRequest {
        ContentRequest::StartOcrSelection {
            open_screenshot: false,
            open_ocr_text: false,
            stealth_mode: false,
        }
    }

    #[tokio::test]
    async fn starting_twice_leaves_exactly_one_overlay() {
        let (mut script, mut controller) = script("http://localhost:9005");

        script.handle_message(start());
        script.handle_pointer(PointerEvent::down(10.0, 10.0));
        script.handle_pointer(PointerEvent::moved(40.0, 40.0));
        let response = script.handle_message(start());

        assert_eq!(
            response,
            ContentResponse::Status {
                status: "Selection overlay started.".into()
            }
        );
        assert_eq!(script.page().count_by_dom_id(SELECTION_OVERLAY_ID), 1);
        assert_eq!(script.page().count_by_dom_id(SELECTION_RECT_ID), 0);
        assert_eq!(script.state().phase, SelectionPhase::Armed);
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn readiness_reflects_the_engine() {
        let (mut script, mut controller) = script("http://localhost:9005");
        assert_eq!(
            script.handle_message(ContentRequest::CheckTesseractReady),
            ContentResponse::Ready {
                tesseract_ready: false
            }
        );

        script.handles.ocr.initialize().await.unwrap();
        assert_eq!(
            script.handle_message(ContentRequest::CheckTesseractReady),
            ContentResponse::Ready {
                tesseract_ready: true
            }
        );
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn event_loop_runs_a_selection_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "A"})))
            .expect(1)
            .mount(&server)
            .await;

        let (script, mut controller) = script(&server.uri());
        let page = script.page().clone();
        let mut running = spawn_loop(script);
        running.wait_until_ready().await;

        running.tab.request(start()).await.unwrap();
        running.drag((20.0, 30.0), (120.0, 90.0)).await;

        let outcome = running.outcomes.recv().await.unwrap().unwrap();
        let RenderOutcome::Shown(id) = outcome else {
            panic!("expected a rendered answer");
        };
        assert_eq!(page.text_content(id).as_deref(), Some("A"));
        assert_eq!(page.count_by_dom_id(RESPONSE_OVERLAY_ID), 1);
        assert_eq!(page.count_by_dom_id(SELECTION_OVERLAY_ID), 0);

        running.stop().await;
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn oversized_selection_settles_with_a_crop_error() {
        let (script, mut controller) = script("http://localhost:9005");
        let mut running = spawn_loop(script);
        running.wait_until_ready().await;

        running.tab.request(start()).await.unwrap();
        running.drag((0.0, 0.0), (5e9, 5e9)).await;

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            running.outcomes.recv(),
        )
        .await
        .expect("selection never settled")
        .unwrap();
        assert!(matches!(outcome, Err(PipelineError::Crop(_))));

        running.stop().await;
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn crashed_selection_task_still_reports_an_outcome() {
        let (script, mut controller) = script_with("http://localhost:9005", Arc::new(PanickingEngine));
        let mut running = spawn_loop(script);
        running.wait_until_ready().await;

        running.tab.request(start()).await.unwrap();
        running.drag((10.0, 10.0), (60.0, 40.0)).await;

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            running.outcomes.recv(),
        )
        .await
        .expect("selection never settled")
        .unwrap();
        match outcome {
            Err(err @ PipelineError::Aborted(_)) => assert_eq!(err.stage(), "pipeline"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        running.stop().await;
        controller.stop().await.unwrap();
    }
}
