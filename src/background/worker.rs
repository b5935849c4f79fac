use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::messaging::{BackgroundRequest, BackgroundResponse, Envelope};

use super::BackgroundService;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub type BackgroundInbox = mpsc::Receiver<Envelope<BackgroundRequest, BackgroundResponse>>;

/// Serves background requests until cancelled or until every sender is gone.
/// Each request is answered on its own task so a slow relay never holds up a
/// capture.
pub async fn background_loop(
    service: Arc<BackgroundService>,
    mut inbox: BackgroundInbox,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            envelope = inbox.recv() => {
                let Some(envelope) = envelope else {
                    log_info!("background inbox closed");
                    break;
                };
                let (request, responder) = envelope.into_parts();
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    responder.send(service.handle(request).await);
                });
            }
            _ = cancel_token.cancelled() => {
                log_info!("background service shutting down");
                break;
            }
        }
    }
}
