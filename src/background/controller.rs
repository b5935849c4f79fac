use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::worker::{background_loop, BackgroundInbox};
use super::BackgroundService;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Owns the lifetime of the background service task.
pub struct BackgroundController {
    service: Arc<BackgroundService>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl BackgroundController {
    pub fn new(service: Arc<BackgroundService>) -> Self {
        Self {
            service,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn service(&self) -> &Arc<BackgroundService> {
        &self.service
    }

    pub fn start(&mut self, inbox: BackgroundInbox) -> Result<()> {
        if self.handle.is_some() {
            bail!("background service already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(background_loop(
            Arc::clone(&self.service),
            inbox,
            cancel_token.clone(),
        ));

        log_info!("background service started");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("background service task failed to join")
        } else {
            Ok(())
        }
    }
}
