pub mod app;
pub mod background;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod geometry;
pub mod image_data;
pub mod messaging;
pub mod settings;
pub mod utils;

#[cfg(test)]
mod testutil;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use app::App;
use background::FileCapturer;
use cli::Cli;
use config::AppConfig;
use content::{DirectoryViewer, PointerEvent, RenderOutcome, TesseractCli};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

pub async fn run(cli: Cli) -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let overrides = cli.settings_overrides();
    let mut config = AppConfig::from_env();
    if let Some(url) = cli.relay_url {
        config.relay_url = url;
    }
    if let Some(path) = cli.settings {
        config.settings_path = path;
    }
    if let Some(dpr) = cli.dpr {
        config.device_pixel_ratio = dpr;
    }

    let view_dir = cli
        .view_dir
        .unwrap_or_else(|| std::env::temp_dir().join("snapask"));

    let mut app = App::start(
        config,
        Arc::new(FileCapturer::new(cli.frame)),
        Arc::new(TesseractCli::default()),
        Arc::new(DirectoryViewer::new(view_dir)),
    )?;

    if !overrides.is_empty() {
        app.settings().update(|settings| overrides.apply(settings))?;
    }

    app.ocr_ready()
        .await
        .context("OCR engine failed to load")?;

    app.command("start-ocr-selection").await?;
    for event in [
        PointerEvent::down(cli.from.x, cli.from.y),
        PointerEvent::moved(cli.to.x, cli.to.y),
        PointerEvent::up(cli.to.x, cli.to.y),
    ] {
        app.pointer(event).await?;
    }

    let outcome = app
        .next_outcome()
        .await
        .ok_or_else(|| anyhow!("content script exited before the selection settled"))?;

    let result = match outcome {
        Ok(RenderOutcome::Shown(id)) => {
            println!("{}", app.page().text_content(id).unwrap_or_default());
            Ok(())
        }
        Ok(RenderOutcome::Skipped) => {
            crate::log_warn!("an answer is already on screen; new answer skipped");
            Ok(())
        }
        Err(err) => Err(anyhow!("selection failed during {}: {err}", err.stage())),
    };

    app.shutdown().await?;
    result
}
