//! Shared fakes for pipeline tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::sync::mpsc;

use crate::background::ScreenCapturer;
use crate::content::ocr::{LanguagePair, OcrEngine};
use crate::content::view::Viewer;
use crate::image_data::DataUrl;

static STEALTH_FLAG: Mutex<()> = Mutex::new(());

/// Serializes tests that set the process-wide stealth flag.
pub fn stealth_flag_lock() -> MutexGuard<'static, ()> {
    STEALTH_FLAG
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test frame");
    out.into_inner()
}

pub struct StaticFrame(pub Vec<u8>);

#[async_trait]
impl ScreenCapturer for StaticFrame {
    async fn capture_visible_tab(&self) -> Result<Vec<u8>> {
        if self.0.is_empty() {
            anyhow::bail!("tab capture is not permitted");
        }
        Ok(self.0.clone())
    }
}

/// Returns a fixed text and remembers the dimensions of every image it saw.
pub struct ScriptedEngine {
    text: String,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedEngine {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn recognize(&self, png: &[u8], _languages: &LanguagePair) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let img = image::load_from_memory(png)?;
        self.seen
            .lock()
            .expect("seen lock")
            .push((img.width(), img.height()));
        Ok(self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    Text(String),
    Image,
}

pub struct RecordingViewer {
    tx: mpsc::UnboundedSender<Opened>,
}

impl RecordingViewer {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Opened>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Viewer for RecordingViewer {
    async fn open_text(&self, text: &str) -> Result<()> {
        let _ = self.tx.send(Opened::Text(text.to_string()));
        Ok(())
    }

    async fn open_image(&self, _image: &DataUrl) -> Result<()> {
        let _ = self.tx.send(Opened::Image);
        Ok(())
    }
}
