use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::image_data::DataUrl;

use super::page::escape_html;

/// Opens content in a new, isolated view next to the page.
#[async_trait]
pub trait Viewer: Send + Sync {
    async fn open_text(&self, text: &str) -> Result<()>;
    async fn open_image(&self, image: &DataUrl) -> Result<()>;
}

/// Writes each view as a standalone HTML document into a directory.
pub struct DirectoryViewer {
    dir: PathBuf,
}

impl DirectoryViewer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn next_path(&self, kind: &str) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let suffix = Uuid::new_v4().simple().to_string();
        self.dir
            .join(format!("{kind}-{stamp}-{}.html", &suffix[..8]))
    }

    async fn write(&self, path: &Path, document: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        tokio::fs::write(path, document)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

pub fn text_document(text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head><title>OCR Result</title></head>\n  <body style=\"margin:20px; font-family: sans-serif;\">\n    <h1>Extracted Text</h1>\n    <pre style=\"white-space: pre-wrap;\">{}</pre>\n  </body>\n</html>\n",
        escape_html(text)
    )
}

pub fn image_document(image: &DataUrl) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n  <head><title>Screenshot</title></head>\n  <body style=\"margin:0;\">\n    <img src=\"{}\" alt=\"Cropped Screenshot\" style=\"max-width:100%; height:auto;\" />\n  </body>\n</html>\n",
        escape_html(image.as_str())
    )
}

#[async_trait]
impl Viewer for DirectoryViewer {
    async fn open_text(&self, text: &str) -> Result<()> {
        let path = self.next_path("ocr-text");
        self.write(&path, text_document(text)).await
    }

    async fn open_image(&self, image: &DataUrl) -> Result<()> {
        let path = self.next_path("screenshot");
        self.write(&path, image_document(image)).await
    }
}
