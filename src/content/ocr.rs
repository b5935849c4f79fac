use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

use crate::error::{PipelineError, PipelineResult};
use crate::image_data::DataUrl;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// The two recognition languages, in engine notation (`eng+pol`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub primary: String,
    pub secondary: String,
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self {
            primary: "eng".into(),
            secondary: "pol".into(),
        }
    }
}

impl LanguagePair {
    pub fn parse(raw: &str) -> Option<Self> {
        let (primary, secondary) = raw.trim().split_once('+')?;
        if primary.is_empty() || secondary.is_empty() {
            return None;
        }
        Some(Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        })
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.primary, self.secondary)
    }
}

/// Black-box text recognizer. `load` runs once before any `recognize`.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn load(&self) -> Result<()>;
    async fn recognize(&self, png: &[u8], languages: &LanguagePair) -> Result<String>;
}

/// Gates recognition on engine readiness. Loading is single-shot: concurrent
/// `initialize` calls all await the same load, and a failed load stays failed.
pub struct OcrAdapter {
    engine: Arc<dyn OcrEngine>,
    languages: LanguagePair,
    loaded: OnceCell<Result<(), String>>,
}

impl OcrAdapter {
    pub fn new(engine: Arc<dyn OcrEngine>, languages: LanguagePair) -> Self {
        Self {
            engine,
            languages,
            loaded: OnceCell::new(),
        }
    }

    pub async fn initialize(&self) -> Result<()> {
        self.loaded
            .get_or_init(|| async {
                match self.engine.load().await {
                    Ok(()) => {
                        log_info!("OCR engine is ready for use ({})", self.languages);
                        Ok(())
                    }
                    Err(err) => {
                        log_error!("error loading OCR engine: {err:#}");
                        Err(format!("{err:#}"))
                    }
                }
            })
            .await
            .clone()
            .map_err(anyhow::Error::msg)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.loaded.get(), Some(Ok(())))
    }

    pub async fn recognize(&self, image: &DataUrl) -> PipelineResult<String> {
        if !self.is_ready() {
            return Err(PipelineError::EngineNotReady);
        }

        let png = image
            .decode()
            .map_err(|err| PipelineError::Ocr(format!("image payload is not base64: {err}")))?;
        let text = self
            .engine
            .recognize(&png, &self.languages)
            .await
            .map_err(|err| PipelineError::Ocr(format!("{err:#}")))?;

        Ok(text.trim().to_string())
    }
}

/// Drives the `tesseract` command line tool over stdin/stdout.
pub struct TesseractCli {
    binary: PathBuf,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn load(&self) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;
        if !output.status.success() {
            bail!("{} --version exited with {}", self.binary.display(), output.status);
        }
        Ok(())
    }

    async fn recognize(&self, png: &[u8], languages: &LanguagePair) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l"])
            .arg(languages.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.binary.display()))?;

        let mut stdin = child.stdin.take().context("tesseract stdin unavailable")?;
        let png = png.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&png).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .context("failed to wait for tesseract")?;
        writer
            .await
            .context("tesseract stdin writer join failed")?
            .context("failed to write image to tesseract")?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
