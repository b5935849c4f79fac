use thiserror::Error;

/// Terminal failure of one stage of a selection attempt.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("failed to crop the screenshot: {0}")]
    Crop(String),

    #[error("OCR engine is not loaded yet")]
    EngineNotReady,

    #[error("OCR recognition failed: {0}")]
    Ocr(String),

    #[error("no text provided for OCR processing")]
    MissingText,

    #[error("server responded with status {status}: {body}")]
    Server { status: u16, body: String },

    #[error("invalid response structure from server")]
    MalformedResponse,

    #[error("relay transport failed: {0}")]
    Transport(String),

    /// Relay failure as reported back across the message channel.
    #[error("relay failed: {0}")]
    Relay(String),

    #[error("message channel failed: {0}")]
    Messaging(String),

    /// The selection task died before reporting an outcome.
    #[error("selection task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Capture(_) => "capture",
            PipelineError::Crop(_) => "crop",
            PipelineError::EngineNotReady | PipelineError::Ocr(_) => "ocr",
            PipelineError::MissingText
            | PipelineError::Server { .. }
            | PipelineError::MalformedResponse
            | PipelineError::Transport(_)
            | PipelineError::Relay(_) => "relay",
            PipelineError::Messaging(_) => "messaging",
            PipelineError::Aborted(_) => "pipeline",
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
