//! JSON-shaped action messages exchanged between the settings panel, the
//! background service and the page.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Messages delivered to the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ContentRequest {
    #[serde(rename_all = "camelCase")]
    StartOcrSelection {
        #[serde(default)]
        open_screenshot: bool,
        #[serde(default)]
        open_ocr_text: bool,
        #[serde(default)]
        stealth_mode: bool,
    },
    CheckTesseractReady,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentResponse {
    Status {
        status: String,
    },
    Ready {
        #[serde(rename = "tesseractReady")]
        tesseract_ready: bool,
    },
}

/// Messages delivered to the privileged background service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum BackgroundRequest {
    #[serde(rename_all = "camelCase")]
    SelectionComplete {
        coords: Rect,
        #[serde(default)]
        stealth_mode: bool,
    },
    #[serde(rename_all = "camelCase")]
    SendOcrText {
        text: String,
        #[serde(default)]
        stealth_mode: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundResponse {
    #[serde(rename_all = "camelCase")]
    Screenshot { screenshot_base64: String },
    #[serde(rename_all = "camelCase")]
    Answer { answer: String, stealth_mode: bool },
    Error { error: String },
}

impl BackgroundResponse {
    pub fn error(message: impl ToString) -> Self {
        BackgroundResponse::Error {
            error: message.to_string(),
        }
    }
}
