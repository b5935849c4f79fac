use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{PipelineError, PipelineResult};

const PNG_PREFIX: &str = "data:image/png;base64,";

/// An encoded image carried as a data URL, the form screenshots travel in
/// between contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(String);

impl DataUrl {
    pub fn from_png(bytes: &[u8]) -> Self {
        Self(format!("{PNG_PREFIX}{}", STANDARD.encode(bytes)))
    }

    /// Accepts any `data:<mime>;base64,<payload>` string.
    pub fn parse(raw: impl Into<String>) -> PipelineResult<Self> {
        let raw = raw.into();
        if !raw.starts_with("data:") || !raw.contains(";base64,") {
            return Err(PipelineError::Messaging(
                "screenshot is not a base64 data URL".into(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decodes the payload back into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let payload = self
            .0
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .unwrap_or_default();
        STANDARD.decode(payload)
    }
}
