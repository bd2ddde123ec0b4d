use crate::gemini::GeminiInlineData;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

impl GeminiPart {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeminiPart::Text { text } => Some(text),
            GeminiPart::InlineData { .. } => None,
        }
    }
}
