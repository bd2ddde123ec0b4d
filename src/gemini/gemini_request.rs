use crate::gemini::{GeminiContent, GeminiGenerationConfig, GeminiInlineData, GeminiPart};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

impl GeminiRequest {
    /// One user turn: the inline image followed by the instruction text,
    /// which is the part order the transcription contract expects.
    pub fn single_turn(
        inline_data: GeminiInlineData,
        instruction: &str,
        generation_config: GeminiGenerationConfig,
    ) -> Self {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: None,
                parts: vec![
                    GeminiPart::InlineData { inline_data },
                    GeminiPart::Text {
                        text: instruction.to_string(),
                    },
                ],
            }],
            generation_config,
        }
    }
}
