use serde::{Deserialize, Serialize};

/// Base64 image bytes embedded directly in the request body. The
/// generateContent endpoint accepts the snake_case field names used here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiInlineData {
    pub mime_type: String,
    pub data: String,
}
