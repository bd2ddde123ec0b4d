use thiserror::Error;

/// Everything that can go wrong between "user typed a key" and "transcription
/// printed". All variants are terminal for the current attempt; nothing is
/// retried automatically.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API key is empty — paste the full key first")]
    EmptyKey,

    #[error("API key is too short — paste the complete key")]
    KeyTooShort,

    #[error("no API key saved — run `handscribe set-key` first")]
    MissingCredential,

    #[error("no image supplied")]
    MissingImage,

    #[error("the API key was rejected: {0}")]
    InvalidCredential(String),

    #[error("quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("the model returned no text — the image may contain no legible writing")]
    EmptyTranscription,

    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Server(String),

    #[error("a conversion is already in progress")]
    Busy,
}

impl ClientError {
    /// Contextual hint rendered under the error message. Only the two
    /// credential-related outcomes carry one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ClientError::InvalidCredential(_) => Some(
                "Create a fresh key at https://aistudio.google.com/apikey and paste the whole thing.",
            ),
            ClientError::QuotaExceeded(_) => {
                Some("The free-tier quota resets daily — wait and try again.")
            }
            _ => None,
        }
    }
}
