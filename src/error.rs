use thiserror::Error;

/// Backend API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

/// Gemini API errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from Gemini: {0}")]
    InvalidResponse(String),

    #[error("Gemini error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Gemini request timed out")]
    Timeout,
}
