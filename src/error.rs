//! Error types for the captext library.

use thiserror::Error;

/// Main error type for the captext library.
#[derive(Error, Debug)]
pub enum CaptextError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] rquest::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error
    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// Text recognition error
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// Invalid response from server
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for captext operations.
pub type Result<T> = std::result::Result<T, CaptextError>;
