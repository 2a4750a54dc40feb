//! Error types for grassai.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrassAiError {
    #[error("Not running inside a GRASS GIS session. Start GRASS with: grass --text")]
    NotInGrassSession,

    #[error("Environment probe failed: {0}")]
    Probe(String),

    #[error("Empty query - give me a question or task to work on")]
    EmptyQuery,

    #[error("Cannot reach the Ollama service at {0}. Start it with: ollama serve")]
    ServiceUnavailable(String),

    #[error("Model '{0}' is not available. Pull it with: ollama pull {0}")]
    ModelNotFound(String),

    #[error("Request to the inference service timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GrassAiError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            GrassAiError::NotInGrassSession => 2,
            GrassAiError::Probe(_) => 2,
            GrassAiError::EmptyQuery => 2,
            GrassAiError::ServiceUnavailable(_) => 3,
            GrassAiError::ModelNotFound(_) => 4,
            GrassAiError::Timeout => 5,
            GrassAiError::CommandFailed { code, .. } => {
                if *code > 0 {
                    *code
                } else {
                    1
                }
            }
            GrassAiError::Http(_)
            | GrassAiError::Parse(_)
            | GrassAiError::Io(_)
            | GrassAiError::Json(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, GrassAiError>;
