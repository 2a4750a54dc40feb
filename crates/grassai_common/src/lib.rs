//! grassai_common - shared library for the grassai GRASS GIS assistant
//!
//! Everything the CLI needs that is not terminal plumbing: the Ollama
//! client, GRASS session probing, prompt assembly, suggested-command
//! extraction and execution, session storage, configuration and errors.

pub mod config;
pub mod error;
pub mod exec;
pub mod extract;
pub mod grass;
pub mod ollama;
pub mod prompt;
pub mod session;

pub use error::{GrassAiError, Result};
