use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagenError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cannot reach Gemini at {0}: {1}")]
    Connection(String, String),

    #[error("Gemini returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("could not allocate a unique name for {base} after {attempts} attempts")]
    NamingExhausted { base: String, attempts: usize },

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("post-processing stage '{stage}' failed: {message}")]
    PostProcess { stage: String, message: String },
}

pub type Result<T> = std::result::Result<T, ImagenError>;
