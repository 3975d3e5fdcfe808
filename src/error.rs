//! Error taxonomy shared by every module of the engine.
//!
//! Loading, uploading and drawing all report through [`RenderError`]. Nothing
//! in the core retries or swallows an error; callers decide what is fatal.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// A mesh or texture file does not exist in the asset directory.
    #[error("asset not found: {}", path.display())]
    AssetNotFound { path: PathBuf },
    /// A mesh record could not be parsed. `line` is 1-based.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// Raw geometry arrays disagree with the declared vertex/index counts.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Shading coefficients outside their valid range.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),
    /// The graphics backend refused to allocate, upload or present.
    #[error("resource error: {0}")]
    Resource(String),
    /// A released mesh or texture handle was submitted or drawn.
    #[error("use after free: {0}")]
    UseAfterFree(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
