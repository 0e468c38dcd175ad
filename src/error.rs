//! Error taxonomy for the content and stats layers

use thiserror::Error;

/// Errors surfaced by the post repository and render pipeline.
///
/// Stats store failures never appear here: reads fail open and writes
/// are logged and swallowed inside [`crate::stats::StatsStore`].
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("invalid slug '{0}': only lowercase letters, numbers, and hyphens are allowed")]
    InvalidSlug(String),

    #[error("a post with slug '{0}' already exists")]
    Conflict(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed post '{slug}': {reason}")]
    Malformed { slug: String, reason: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Markup conversion failure
#[derive(Error, Debug)]
#[error("failed to render markup: {0}")]
pub struct RenderError(pub String);

pub type BlogResult<T> = std::result::Result<T, BlogError>;
