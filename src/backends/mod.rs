//! Metadata backend abstractions and concrete implementations.

pub mod mediawiki;

use std::fmt;

/// Failed metadata request, with whatever body the server returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub message: String,
    pub partial_body: Option<String>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial_body: None,
        }
    }

    pub fn with_body(message: impl Into<String>, body: Option<String>) -> Self {
        Self {
            message: message.into(),
            partial_body: body,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

/// Interface implemented by image metadata sources.
pub trait ImageInfoBackend {
    /// Requests url, size and mime metadata for up to one chunk of titles and
    /// returns the raw response body.
    fn query_image_info(&self, titles: &[&str]) -> Result<String, BackendError>;
}
