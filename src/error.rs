//! Error taxonomy for the document Q&A pipeline.
//!
//! Every failure the pipeline can surface to a user falls into one of these
//! variants. The CLI wraps them in `anyhow` at the top level; the chat HTTP
//! server maps them onto its JSON error envelope (see [`crate::server`]).

/// Errors produced by loading, indexing and answering.
#[derive(Debug, thiserror::Error)]
pub enum DocqaError {
    /// Missing credential or invalid configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The uploaded file could not be read or parsed as a PDF.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// The embedding or completion provider failed (network, status, payload).
    #[error("provider error: {0}")]
    Provider(String),

    /// A question was asked before a document finished indexing.
    #[error("no document has been indexed yet")]
    NotReady,

    /// A second document was uploaded without resetting the session.
    #[error("a document is already indexed; reset the session to load another")]
    AlreadyIndexed,

    /// The request itself was malformed (e.g. an empty question).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DocqaError {
    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DocqaError::Config(_) => "config_error",
            DocqaError::Ingestion(_) => "ingestion_failed",
            DocqaError::Provider(_) => "provider_error",
            DocqaError::NotReady => "not_ready",
            DocqaError::AlreadyIndexed => "already_indexed",
            DocqaError::InvalidInput(_) => "bad_request",
        }
    }
}

impl From<reqwest::Error> for DocqaError {
    fn from(e: reqwest::Error) -> Self {
        DocqaError::Provider(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DocqaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DocqaError::NotReady.code(), "not_ready");
        assert_eq!(DocqaError::Ingestion("x".into()).code(), "ingestion_failed");
        assert_eq!(DocqaError::InvalidInput("x".into()).code(), "bad_request");
    }

    #[test]
    fn display_includes_detail() {
        let e = DocqaError::Provider("HTTP 429".into());
        assert_eq!(e.to_string(), "provider error: HTTP 429");
    }
}
