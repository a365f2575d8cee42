//! Result and error types for Rotular.

use thiserror::Error;

/// Result type for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

/// Run-level errors. These abort the audit (after session cleanup);
/// per-element degradation is modeled by [`SkipReason`] instead.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page script evaluation error
    #[error("Page evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Session already closed or never opened
    #[error("Invalid session state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single live element was dropped from the snapshot.
///
/// A skip never aborts the page scan: the element is recorded and the
/// remaining elements continue through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The element has no path to the document body (detached node)
    #[error("element unreachable from document body")]
    LocatorUnreachable,

    /// Attribute reads failed wholesale (stale element, reloading page)
    #[error("attribute read failed: {message}")]
    ExtractionFailed {
        /// Error message reported from page context
        message: String,
    },
}
