//! Error types for the convertorio library.
//!
//! Every fallible operation returns [`ConvertorioError`]. The variants fall
//! into the families callers usually branch on:
//!
//! * **Validation**: the request or configuration was rejected locally,
//!   before anything touched the network ([`ConvertorioError::is_validation`]).
//! * **Input**: the source file is missing or unreadable.
//! * **Transport**: an HTTP call failed or the server answered with a
//!   non-success status ([`ConvertorioError::is_transport`]).
//! * **Job outcome**: the server reported the job as failed, or it never
//!   reached a terminal state within the polling budget.
//! * **Local I/O**: writing the converted file failed.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the convertorio library.
#[derive(Debug, Error)]
pub enum ConvertorioError {
    // ── Validation errors ────────────────────────────────────────────────
    /// Client configuration failed validation (missing API key etc.).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A conversion request or option failed validation.
    #[error("Invalid request: {0}")]
    Validation(String),

    // ── Input errors ─────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is a regular file.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the input file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Transport errors ─────────────────────────────────────────────────
    /// The server answered with a non-success HTTP status.
    #[error("API error from {endpoint} (status {status}): {body}")]
    Api {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("HTTP request to {endpoint} failed: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The response arrived but could not be interpreted.
    #[error("Invalid response from {endpoint}: {detail}")]
    InvalidResponse {
        endpoint: &'static str,
        detail: String,
    },

    // ── Job outcome errors ───────────────────────────────────────────────
    /// The server reported the job as failed.
    #[error("Conversion failed for job {job_id}: {message}")]
    ConversionFailed { job_id: String, message: String },

    /// The job did not reach a terminal state within the polling budget.
    #[error("Conversion timeout: job {job_id} not finished after {attempts} attempts")]
    ConversionTimeout { job_id: String, attempts: u32 },

    /// The caller cancelled the conversion.
    #[error(
        "Conversion cancelled{}",
        .job_id.as_deref().map(|id| format!(" (job {id})")).unwrap_or_default()
    )]
    Cancelled { job_id: Option<String> },

    // ── I/O errors ───────────────────────────────────────────────────────
    /// Local read, write or directory creation failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertorioError {
    /// True for errors raised before any network call because the
    /// configuration or request was invalid.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Validation(_))
    }

    /// True for HTTP-level failures: no response, non-2xx, or undecodable body.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Network { .. } | Self::InvalidResponse { .. }
        )
    }

    /// HTTP status carried by an [`Api`](Self::Api) error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
