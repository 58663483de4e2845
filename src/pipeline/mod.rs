//! Pipeline stages for one file conversion.
//!
//! Each submodule implements one local concern of the orchestration in
//! [`crate::Client::convert`]; the network calls themselves live behind
//! [`crate::service::ConversionService`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ request slot ──▶ upload ──▶ confirm ──▶ poll ──▶ download ──▶ output
//! (stat)     (API)           (PUT)      (API)       (API)    (GET)        (atomic write)
//! ```
//!
//! 1. [`input`]: validate the local file before anything touches the network
//! 2. [`poll`]: bounded status loop with terminal-state detection
//! 3. [`output`]: default output path and atomic write of the result

pub mod input;
pub mod output;
pub mod poll;

use crate::error::ConvertorioError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race `fut` against `cancel`; cancellation wins ties.
pub(crate) async fn cancellable<T, F>(
    cancel: &CancellationToken,
    job_id: Option<&str>,
    fut: F,
) -> Result<T, ConvertorioError>
where
    F: Future<Output = Result<T, ConvertorioError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConvertorioError::Cancelled {
            job_id: job_id.map(str::to_string),
        }),
        result = fut => result,
    }
}
