//! The conversion orchestration: upload, confirm, poll, download.
//!
//! [`Client::convert`] runs the five service calls in a fixed order and
//! never skips or reorders them. Local validation happens first and is
//! returned silently; from the `start` event on, every outcome is reported
//! exactly once, either as `complete` or as `error`, and then returned.

use crate::client::Client;
use crate::error::ConvertorioError;
use crate::events::{
    CompleteEvent, ConversionEvent, ErrorEvent, ProgressEvent, ProgressStep, StartEvent,
};
use crate::models::ConversionResult;
use crate::options::ConversionRequest;
use crate::pipeline::{cancellable, input, output, poll};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl Client {
    /// Convert a local file and write the result to disk.
    ///
    /// # Errors
    /// - Validation / `FileNotFound` / `PermissionDenied`: before `start`, no
    ///   network call made, no event emitted.
    /// - Anything else: after `start`; mirrored through the `error` event.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConvertorioError> {
        self.convert_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// [`Client::convert`] that stops with [`ConvertorioError::Cancelled`]
    /// as soon as `cancel` fires, including mid-request and mid-sleep.
    pub async fn convert_with_cancel(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionResult, ConvertorioError> {
        request.validate()?;
        let resolved = input::resolve_input(request.input_path()).await?;

        let total_start = Instant::now();
        info!(
            "Starting conversion: {} → {}",
            resolved.path.display(),
            request.target_format()
        );
        self.events.emit(&ConversionEvent::Start(StartEvent {
            file_name: resolved.file_name.clone(),
            source_format: resolved.source_format.clone(),
            target_format: request.target_format().to_string(),
            file_size: resolved.size,
        }));

        let mut job_id: Option<String> = None;
        match self.run(request, &resolved, cancel, &mut job_id).await {
            Ok(result) => {
                info!(
                    job_id = %result.job_id,
                    "Conversion complete: {} ({} bytes, {}ms total)",
                    result.output_path.display(),
                    result.file_size,
                    total_start.elapsed().as_millis()
                );
                self.events.emit(&ConversionEvent::Complete(CompleteEvent {
                    job_id: result.job_id.clone(),
                    output_path: result.output_path.clone(),
                    processing_time_ms: result.processing_time_ms,
                    file_size: result.file_size,
                }));
                Ok(result)
            }
            Err(e) => {
                warn!(job_id = ?job_id, "Conversion failed: {}", e);
                self.events.emit(&ConversionEvent::Error(ErrorEvent {
                    message: e.to_string(),
                    job_id,
                    input_path: request.input_path().to_path_buf(),
                    target_format: request.target_format().to_string(),
                }));
                Err(e)
            }
        }
    }

    /// Synchronous wrapper around [`Client::convert`].
    ///
    /// Creates a temporary tokio runtime internally; must not be called from
    /// inside an async context.
    pub fn convert_blocking(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ConvertorioError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConvertorioError::io("<tokio runtime>", e))?
            .block_on(self.convert(request))
    }

    /// Steps after `start`. `job_id` is filled in as soon as the server
    /// assigns one so the error event can carry it.
    async fn run(
        &self,
        request: &ConversionRequest,
        resolved: &input::ResolvedInput,
        cancel: &CancellationToken,
        job_id: &mut Option<String>,
    ) -> Result<ConversionResult, ConvertorioError> {
        let service = self.service.as_ref();

        // ── Step 1: Request upload slot ──────────────────────────────────────
        self.progress(ProgressStep::RequestingUploadUrl, None);
        let metadata = request.conversion_options().to_metadata();
        let slot = cancellable(
            cancel,
            None,
            service.request_upload_slot(
                &resolved.file_name,
                request.target_format(),
                metadata.as_ref(),
            ),
        )
        .await?;
        let id = slot.job_id.clone();
        *job_id = Some(id.clone());
        debug!(job_id = %id, "Upload slot obtained");

        // ── Step 2: Upload bytes to storage ──────────────────────────────────
        self.progress(ProgressStep::Uploading, Some(&id));
        let bytes = resolved.read().await?;
        cancellable(
            cancel,
            Some(&id),
            service.upload_bytes(&slot.upload_url, bytes),
        )
        .await?;

        // ── Step 3: Confirm upload ───────────────────────────────────────────
        self.progress(ProgressStep::Confirming, Some(&id));
        cancellable(cancel, Some(&id), service.confirm_upload(&id)).await?;

        // ── Step 4: Poll until terminal ──────────────────────────────────────
        self.progress(ProgressStep::Converting, Some(&id));
        let job = poll::wait_for_job(service, &id, self.poll_policy(), &self.events, cancel).await?;
        let download_url = job
            .download_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConvertorioError::InvalidResponse {
                endpoint: "/api/jobs",
                detail: format!("job {id} completed without a download_url"),
            })?;

        // ── Step 5: Download and persist ─────────────────────────────────────
        self.progress(ProgressStep::Downloading, Some(&id));
        let output_path: PathBuf = request
            .explicit_output_path()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                output::default_output_path(request.input_path(), request.target_format())
            });
        let data = cancellable(cancel, Some(&id), service.download(&download_url)).await?;
        let file_size = output::write_output(&output_path, &data).await?;

        Ok(ConversionResult {
            job_id: id,
            input_path: request.input_path().to_path_buf(),
            output_path,
            source_format: job
                .source_format
                .clone()
                .unwrap_or_else(|| resolved.source_format.clone()),
            target_format: job
                .target_format
                .clone()
                .unwrap_or_else(|| request.target_format().to_string()),
            file_size,
            processing_time_ms: job.processing_time_ms.unwrap_or(0),
            download_url,
            metadata: job.metadata,
        })
    }

    fn progress(&self, step: ProgressStep, job_id: Option<&str>) {
        self.events.emit(&ConversionEvent::Progress(ProgressEvent {
            step,
            message: step.message(),
            job_id: job_id.map(str::to_string),
        }));
    }
}
