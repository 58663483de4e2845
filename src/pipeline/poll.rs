//! Job-status polling.
//!
//! The loop fetches the job at most `max_attempts` times. A completed job
//! ends the loop; a failed or expired job aborts it at once with the
//! server's message; anything else sleeps `poll_interval` and tries again.
//! Running out of attempts is a [`ConvertorioError::ConversionTimeout`],
//! never confused with a server-reported failure.

use super::cancellable;
use crate::error::ConvertorioError;
use crate::events::{ConversionEvent, EventEmitter, StatusEvent};
use crate::models::{Job, JobStatus};
use crate::service::ConversionService;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Attempt budget for one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

/// Poll `job_id` until it reaches a terminal state.
///
/// Emits one `status` event before every fetch.
pub async fn wait_for_job(
    service: &dyn ConversionService,
    job_id: &str,
    policy: PollPolicy,
    events: &EventEmitter,
    cancel: &CancellationToken,
) -> Result<Job, ConvertorioError> {
    for attempt in 1..=policy.max_attempts {
        events.emit(&ConversionEvent::Status(StatusEvent {
            job_id: job_id.to_string(),
            attempt,
            max_attempts: policy.max_attempts,
        }));

        let job = cancellable(cancel, Some(job_id), service.get_job(job_id)).await?;
        debug!(job_id, attempt, status = %job.status, "Polled job");

        match job.status {
            JobStatus::Completed => {
                info!(job_id, attempt, "Job completed");
                return Ok(job);
            }
            JobStatus::Failed | JobStatus::Expired => {
                let message = job.failure_message();
                warn!(job_id, attempt, "Job {}: {}", job.status, message);
                return Err(ConvertorioError::ConversionFailed {
                    job_id: job_id.to_string(),
                    message,
                });
            }
            JobStatus::Pending | JobStatus::Processing | JobStatus::Unknown => {}
        }

        if attempt < policy.max_attempts {
            cancellable(cancel, Some(job_id), async {
                tokio::time::sleep(policy.interval).await;
                Ok(())
            })
            .await?;
        }
    }

    warn!(job_id, attempts = policy.max_attempts, "Job did not finish in time");
    Err(ConvertorioError::ConversionTimeout {
        job_id: job_id.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::testing::MockConversionService;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        }
    }

    /// Poll `job-1` on `mock` with no listeners and no cancellation.
    async fn poll(
        mock: &MockConversionService,
        max_attempts: u32,
    ) -> Result<Job, ConvertorioError> {
        let events = EventEmitter::default();
        wait_for_job(mock, "job-1", fast(max_attempts), &events, &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn completes_on_kth_attempt_with_exactly_k_fetches() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Processing,
            JobStatus::Completed,
        ])
        .await;

        let job = poll(&mock, 10).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(mock.get_job_calls().await, 4);
    }

    #[tokio::test]
    async fn failure_stops_polling_immediately() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Processing, JobStatus::Failed, JobStatus::Completed])
            .await;
        mock.set_failure_message("unsupported color profile").await;

        let err = poll(&mock, 10).await.unwrap_err();
        assert!(matches!(err, ConvertorioError::ConversionFailed { .. }));
        assert!(err.to_string().contains("unsupported color profile"));
        assert_eq!(mock.get_job_calls().await, 2);
    }

    #[tokio::test]
    async fn expired_is_terminal_failure() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Expired]).await;

        let err = poll(&mock, 5).await.unwrap_err();
        assert!(err.to_string().contains("Job expired"));
        assert_eq!(mock.get_job_calls().await, 1);
    }

    #[tokio::test]
    async fn exhausting_attempts_is_timeout() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Processing]).await;

        let err = poll(&mock, 3).await.unwrap_err();
        assert!(
            matches!(err, ConvertorioError::ConversionTimeout { attempts: 3, .. }),
            "got: {err:?}"
        );
        assert_eq!(mock.get_job_calls().await, 3);
    }

    #[tokio::test]
    async fn one_status_event_per_fetch() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Pending, JobStatus::Completed]).await;

        let seen = Arc::new(AtomicU32::new(0));
        let last_attempt = Arc::new(AtomicU32::new(0));
        let mut events = EventEmitter::default();
        {
            let seen = Arc::clone(&seen);
            let last_attempt = Arc::clone(&last_attempt);
            events.on(EventKind::Status, move |event| {
                if let ConversionEvent::Status(s) = event {
                    seen.fetch_add(1, Ordering::SeqCst);
                    last_attempt.store(s.attempt, Ordering::SeqCst);
                    assert_eq!(s.max_attempts, 7);
                }
            });
        }

        wait_for_job(&mock, "job-1", fast(7), &events, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(last_attempt.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_error_aborts_polling() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Processing]).await;
        mock.fail_get_job_on_call(2, 503).await;

        let err = poll(&mock, 10).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(mock.get_job_calls().await, 2);
    }

    #[tokio::test]
    async fn cancellation_interrupts_sleep() {
        let mock = MockConversionService::new();
        mock.script_statuses(&[JobStatus::Processing]).await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let policy = PollPolicy {
            max_attempts: 100,
            interval: Duration::from_secs(60),
        };
        let err = wait_for_job(&mock, "job-1", policy, &EventEmitter::default(), &cancel)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ConvertorioError::Cancelled { job_id: Some(ref id) } if id == "job-1"),
            "got: {err:?}"
        );
        assert_eq!(mock.get_job_calls().await, 1);
    }
}
