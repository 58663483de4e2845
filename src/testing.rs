//! In-memory [`ConversionService`] for tests.
//!
//! [`MockConversionService`] hands out upload slots, accepts uploads,
//! replays a scripted sequence of job statuses and serves configurable
//! download bytes. Every call is recorded so tests can assert on the exact
//! sequence of requests.
//!
//! ```rust
//! use convertorio::models::JobStatus;
//! use convertorio::testing::MockConversionService;
//!
//! # tokio_test::block_on(async {
//! let mock = MockConversionService::new();
//! mock.script_statuses(&[JobStatus::Processing, JobStatus::Completed]).await;
//! mock.set_download_bytes(b"converted".to_vec()).await;
//! assert_eq!(mock.get_job_calls().await, 0);
//! # });
//! ```

use crate::error::ConvertorioError;
use crate::models::{Account, Job, JobStatus, ListJobsQuery, UploadSlot};
use crate::options::ConversionMetadata;
use crate::service::ConversionService;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The service call a recorded request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    RequestUploadSlot,
    UploadBytes,
    ConfirmUpload,
    GetJob,
    ListJobs,
    GetAccount,
    Download,
}

/// A recorded call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub call: MockCall,
    /// Job id, URL or file name depending on the call.
    pub subject: String,
}

#[derive(Debug)]
struct MockState {
    calls: Vec<RecordedCall>,
    statuses: Vec<JobStatus>,
    failure_message: Option<String>,
    download_bytes: Vec<u8>,
    uploaded: Option<Vec<u8>>,
    last_metadata: Option<ConversionMetadata>,
    last_target_format: Option<String>,
    failures: HashMap<MockCall, u16>,
    get_job_failure: Option<(usize, u16)>,
    jobs: Vec<Job>,
    account: Account,
}

/// Scripted, recording implementation of [`ConversionService`].
#[derive(Debug, Clone)]
pub struct MockConversionService {
    state: Arc<RwLock<MockState>>,
}

impl Default for MockConversionService {
    fn default() -> Self {
        Self::new()
    }
}

pub const MOCK_JOB_ID: &str = "job-mock-1";
pub const MOCK_UPLOAD_URL: &str = "https://storage.mock/upload/job-mock-1?sig=abc";
pub const MOCK_DOWNLOAD_URL: &str = "https://storage.mock/download/job-mock-1";

impl MockConversionService {
    /// A service whose jobs complete on the first poll.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                calls: Vec::new(),
                statuses: vec![JobStatus::Completed],
                failure_message: None,
                download_bytes: b"converted-bytes".to_vec(),
                uploaded: None,
                last_metadata: None,
                last_target_format: None,
                failures: HashMap::new(),
                get_job_failure: None,
                jobs: Vec::new(),
                account: Account {
                    id: "user-1".into(),
                    email: "dev@example.com".into(),
                    name: "Dev".into(),
                    plan: "free".into(),
                    points: 100,
                    daily_conversions_remaining: 10,
                    total_conversions: 3,
                },
            })),
        }
    }

    /// Statuses returned by successive `get_job` calls; the last one repeats.
    pub async fn script_statuses(&self, statuses: &[JobStatus]) {
        assert!(!statuses.is_empty(), "script at least one status");
        self.state.write().await.statuses = statuses.to_vec();
    }

    /// Error text attached to failed jobs.
    pub async fn set_failure_message(&self, message: impl Into<String>) {
        self.state.write().await.failure_message = Some(message.into());
    }

    pub async fn set_download_bytes(&self, bytes: Vec<u8>) {
        self.state.write().await.download_bytes = bytes;
    }

    /// Make every call of kind `call` answer with HTTP `status`.
    pub async fn fail_call(&self, call: MockCall, status: u16) {
        self.state.write().await.failures.insert(call, status);
    }

    /// Make the `n`-th (1-based) `get_job` call answer with HTTP `status`.
    pub async fn fail_get_job_on_call(&self, n: usize, status: u16) {
        self.state.write().await.get_job_failure = Some((n, status));
    }

    /// Jobs returned by `list_jobs` (before offset/limit/status filtering).
    pub async fn set_jobs(&self, jobs: Vec<Job>) {
        self.state.write().await.jobs = jobs;
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.read().await.calls.clone()
    }

    /// Just the call kinds, in order.
    pub async fn call_sequence(&self) -> Vec<MockCall> {
        self.state.read().await.calls.iter().map(|c| c.call).collect()
    }

    pub async fn get_job_calls(&self) -> usize {
        self.count(MockCall::GetJob).await
    }

    pub async fn count(&self, call: MockCall) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.call == call)
            .count()
    }

    /// Bytes received by the last `upload_bytes`.
    pub async fn uploaded_bytes(&self) -> Option<Vec<u8>> {
        self.state.read().await.uploaded.clone()
    }

    /// Metadata sent with the last `request_upload_slot`.
    pub async fn last_metadata(&self) -> Option<ConversionMetadata> {
        self.state.read().await.last_metadata.clone()
    }

    pub async fn last_target_format(&self) -> Option<String> {
        self.state.read().await.last_target_format.clone()
    }

    /// A job in the given state, shaped like the real API's.
    pub fn job(id: &str, status: JobStatus) -> Job {
        let completed = status == JobStatus::Completed;
        Job {
            id: id.to_string(),
            status,
            original_filename: Some("photo.png".into()),
            source_format: Some("png".into()),
            target_format: Some("jpg".into()),
            download_url: completed.then(|| MOCK_DOWNLOAD_URL.to_string()),
            processing_time_ms: completed.then_some(420),
            error_message: None,
            error: None,
            created_at: None,
            completed_at: None,
            metadata: None,
        }
    }

    async fn record(&self, call: MockCall, subject: &str) -> Result<(), ConvertorioError> {
        let mut state = self.state.write().await;
        state.calls.push(RecordedCall {
            call,
            subject: subject.to_string(),
        });
        if let Some(&status) = state.failures.get(&call) {
            return Err(ConvertorioError::Api {
                endpoint: "mock",
                status,
                body: format!("mock failure for {call:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ConversionService for MockConversionService {
    async fn request_upload_slot(
        &self,
        file_name: &str,
        target_format: &str,
        metadata: Option<&ConversionMetadata>,
    ) -> Result<UploadSlot, ConvertorioError> {
        self.record(MockCall::RequestUploadSlot, file_name).await?;
        let mut state = self.state.write().await;
        state.last_metadata = metadata.cloned();
        state.last_target_format = Some(target_format.to_string());
        Ok(UploadSlot {
            job_id: MOCK_JOB_ID.into(),
            upload_url: MOCK_UPLOAD_URL.into(),
        })
    }

    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), ConvertorioError> {
        self.record(MockCall::UploadBytes, upload_url).await?;
        self.state.write().await.uploaded = Some(bytes);
        Ok(())
    }

    async fn confirm_upload(&self, job_id: &str) -> Result<(), ConvertorioError> {
        self.record(MockCall::ConfirmUpload, job_id).await
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ConvertorioError> {
        self.record(MockCall::GetJob, job_id).await?;
        let state = self.state.read().await;
        let n = state
            .calls
            .iter()
            .filter(|c| c.call == MockCall::GetJob)
            .count();
        if let Some((fail_at, status)) = state.get_job_failure {
            if n == fail_at {
                return Err(ConvertorioError::Api {
                    endpoint: "mock",
                    status,
                    body: "mock get_job failure".into(),
                });
            }
        }
        let idx = (n - 1).min(state.statuses.len() - 1);
        let status = state.statuses[idx].clone();
        let mut job = Self::job(job_id, status);
        if matches!(job.status, JobStatus::Failed | JobStatus::Expired) {
            job.error_message = state.failure_message.clone();
        }
        Ok(job)
    }

    async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ConvertorioError> {
        self.record(MockCall::ListJobs, "").await?;
        let state = self.state.read().await;
        Ok(state
            .jobs
            .iter()
            .filter(|j| query.status.as_ref().is_none_or(|s| *s == j.status))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_account(&self) -> Result<Account, ConvertorioError> {
        self.record(MockCall::GetAccount, "").await?;
        Ok(self.state.read().await.account.clone())
    }

    async fn download(&self, download_url: &str) -> Result<Vec<u8>, ConvertorioError> {
        self.record(MockCall::Download, download_url).await?;
        Ok(self.state.read().await.download_bytes.clone())
    }
}
