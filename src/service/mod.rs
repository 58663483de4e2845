//! The remote conversion service as seen by the orchestrator.
//!
//! [`ConversionService`] is the seam between the orchestration logic in
//! [`crate::Client`] and the wire. [`HttpConversionService`] talks to the
//! real API over reqwest; [`crate::testing::MockConversionService`] scripts
//! responses for tests.

mod http;

pub use http::HttpConversionService;

use crate::error::ConvertorioError;
use crate::models::{Account, Job, ListJobsQuery, UploadSlot};
use crate::options::ConversionMetadata;
use async_trait::async_trait;

/// Typed calls against the Convertorio API and its storage URLs.
///
/// Every method maps a non-success HTTP status to
/// [`ConvertorioError::Api`] carrying the status and body text.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// `POST /api/upload/request-url`: create a job and obtain a storage slot.
    async fn request_upload_slot(
        &self,
        file_name: &str,
        target_format: &str,
        metadata: Option<&ConversionMetadata>,
    ) -> Result<UploadSlot, ConvertorioError>;

    /// `PUT <upload_url>` with the raw file bytes. Not authenticated.
    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), ConvertorioError>;

    /// `POST /api/upload/confirm`: tell the server the upload finished.
    async fn confirm_upload(&self, job_id: &str) -> Result<(), ConvertorioError>;

    /// `GET /api/jobs/{id}`.
    async fn get_job(&self, job_id: &str) -> Result<Job, ConvertorioError>;

    /// `GET /api/jobs`.
    async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ConvertorioError>;

    /// `GET /api/account`.
    async fn get_account(&self) -> Result<Account, ConvertorioError>;

    /// `GET <download_url>`: fetch the converted bytes. Not authenticated.
    async fn download(&self, download_url: &str) -> Result<Vec<u8>, ConvertorioError>;
}
