//! reqwest-backed implementation of [`ConversionService`].

use super::ConversionService;
use crate::config::ClientConfig;
use crate::error::ConvertorioError;
use crate::models::{Account, Job, ListJobsQuery, UploadSlot};
use crate::options::ConversionMetadata;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_URL_ENDPOINT: &str = "/api/upload/request-url";
const CONFIRM_ENDPOINT: &str = "/api/upload/confirm";
const JOBS_ENDPOINT: &str = "/api/jobs";
const ACCOUNT_ENDPOINT: &str = "/api/account";
const STORAGE_UPLOAD: &str = "storage upload";
const RESULT_DOWNLOAD: &str = "result download";

#[derive(Serialize)]
struct UploadSlotRequest<'a> {
    file_name: &'a str,
    target_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversion_metadata: Option<&'a ConversionMetadata>,
}

#[derive(Serialize)]
struct ConfirmRequest<'a> {
    job_id: &'a str,
}

/// HTTP transport for the Convertorio API.
///
/// Holds one pooled `reqwest::Client`; cloning is cheap and all clones share
/// the pool, so a single instance can serve concurrent conversions.
#[derive(Clone)]
pub struct HttpConversionService {
    http: Client,
    api_root: String,
    api_key: String,
}

impl std::fmt::Debug for HttpConversionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConversionService")
            .field("api_root", &self.api_root)
            .finish_non_exhaustive()
    }
}

impl HttpConversionService {
    pub fn new(config: &ClientConfig) -> Result<Self, ConvertorioError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("convertorio-rust/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ConvertorioError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self::with_http_client(http, config))
    }

    /// Reuse an existing `reqwest::Client` (and its connection pool).
    pub fn with_http_client(http: Client, config: &ClientConfig) -> Self {
        Self {
            http,
            api_root: config.api_root().to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_root, endpoint)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    async fn send(
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<Response, ConvertorioError> {
        let response = builder
            .send()
            .await
            .map_err(|source| ConvertorioError::Network { endpoint, source })?;
        check_status(endpoint, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        endpoint: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, ConvertorioError> {
        let response = Self::send(endpoint, builder).await?;
        let body = response
            .text()
            .await
            .map_err(|source| ConvertorioError::Network { endpoint, source })?;
        serde_json::from_str(&body).map_err(|e| ConvertorioError::InvalidResponse {
            endpoint,
            detail: format!("{e}; body: {}", truncate(&body, 200)),
        })
    }
}

/// Turn a non-2xx response into [`ConvertorioError::Api`].
async fn check_status(
    endpoint: &'static str,
    response: Response,
) -> Result<Response, ConvertorioError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ConvertorioError::Api {
        endpoint,
        status: status.as_u16(),
        body,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}\u{2026}", s.chars().take(max).collect::<String>())
    }
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn request_upload_slot(
        &self,
        file_name: &str,
        target_format: &str,
        metadata: Option<&ConversionMetadata>,
    ) -> Result<UploadSlot, ConvertorioError> {
        let body = UploadSlotRequest {
            file_name,
            target_format,
            conversion_metadata: metadata,
        };
        let builder = self
            .authed(self.http.post(self.url(REQUEST_URL_ENDPOINT)))
            .json(&body);
        let slot: UploadSlot = Self::send_json(REQUEST_URL_ENDPOINT, builder).await?;
        if slot.job_id.is_empty() || slot.upload_url.is_empty() {
            return Err(ConvertorioError::InvalidResponse {
                endpoint: REQUEST_URL_ENDPOINT,
                detail: "missing job_id or upload_url".into(),
            });
        }
        debug!(job_id = %slot.job_id, "Upload slot granted");
        Ok(slot)
    }

    async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> Result<(), ConvertorioError> {
        let len = bytes.len();
        let builder = self
            .http
            .put(upload_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        Self::send(STORAGE_UPLOAD, builder).await?;
        debug!(bytes = len, "Upload accepted by storage");
        Ok(())
    }

    async fn confirm_upload(&self, job_id: &str) -> Result<(), ConvertorioError> {
        let builder = self
            .authed(self.http.post(self.url(CONFIRM_ENDPOINT)))
            .json(&ConfirmRequest { job_id });
        Self::send(CONFIRM_ENDPOINT, builder).await?;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Job, ConvertorioError> {
        let url = format!("{}/{}", self.url(JOBS_ENDPOINT), job_id);
        Self::send_json(JOBS_ENDPOINT, self.authed(self.http.get(url))).await
    }

    async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ConvertorioError> {
        let builder = self
            .authed(self.http.get(self.url(JOBS_ENDPOINT)))
            .query(&query.to_query_pairs());
        Self::send_json(JOBS_ENDPOINT, builder).await
    }

    async fn get_account(&self) -> Result<Account, ConvertorioError> {
        let builder = self.authed(self.http.get(self.url(ACCOUNT_ENDPOINT)));
        Self::send_json(ACCOUNT_ENDPOINT, builder).await
    }

    async fn download(&self, download_url: &str) -> Result<Vec<u8>, ConvertorioError> {
        let response = Self::send(RESULT_DOWNLOAD, self.http.get(download_url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ConvertorioError::Network {
                endpoint: RESULT_DOWNLOAD,
                source,
            })?;
        Ok(bytes.to_vec())
    }
}
