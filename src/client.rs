//! The [`Client`]: configuration, transport and event listeners in one value.

use crate::config::ClientConfig;
use crate::error::ConvertorioError;
use crate::events::{ConversionEvent, EventEmitter, EventKind};
use crate::models::{Account, Job, ListJobsQuery};
use crate::pipeline::poll::PollPolicy;
use crate::service::{ConversionService, HttpConversionService};
use std::sync::Arc;
use tracing::debug;

/// Convertorio API client.
///
/// Cheap to share: wrap it in an `Arc` and call [`Client::convert`] from as
/// many tasks as needed. Conversions share the HTTP connection pool and
/// nothing else.
///
/// # Example
/// ```rust,no_run
/// use convertorio::{Client, ClientConfig, ConversionRequest, EventKind, ConversionEvent};
///
/// # async fn run() -> Result<(), convertorio::ConvertorioError> {
/// let mut client = Client::new(ClientConfig::builder("sk_live_...").build()?)?;
/// client.on(EventKind::Status, |event| {
///     if let ConversionEvent::Status(s) = event {
///         eprintln!("poll {}/{}", s.attempt, s.max_attempts);
///     }
/// });
///
/// let result = client.convert(&ConversionRequest::new("./photo.png", "jpg")).await?;
/// println!("{} ({} bytes)", result.output_path.display(), result.file_size);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) service: Arc<dyn ConversionService>,
    pub(crate) events: EventEmitter,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("service", &"<dyn ConversionService>")
            .field("events", &self.events)
            .finish()
    }
}

impl Client {
    /// Create a client talking to the real API over HTTP.
    pub fn new(config: ClientConfig) -> Result<Self, ConvertorioError> {
        config.validate()?;
        let service = HttpConversionService::new(&config)?;
        debug!("Client ready for {}", config.api_root());
        Ok(Self::with_service(config, Arc::new(service)))
    }

    /// Create a client from `CONVERTORIO_API_KEY` / `CONVERTORIO_BASE_URL`.
    pub fn from_env() -> Result<Self, ConvertorioError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over a pre-built service, e.g.
    /// [`crate::testing::MockConversionService`].
    pub fn with_service(config: ClientConfig, service: Arc<dyn ConversionService>) -> Self {
        Self {
            config,
            service,
            events: EventEmitter::default(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register `handler` for `kind`. Handlers for the same kind run in
    /// registration order.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler);
        self
    }

    /// Like [`Client::on`] with the event given by its wire name
    /// (`"start"`, `"progress"`, `"status"`, `"complete"`, `"error"`).
    pub fn on_named<F>(&mut self, name: &str, handler: F) -> Result<&mut Self, ConvertorioError>
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        let kind: EventKind = name.parse()?;
        Ok(self.on(kind, handler))
    }

    pub(crate) fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.config.max_attempts,
            interval: self.config.poll_interval,
        }
    }

    /// Current account snapshot. Not cached.
    pub async fn get_account(&self) -> Result<Account, ConvertorioError> {
        self.service.get_account().await
    }

    /// Recent jobs, newest first as ordered by the server.
    pub async fn list_jobs(&self, query: &ListJobsQuery) -> Result<Vec<Job>, ConvertorioError> {
        self.service.list_jobs(query).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, ConvertorioError> {
        if job_id.trim().is_empty() {
            return Err(ConvertorioError::Validation("job id is required".into()));
        }
        self.service.get_job(job_id).await
    }
}
