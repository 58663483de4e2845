//! # convertorio
//!
//! Async Rust client for the [Convertorio](https://convertorio.com)
//! file-conversion API.
//!
//! ## Conversion Flow
//!
//! ```text
//! local file
//!  │
//!  ├─ 1. Slot      POST /api/upload/request-url  → job id + pre-signed URL
//!  ├─ 2. Upload    PUT  <pre-signed URL>         raw bytes, no bearer token
//!  ├─ 3. Confirm   POST /api/upload/confirm      conversion starts server-side
//!  ├─ 4. Poll      GET  /api/jobs/{id}           every 2 s, at most 120 times
//!  └─ 5. Download  GET  <download URL>           written atomically to disk
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convertorio::{Client, ConversionOptions, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads CONVERTORIO_API_KEY (and optionally CONVERTORIO_BASE_URL)
//!     let client = Client::from_env()?;
//!     let request = ConversionRequest::new("photo.png", "webp")
//!         .options(ConversionOptions::default().quality(85));
//!     let result = client.convert(&request).await?;
//!     println!("{} ({} bytes)", result.output_path.display(), result.file_size);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | `convertorio` binary (clap, anyhow, tracing-subscriber, indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! convertorio = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod events;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod service;
pub mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::ConvertorioError;
pub use events::{
    CompleteEvent, ConversionEvent, ErrorEvent, EventEmitter, EventKind, ProgressEvent,
    ProgressStep, StartEvent, StatusEvent,
};
pub use models::{Account, ConversionResult, Job, JobStatus, ListJobsQuery, UploadSlot};
pub use options::{AspectRatio, ConversionOptions, ConversionRequest, CropStrategy, IconSize};
pub use service::{ConversionService, HttpConversionService};
pub use tokio_util::sync::CancellationToken;
