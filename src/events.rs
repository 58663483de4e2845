//! Lifecycle events fired while a conversion runs.
//!
//! Register handlers with [`crate::Client::on`]. Handlers run synchronously,
//! on the task driving the conversion, in registration order. A panicking
//! handler is not caught: it unwinds through the conversion step that
//! emitted the event.
//!
//! For a request that passes validation the sequence is always
//!
//! ```text
//! start ─▶ progress(requesting-upload-url) ─▶ progress(uploading)
//!       ─▶ progress(confirming) ─▶ progress(converting) ─▶ status × N
//!       ─▶ progress(downloading) ─▶ complete
//! ```
//!
//! cut short by exactly one `error` at the first failing step.
//!
//! # Example
//!
//! ```rust
//! use convertorio::{ConversionEvent, EventEmitter, EventKind};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! let polls = Arc::new(AtomicU32::new(0));
//! let seen = Arc::clone(&polls);
//!
//! let mut events = EventEmitter::default();
//! events.on(EventKind::Status, move |_event: &ConversionEvent| {
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//! assert_eq!(events.handler_count(EventKind::Status), 1);
//! ```

use crate::error::ConvertorioError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Names under which handlers are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Progress,
    Status,
    Complete,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Progress => "progress",
            EventKind::Status => "status",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ConvertorioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(EventKind::Start),
            "progress" => Ok(EventKind::Progress),
            "status" => Ok(EventKind::Status),
            "complete" => Ok(EventKind::Complete),
            "error" => Ok(EventKind::Error),
            other => Err(ConvertorioError::Validation(format!(
                "unknown event '{other}' (expected start, progress, status, complete or error)"
            ))),
        }
    }
}

/// Orchestration step announced by a `progress` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStep {
    RequestingUploadUrl,
    Uploading,
    Confirming,
    Converting,
    Downloading,
}

impl ProgressStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStep::RequestingUploadUrl => "requesting-upload-url",
            ProgressStep::Uploading => "uploading",
            ProgressStep::Confirming => "confirming",
            ProgressStep::Converting => "converting",
            ProgressStep::Downloading => "downloading",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressStep::RequestingUploadUrl => "Requesting upload URL from server",
            ProgressStep::Uploading => "Uploading file to cloud storage",
            ProgressStep::Confirming => "Confirming upload and starting conversion",
            ProgressStep::Converting => "Converting file (this may take a moment)",
            ProgressStep::Downloading => "Downloading converted file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartEvent {
    pub file_name: String,
    pub source_format: String,
    pub target_format: String,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub message: &'static str,
    /// Known from `uploading` onwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub job_id: String,
    /// 1-based.
    pub attempt: u32,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompleteEvent {
    pub job_id: String,
    pub output_path: PathBuf,
    pub processing_time_ms: u64,
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub input_path: PathBuf,
    pub target_format: String,
}

/// A lifecycle event with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ConversionEvent {
    Start(StartEvent),
    Progress(ProgressEvent),
    Status(StatusEvent),
    Complete(CompleteEvent),
    Error(ErrorEvent),
}

impl ConversionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ConversionEvent::Start(_) => EventKind::Start,
            ConversionEvent::Progress(_) => EventKind::Progress,
            ConversionEvent::Status(_) => EventKind::Status,
            ConversionEvent::Complete(_) => EventKind::Complete,
            ConversionEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Shared handler type.
pub type EventHandler = Arc<dyn Fn(&ConversionEvent) + Send + Sync>;

/// Per-client listener registry.
#[derive(Clone, Default)]
pub struct EventEmitter {
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<EventKind, usize> =
            self.handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventEmitter").field("handlers", &counts).finish()
    }
}

impl EventEmitter {
    /// Append `handler` to the listeners for `kind`.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: Fn(&ConversionEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
        self
    }

    /// Invoke every handler registered for the event's kind, in order.
    pub fn emit(&self, event: &ConversionEvent) {
        if let Some(handlers) = self.handlers.get(&event.kind()) {
            for handler in handlers {
                handler(event);
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn status(attempt: u32) -> ConversionEvent {
        ConversionEvent::Status(StatusEvent {
            job_id: "j".into(),
            attempt,
            max_attempts: 3,
        })
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut events = EventEmitter::default();
        for i in 0..3 {
            let order = Arc::clone(&order);
            events.on(EventKind::Status, move |_| order.lock().unwrap().push(i));
        }
        events.emit(&status(1));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_kind_is_invoked() {
        let starts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&starts);
        let mut events = EventEmitter::default();
        events.on(EventKind::Start, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        events.emit(&status(1));
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn emit_without_handlers_is_noop() {
        EventEmitter::default().emit(&status(1));
    }

    #[test]
    #[should_panic(expected = "handler boom")]
    fn handler_panic_propagates() {
        let mut events = EventEmitter::default();
        events.on(EventKind::Status, |_| panic!("handler boom"));
        events.emit(&status(1));
    }

    #[test]
    fn kind_parses_from_wire_name() {
        assert_eq!("complete".parse::<EventKind>().unwrap(), EventKind::Complete);
        let err = "finished".parse::<EventKind>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn events_serialise_with_tag() {
        let json = serde_json::to_value(ConversionEvent::Progress(ProgressEvent {
            step: ProgressStep::RequestingUploadUrl,
            message: ProgressStep::RequestingUploadUrl.message(),
            job_id: None,
        }))
        .unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["step"], "requesting-upload-url");
        assert!(json.get("job_id").is_none());
    }

    #[test]
    fn emitter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EventEmitter>();
    }
}
