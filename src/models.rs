//! Wire types returned by the API and the client-side conversion result.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Response of `POST /api/upload/request-url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    pub job_id: String,
    /// Pre-signed storage URL; accepts a single unauthenticated PUT.
    pub upload_url: String,
}

/// Server-side state of a conversion job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// The upload slot lapsed before the job ran.
    Expired,
    /// Any status this client does not know; treated as still running.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Completed, failed or expired. Polling stops here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Expired => "expired",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = crate::error::ConvertorioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "expired" => Ok(JobStatus::Expired),
            other => Err(crate::error::ConvertorioError::Validation(format!(
                "unknown job status '{other}'"
            ))),
        }
    }
}

/// A conversion job as reported by `GET /api/jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub source_format: Option<String>,
    #[serde(default)]
    pub target_format: Option<String>,
    /// Present only once the job completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Failure text of a failed job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Older payloads put the failure text here instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unparseable timestamps decode as `None` rather than failing the job.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
    /// Echo of the conversion metadata, as the server stored it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Job {
    /// Server-side failure message, or a generic one for a terminal
    /// failure without details.
    pub fn failure_message(&self) -> String {
        let server_text = [&self.error_message, &self.error]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|msg| !msg.trim().is_empty());
        match (&self.status, server_text) {
            (_, Some(msg)) => msg.to_string(),
            (JobStatus::Expired, _) => "Job expired".to_string(),
            _ => "Conversion failed".to_string(),
        }
    }
}

/// RFC 3339, a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` read as UTC, or epoch
/// seconds/milliseconds. Anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|t| {
            if t.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(t)
            } else {
                DateTime::from_timestamp(t, 0)
            }
        }),
        _ => None,
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Account snapshot from `GET /api/account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub daily_conversions_remaining: i64,
    #[serde(default)]
    pub total_conversions: i64,
}

/// Filters for `GET /api/jobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListJobsQuery {
    /// Default: 50.
    pub limit: u32,
    /// Default: 0.
    pub offset: u32,
    pub status: Option<JobStatus>,
}

impl Default for ListJobsQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            status: None,
        }
    }
}

impl ListJobsQuery {
    pub(crate) fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(ref status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }
}

/// Outcome of a successful [`crate::Client::convert`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source_format: String,
    pub target_format: String,
    /// Size in bytes of the file written to `output_path`.
    pub file_size: u64,
    pub processing_time_ms: u64,
    pub download_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_job_deserialises() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "job-42",
            "status": "completed",
            "original_filename": "photo.png",
            "source_format": "png",
            "target_format": "jpg",
            "download_url": "https://cdn.example.com/photo.jpg",
            "processing_time_ms": 850,
            "created_at": "2026-10-01T12:00:00Z",
            "completed_at": "2026-10-01T12:00:01Z",
            "metadata": {"quality": 90}
        }))
        .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.status.is_terminal());
        assert_eq!(job.processing_time_ms, Some(850));
        assert_eq!(job.metadata.unwrap()["quality"], 90);
    }

    #[test]
    fn offsetless_or_odd_timestamps_do_not_fail_the_job() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j",
            "status": "completed",
            "download_url": "https://x/y.jpg",
            "created_at": "2026-10-01T12:00:00",
            "completed_at": "yesterday"
        }))
        .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(
            job.created_at.unwrap().to_rfc3339(),
            "2026-10-01T12:00:00+00:00"
        );
        assert_eq!(job.completed_at, None);

        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j",
            "status": "completed",
            "created_at": "2026-10-01 12:00:00.250",
            "completed_at": 1_790_000_000_000i64
        }))
        .unwrap();
        assert_eq!(job.created_at.unwrap().timestamp_subsec_millis(), 250);
        assert_eq!(job.completed_at.unwrap().timestamp(), 1_790_000_000);

        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j",
            "status": "pending",
            "created_at": null
        }))
        .unwrap();
        assert_eq!(job.created_at, None);
    }

    #[test]
    fn error_message_field_carries_server_text() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j",
            "status": "failed",
            "error_message": "bad input"
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "bad input");

        // Both fields present: the job-level one wins, and decoding still works.
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": "j",
            "status": "failed",
            "error": "generic",
            "error_message": "unsupported color profile"
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "unsupported color profile");
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let job: Job =
            serde_json::from_value(serde_json::json!({"id": "j", "status": "queued"})).unwrap();
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn failure_message_prefers_server_text() {
        let mut job: Job =
            serde_json::from_value(serde_json::json!({"id": "j", "status": "failed"})).unwrap();
        assert_eq!(job.failure_message(), "Conversion failed");
        job.error = Some("corrupt input".into());
        assert_eq!(job.failure_message(), "corrupt input");
        job.status = JobStatus::Expired;
        job.error = None;
        assert_eq!(job.failure_message(), "Job expired");
    }

    #[test]
    fn list_query_pairs() {
        let q = ListJobsQuery {
            limit: 10,
            offset: 20,
            status: Some(JobStatus::Failed),
        };
        assert_eq!(
            q.to_query_pairs(),
            vec![
                ("limit", "10".to_string()),
                ("offset", "20".to_string()),
                ("status", "failed".to_string()),
            ]
        );
        assert_eq!(ListJobsQuery::default().to_query_pairs().len(), 2);
    }

    #[test]
    fn account_tolerates_missing_counters() {
        let acct: Account =
            serde_json::from_value(serde_json::json!({"id": "u1", "plan": "free"})).unwrap();
        assert_eq!(acct.plan, "free");
        assert_eq!(acct.points, 0);
    }
}
