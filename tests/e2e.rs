//! End-to-end tests against the live Convertorio API.
//!
//! They spend real conversion credits, so they are gated behind
//! `E2E_ENABLED` and need `CONVERTORIO_API_KEY` (plus optionally
//! `CONVERTORIO_BASE_URL`).
//!
//! Run with:
//!   E2E_ENABLED=1 CONVERTORIO_API_KEY=sk_... cargo test --test e2e -- --nocapture

use convertorio::{
    Client, ConversionEvent, ConversionOptions, ConversionRequest, EventKind, JobStatus,
    ListJobsQuery,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED and an API key are set.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match Client::from_env() {
            Ok(c) => c,
            Err(e) => {
                println!("SKIP — {e}");
                return;
            }
        }
    }};
}

/// Smallest valid PNG: one opaque black pixel.
const ONE_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0x60,
    0x60, 0x60, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, 0x27, 0x34, 0x27, 0x0A, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn sample_png(dir: &tempfile::TempDir) -> PathBuf {
    let p = dir.path().join("pixel.png");
    std::fs::write(&p, ONE_PIXEL_PNG).unwrap();
    p
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_account() {
    let client = e2e_skip_unless_ready!();
    let account = client.get_account().await.expect("account");
    println!("account: {} ({} points)", account.email, account.points);
    assert!(!account.id.is_empty());
}

#[tokio::test]
async fn e2e_png_to_jpg() {
    let mut client = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let input = sample_png(&dir);

    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::Start, EventKind::Complete, EventKind::Error] {
        let seen = Arc::clone(&seen);
        client.on(kind, move |e: &ConversionEvent| seen.lock().unwrap().push(e.kind()));
    }

    let request = ConversionRequest::new(&input, "jpg")
        .options(ConversionOptions::default().quality(80));
    let result = client.convert(&request).await.expect("conversion");

    println!(
        "job {} → {} ({} bytes, {}ms)",
        result.job_id,
        result.output_path.display(),
        result.file_size,
        result.processing_time_ms
    );
    assert_eq!(result.output_path, dir.path().join("pixel.jpg"));
    assert!(result.file_size > 0);
    let written = std::fs::read(&result.output_path).unwrap();
    assert_eq!(written.len() as u64, result.file_size);
    // JPEG SOI marker
    assert_eq!(&written[..2], &[0xFF, 0xD8]);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![EventKind::Start, EventKind::Complete]
    );

    let job = client.get_job(&result.job_id).await.expect("job lookup");
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn e2e_list_jobs() {
    let client = e2e_skip_unless_ready!();
    let jobs = client
        .list_jobs(&ListJobsQuery {
            limit: 5,
            ..ListJobsQuery::default()
        })
        .await
        .expect("jobs");
    println!("{} recent jobs", jobs.len());
    assert!(jobs.len() <= 5);
}
