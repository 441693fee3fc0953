//! Failure tests for the pipeline
//!
//! These tests verify that the system handles failures gracefully:
//! - Unreachable endpoints
//! - Probes that panic
//! - Invalid check definitions
//! - Probe backlog under a short interval

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use healthchecker::{
    Check, ConfigError, Pipeline, ProbeOutcome, ProbeTimings, Prober, group_into_domains,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::helpers::*;

#[tokio::test]
async fn test_unreachable_check_reports_zero_percent() {
    let checks = vec![refused_check("down", "down.example.net")];

    let (pipeline, mut reports) = spawn_pipeline(&checks, &test_settings());

    let report = next_report(&mut reports).await;
    let line = report.line("example.net").unwrap();
    assert_eq!((line.up, line.total), (0, 1));
    assert_eq!(line.to_string(), "example.net has 0% availability percentage");

    pipeline.shutdown();
    let stats = pipeline.join().await.unwrap();
    assert_eq!(stats.get("example.net").unwrap().total(), 1);
}

/// Panics on every other call
struct FlakyProber {
    calls: AtomicUsize,
}

#[async_trait]
impl Prober for FlakyProber {
    async fn probe(&self, _check: &Check) -> ProbeOutcome {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            panic!("probe crashed");
        }
        ProbeOutcome {
            success: true,
            status: Some(200),
            elapsed: Duration::from_millis(1),
            timings: ProbeTimings::default(),
            error: None,
        }
    }
}

#[tokio::test]
async fn test_panicking_probes_count_as_down() {
    let checks = vec![
        refused_check("a", "a.example.com"),
        refused_check("b", "b.example.com"),
    ];
    let grouped = group_into_domains(&checks).unwrap();
    let (report_tx, mut reports) = mpsc::unbounded_channel();

    let pipeline = Pipeline::spawn(
        grouped,
        &test_settings(),
        Arc::new(FlakyProber {
            calls: AtomicUsize::new(0),
        }),
        Arc::new(report_tx),
        CancellationToken::new(),
    );

    let report = next_report(&mut reports).await;
    let line = report.line("example.com").unwrap();
    assert_eq!((line.up, line.total, line.percent), (1, 2, 50));

    pipeline.shutdown();
    pipeline.join().await.unwrap();
}

#[tokio::test]
async fn test_invalid_check_prevents_startup() {
    let mut checks = vec![refused_check("ok", "api.example.com")];
    checks.push(refused_check("local", "localhost"));

    assert_matches!(
        group_into_domains(&checks),
        Err(ConfigError::ShortHostname { check, .. }) if check == "local"
    );
}

/// Takes 200ms per probe and counts how often it ran
struct SlowProber {
    calls: AtomicUsize,
}

#[async_trait]
impl Prober for SlowProber {
    async fn probe(&self, _check: &Check) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        ProbeOutcome {
            success: false,
            status: None,
            elapsed: Duration::from_millis(200),
            timings: ProbeTimings::default(),
            error: Some("timed out".to_string()),
        }
    }
}

#[tokio::test]
async fn test_backlog_loses_no_results() {
    let checks = vec![
        refused_check("a", "a.example.com"),
        refused_check("b", "b.example.com"),
        refused_check("c", "c.example.com"),
    ];
    let grouped = group_into_domains(&checks).unwrap();
    let (report_tx, _reports) = mpsc::unbounded_channel();

    // Ticks every second, probes are slow and the work queue holds one check
    let mut settings = test_settings();
    settings.interval_secs = 1;
    settings.queue_capacity = 1;

    let prober = Arc::new(SlowProber {
        calls: AtomicUsize::new(0),
    });

    let pipeline = Pipeline::spawn(
        grouped,
        &settings,
        Arc::clone(&prober) as Arc<dyn Prober>,
        Arc::new(report_tx),
        CancellationToken::new(),
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    pipeline.shutdown();
    let stats = pipeline.join().await.unwrap();

    // Every probe that ran was counted, and nothing else
    let total = stats.get("example.com").unwrap().total();
    assert_eq!(total, prober.calls.load(Ordering::SeqCst) as u64);
    assert!(total >= 6, "only {total} probes ran");
    assert_eq!(stats.get("example.com").unwrap().up(), 0);
}
