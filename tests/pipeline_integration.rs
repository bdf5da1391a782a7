//! Integration tests for the ingestion pipeline.
//!
//! These tests drive the full search, decode, classify and export flow
//! against an in-memory mailbox and keyword-based model doubles. Each service
//! module contains its own unit tests for detailed logic testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use pretty_assertions::assert_eq;

use jobtrail::domain::{DateWindow, MessagePart, MessageRef, RawMessage, Record, UNKNOWN};
use jobtrail::providers::email::{
    MailProvider, MessagePage, PageRequest, ProviderError, Result as ProviderResult,
};
use jobtrail::providers::nlp::{
    EntityRecognizer, EntitySpan, LabelScores, NlpResult, ZeroShotClassifier,
};
use jobtrail::services::{
    ClassificationService, ContentService, PipelineError, PipelineService, SearchService,
    JOB_APPLICATION, NOT_JOB_APPLICATION,
};
use jobtrail::storage::{CsvSink, MemorySink};

// ============================================================================
// Test Doubles
// ============================================================================

/// Mailbox serving messages in fixed-size pages.
struct FakeMailbox {
    order: Vec<String>,
    messages: HashMap<String, RawMessage>,
    page_size: usize,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl FakeMailbox {
    fn new(messages: Vec<RawMessage>, page_size: usize) -> Self {
        Self {
            order: messages.iter().map(|m| m.id.clone()).collect(),
            messages: messages.into_iter().map(|m| (m.id.clone(), m)).collect(),
            page_size,
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Lists an ID that has no message behind it.
    fn with_dangling(mut self, id: &str) -> Self {
        self.order.push(id.to_string());
        self
    }

    fn calls(&self) -> (usize, usize) {
        (
            self.list_calls.load(Ordering::SeqCst),
            self.get_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl MailProvider for FakeMailbox {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_messages(&self, query: &str, page: PageRequest) -> ProviderResult<MessagePage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        assert!(query.contains("after:1740096000 before:1740182400"));

        let offset: usize = match page.page_token.as_deref() {
            Some(token) => token
                .parse()
                .map_err(|_| ProviderError::InvalidRequest(format!("bad token {}", token)))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(self.order.len());

        Ok(MessagePage {
            messages: self.order[offset..end]
                .iter()
                .map(|id| MessageRef::new(id.as_str()))
                .collect(),
            next_page_token: (end < self.order.len()).then(|| end.to_string()),
        })
    }

    async fn get_message(&self, message: &MessageRef) -> ProviderResult<RawMessage> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.messages
            .get(&message.id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(message.id.clone()))
    }
}

/// Calls anything mentioning an application a job application, unless it is
/// a newsletter.
struct KeywordClassifier;

#[async_trait]
impl ZeroShotClassifier for KeywordClassifier {
    async fn classify(&self, text: &str, labels: &[String]) -> NlpResult<LabelScores> {
        assert_eq!(labels, [JOB_APPLICATION, NOT_JOB_APPLICATION]);

        let text = text.to_lowercase();
        let positive = text.contains("application") && !text.contains("newsletter");
        let score = if positive { 0.9 } else { 0.1 };

        Ok(LabelScores::ranked([
            (JOB_APPLICATION.to_string(), score),
            (NOT_JOB_APPLICATION.to_string(), 1.0 - score),
        ]))
    }
}

/// Tags known company names as organizations.
struct KnownOrgs(&'static [&'static str]);

#[async_trait]
impl EntityRecognizer for KnownOrgs {
    async fn recognize(&self, text: &str) -> NlpResult<Vec<EntitySpan>> {
        Ok(self
            .0
            .iter()
            .filter(|org| text.contains(*org))
            .map(|org| EntitySpan::new("ORG", *org, 0.99))
            .collect())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn message(id: &str, from: &str, subject: &str, body: &str) -> RawMessage {
    let payload = MessagePart::new("multipart/alternative")
        .with_header("From", from)
        .with_header("Subject", subject)
        .with_header("Date", format!("Fri, 21 Feb 2025 1{}:00:00 +0000", id.len()))
        .with_part(MessagePart::new("text/html").with_data(URL_SAFE_NO_PAD.encode("<p>html</p>")))
        .with_part(MessagePart::new("text/plain").with_data(URL_SAFE_NO_PAD.encode(body)));

    RawMessage::new(id, payload)
}

/// Acknowledgment from Acme, a newsletter, and an application from a sender
/// with no usable domain.
fn scenario() -> Vec<RawMessage> {
    vec![
        message(
            "a",
            "Acme Careers <careers@acme.com>",
            "We received your application",
            "Acme has received your application for the Backend Engineer position.",
        ),
        message(
            "bb",
            "Digest <news@digest.io>",
            "Weekly newsletter",
            "Top stories this week.",
        ),
        message(
            "ccc",
            "Hiring Team",
            "Application confirmation",
            "Thanks, we got your application.",
        ),
    ]
}

fn window() -> DateWindow {
    DateWindow::parse("2025/02/21", "2025/02/22").unwrap()
}

fn pipeline(mailbox: Arc<FakeMailbox>, concurrency: usize) -> PipelineService {
    let provider: Arc<dyn MailProvider> = mailbox;
    let classification =
        ClassificationService::new(Arc::new(KeywordClassifier), Arc::new(KnownOrgs(&["Acme"])));

    PipelineService::new(
        SearchService::new(Arc::clone(&provider)).with_page_size(2),
        ContentService::new(provider),
        classification,
    )
    .with_concurrency(concurrency)
}

fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort();
    records
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn end_to_end_keeps_only_applications() {
    let mailbox = Arc::new(FakeMailbox::new(scenario(), 2));
    let pipeline = pipeline(Arc::clone(&mailbox), 4);

    let report = pipeline.run(&window()).await.unwrap();

    assert_eq!(
        sorted(report.records),
        vec![
            Record {
                date: "Fri, 21 Feb 2025 11:00:00 +0000".to_string(),
                company: "Acme".to_string(),
                position: "Backend Engineer".to_string(),
            },
            Record {
                date: "Fri, 21 Feb 2025 13:00:00 +0000".to_string(),
                company: UNKNOWN.to_string(),
                position: UNKNOWN.to_string(),
            },
        ]
    );
    assert_eq!(report.processed, 3);
    assert!(report.skipped.is_empty());
    assert_eq!(mailbox.calls(), (2, 3));
}

#[tokio::test]
async fn search_covers_every_page_once() {
    let messages: Vec<RawMessage> = (0..7)
        .map(|i| message(&format!("m{}", i), "x@y.com", "Hello", "Nothing here"))
        .collect();
    let mailbox = Arc::new(FakeMailbox::new(messages, 3));
    let provider: Arc<dyn MailProvider> = mailbox.clone();

    let refs = SearchService::new(provider).search(&window()).await.unwrap();

    let ids: Vec<&str> = refs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["m0", "m1", "m2", "m3", "m4", "m5", "m6"]);
    assert_eq!(mailbox.calls(), (3, 0));
}

#[tokio::test]
async fn repeated_runs_are_idempotent() {
    let mailbox = Arc::new(FakeMailbox::new(scenario(), 2));
    let pipeline = pipeline(mailbox, 2);

    let first = pipeline.run(&window()).await.unwrap();
    let second = pipeline.run(&window()).await.unwrap();

    assert_eq!(sorted(first.records), sorted(second.records));
}

#[tokio::test]
async fn sequential_and_concurrent_runs_agree() {
    let sequential = pipeline(Arc::new(FakeMailbox::new(scenario(), 2)), 1)
        .run(&window())
        .await
        .unwrap();
    let concurrent = pipeline(Arc::new(FakeMailbox::new(scenario(), 2)), 8)
        .run(&window())
        .await
        .unwrap();

    assert_eq!(sorted(sequential.records), sorted(concurrent.records));
}

#[tokio::test]
async fn failing_message_is_skipped() {
    let mailbox = Arc::new(FakeMailbox::new(scenario(), 2).with_dangling("gone"));
    let pipeline = pipeline(mailbox, 4);

    let report = pipeline.run(&window()).await.unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.processed, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].message, MessageRef::new("gone"));
    assert!(report.skipped[0].reason.contains("gone"));
    assert!(!report.is_complete());
}

#[tokio::test]
async fn search_failure_aborts_run() {
    struct Offline;

    #[async_trait]
    impl MailProvider for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        async fn list_messages(&self, _: &str, _: PageRequest) -> ProviderResult<MessagePage> {
            Err(ProviderError::Connection("network unreachable".to_string()))
        }

        async fn get_message(&self, message: &MessageRef) -> ProviderResult<RawMessage> {
            Err(ProviderError::NotFound(message.id.clone()))
        }
    }

    let provider: Arc<dyn MailProvider> = Arc::new(Offline);
    let pipeline = PipelineService::new(
        SearchService::new(Arc::clone(&provider)),
        ContentService::new(provider),
        ClassificationService::new(Arc::new(KeywordClassifier), Arc::new(KnownOrgs(&[]))),
    );

    let result = pipeline.run(&window()).await;
    assert!(matches!(result, Err(PipelineError::SearchFailed(_))));
}

#[test]
fn invalid_windows_are_rejected_before_search() {
    let malformed = DateWindow::parse("2025-02-21", "2025/02/22").map_err(PipelineError::from);
    assert!(matches!(malformed, Err(PipelineError::MalformedDate(_))));

    let reversed = DateWindow::parse("2025/02/22", "2025/02/21").map_err(PipelineError::from);
    assert!(matches!(reversed, Err(PipelineError::InvalidDateWindow(_))));
}

// ============================================================================
// Export Tests
// ============================================================================

#[tokio::test]
async fn run_to_sink_writes_records() {
    let sink = MemorySink::new();
    let pipeline = pipeline(Arc::new(FakeMailbox::new(scenario(), 2)), 4);

    let report = pipeline.run_to_sink(&window(), &sink).await.unwrap();

    assert_eq!(sorted(sink.records().unwrap()), sorted(report.records));
}

#[tokio::test]
async fn csv_export_has_header_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("job_applications.csv");
    let sink = CsvSink::new(&path);
    let pipeline = pipeline(Arc::new(FakeMailbox::new(scenario(), 2)), 1);

    pipeline.run_to_sink(&window(), &sink).await.unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.remove(0), "Date,Company Name,Position");
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "\"Fri, 21 Feb 2025 11:00:00 +0000\",Acme,Backend Engineer",
            "\"Fri, 21 Feb 2025 13:00:00 +0000\",Unknown,Unknown",
        ]
    );
}
