//! End-to-end ingestion run.
//!
//! The [`PipelineService`] drives search, decoding, classification and field
//! resolution for every message in a window, then hands the records to a
//! [`RecordSink`].
//!
//! # Failure handling
//!
//! Window validation and search failures abort the run before any message is
//! processed. A failure on a single message (fetch, decode or classification)
//! is logged, recorded in [`RunReport::skipped`] and does not stop the run.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use super::{ClassificationService, ContentService, FieldExtractor, PipelineError, SearchService};
use crate::domain::{ClassificationResult, DateWindow, MessageContent, MessageRef, Record, UNKNOWN};
use crate::storage::RecordSink;

/// Default number of messages processed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A message left out of the results and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMessage {
    /// The message that failed.
    pub message: MessageRef,
    /// Error description.
    pub reason: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// One record per message classified as a job application.
    pub records: Vec<Record>,
    /// Messages decoded and classified successfully.
    pub processed: usize,
    /// Messages that failed and were left out.
    pub skipped: Vec<SkippedMessage>,
}

impl RunReport {
    /// Returns true if no message was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Orchestrates an ingestion run.
///
/// # Example
///
/// ```ignore
/// let pipeline = PipelineService::new(search, content, classification)
///     .with_concurrency(8);
///
/// let window = DateWindow::parse("2025/02/21", "2025/02/22")?;
/// let report = pipeline.run_to_sink(&window, &CsvSink::new("job_applications.csv")).await?;
/// ```
pub struct PipelineService {
    search: SearchService,
    content: ContentService,
    classification: ClassificationService,
    extractor: FieldExtractor,
    concurrency: usize,
    use_fallback: bool,
}

impl PipelineService {
    /// Creates a pipeline with default concurrency and fallback extraction on.
    pub fn new(
        search: SearchService,
        content: ContentService,
        classification: ClassificationService,
    ) -> Self {
        Self {
            search,
            content,
            classification,
            extractor: FieldExtractor::new(),
            concurrency: DEFAULT_CONCURRENCY,
            use_fallback: true,
        }
    }

    /// Sets how many messages are processed at once; 1 is sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enables or disables heuristic extraction for unresolved fields.
    pub fn with_fallback_extraction(mut self, enabled: bool) -> Self {
        self.use_fallback = enabled;
        self
    }

    /// Runs the pipeline over `window` and returns the records.
    ///
    /// Records are not in any particular order.
    pub async fn run(&self, window: &DateWindow) -> Result<RunReport, PipelineError> {
        let messages = self.search.search(window).await?;
        let candidates = messages.len();

        let outcomes: Vec<(MessageRef, Result<Option<Record>, PipelineError>)> =
            stream::iter(messages)
                .map(|message| async move {
                    let outcome = self.process(&message).await;
                    (message, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut report = RunReport::default();
        for (message, outcome) in outcomes {
            match outcome {
                Ok(record) => {
                    report.processed += 1;
                    report.records.extend(record);
                }
                Err(err) => {
                    tracing::warn!(message_id = %message, error = %err, "Skipping message");
                    report.skipped.push(SkippedMessage {
                        message,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            window = %window,
            candidates,
            records = report.records.len(),
            skipped = report.skipped.len(),
            "Run complete"
        );

        Ok(report)
    }

    /// Runs the pipeline and writes the records to `sink`.
    pub async fn run_to_sink(
        &self,
        window: &DateWindow,
        sink: &dyn RecordSink,
    ) -> Result<RunReport, PipelineError> {
        let report = self.run(window).await?;
        sink.write(&report.records).await?;

        tracing::info!(count = report.records.len(), "Saved job applications");
        Ok(report)
    }

    /// Decodes and classifies one message; `None` for non-applications.
    async fn process(&self, message: &MessageRef) -> Result<Option<Record>, PipelineError> {
        let content = self.content.decode(message).await?;
        let result = self
            .classification
            .classify(&content.subject, &content.body)
            .await?;

        tracing::debug!(
            message_id = %message,
            is_application = result.is_application,
            subject = %content.subject,
            "Processed message"
        );

        Ok(result
            .is_application
            .then(|| self.build_record(&content, &result)))
    }

    /// Resolves a record's fields.
    ///
    /// Company: model entity, then acknowledgment phrasing, then sender
    /// domain, then [`UNKNOWN`]. Position: model entity, then phrasing, then
    /// [`UNKNOWN`]. Heuristic steps are skipped when fallback is disabled.
    pub fn build_record(&self, content: &MessageContent, result: &ClassificationResult) -> Record {
        let company = match result.company() {
            Some(company) => company.to_string(),
            None if self.use_fallback => self.fallback_company(content),
            None => UNKNOWN.to_string(),
        };

        let position = match result.title() {
            Some(title) => title.to_string(),
            None if self.use_fallback => {
                self.extractor.extract_position(&content.subject, &content.body)
            }
            None => UNKNOWN.to_string(),
        };

        Record {
            date: content.date.clone(),
            company,
            position,
        }
    }

    fn fallback_company(&self, content: &MessageContent) -> String {
        let from_text = self.extractor.extract_company(&content.subject, &content.body);
        if from_text != UNKNOWN {
            return from_text;
        }

        self.extractor
            .extract_company_from_sender(&content.headers)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}
