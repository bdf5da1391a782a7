//! Classification results and the records the pipeline emits.

use serde::{Deserialize, Serialize};

/// Sentinel for a field that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Outcome of classifying a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Whether the message acknowledges a job application.
    pub is_application: bool,
    /// Organization found by entity recognition, or [`UNKNOWN`].
    pub company_name: String,
    /// Job title found by entity recognition, or [`UNKNOWN`].
    pub job_title: String,
}

impl ClassificationResult {
    /// A result with no extracted fields.
    pub fn unresolved(is_application: bool) -> Self {
        Self {
            is_application,
            company_name: UNKNOWN.to_string(),
            job_title: UNKNOWN.to_string(),
        }
    }

    /// The company name, unless it is the sentinel.
    pub fn company(&self) -> Option<&str> {
        known(&self.company_name)
    }

    /// The job title, unless it is the sentinel.
    pub fn title(&self) -> Option<&str> {
        known(&self.job_title)
    }
}

fn known(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != UNKNOWN).then_some(value)
}

/// One job application found in the mailbox.
///
/// Field names serialize to the export column headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Record {
    /// Message `Date` header as sent by the provider.
    #[serde(rename = "Date")]
    pub date: String,
    /// Company the application went to.
    #[serde(rename = "Company Name")]
    pub company: String,
    /// Position applied for.
    #[serde(rename = "Position")]
    pub position: String,
}
