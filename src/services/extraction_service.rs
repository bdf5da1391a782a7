//! Heuristic field extraction.
//!
//! Fills company and position when the models leave them unresolved. Company
//! names come from acknowledgment phrasings in the text, then from the sender
//! domain; positions come from "for the X position" or "applying for X role".

use regex::Regex;

use crate::domain::{find_header, MessageHeader, UNKNOWN};

/// Acknowledgment phrasings capturing the company, most specific first.
const COMPANY_PATTERNS: &[&str] = &[
    r"(?i)your application was sent to ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)we have received your application at ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)thank you for applying to ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)thank you for your interest in ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)application received at ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)your application has been submitted to ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)you have applied to ([A-Z][a-zA-Z0-9&.\- ]+)",
    r"(?i)([A-Z][a-zA-Z0-9&.\-]+) has received your application",
];

const POSITION_PATTERN: &str = r"(?i)for the (.*?) position|applying for (.*?) role";

const SENDER_DOMAIN_PATTERN: &str = r"@([\w.-]+)";

/// Regex-based extractor for company and position.
///
/// Patterns are compiled once; build one extractor and reuse it.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    company_patterns: Vec<Regex>,
    position_pattern: Regex,
    sender_domain: Regex,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    /// Compiles the extraction patterns.
    pub fn new() -> Self {
        Self {
            company_patterns: COMPANY_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("company pattern is valid"))
                .collect(),
            position_pattern: Regex::new(POSITION_PATTERN).expect("position pattern is valid"),
            sender_domain: Regex::new(SENDER_DOMAIN_PATTERN).expect("sender pattern is valid"),
        }
    }

    /// Company named by the first matching acknowledgment pattern, or
    /// [`UNKNOWN`].
    ///
    /// Each pattern is tried against the subject, then the body. A capture
    /// never crosses from one into the other and ends at the first sentence
    /// boundary.
    pub fn extract_company(&self, subject: &str, body: &str) -> String {
        self.company_patterns
            .iter()
            .find_map(|pattern| {
                [subject, body].into_iter().find_map(|text| {
                    pattern
                        .captures(text)
                        .and_then(|caps| caps.get(1))
                        .map(|m| first_sentence(m.as_str()))
                        .filter(|company| !company.is_empty())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Company derived from the `From` header's domain.
    ///
    /// `jobs@greenhouse.io` yields `Greenhouse`. Returns `None` without a
    /// `From` header or an address in it.
    pub fn extract_company_from_sender(&self, headers: &[MessageHeader]) -> Option<String> {
        let from = find_header(headers, "From")?;
        let domain = self.sender_domain.captures(from)?.get(1)?.as_str();
        let label = domain.split('.').next().filter(|l| !l.is_empty())?;

        Some(capitalize(label))
    }

    /// Position from "for the X position" or "applying for X role", or
    /// [`UNKNOWN`].
    pub fn extract_position(&self, subject: &str, body: &str) -> String {
        [subject, body]
            .into_iter()
            .find_map(|text| {
                self.position_pattern
                    .captures(text)
                    .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
                    .map(|m| m.as_str().trim())
                    .filter(|position| !position.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

/// Cuts a capture at the first `". "` and trims trailing periods and spaces.
fn first_sentence(capture: &str) -> &str {
    let sentence = match capture.find(". ") {
        Some(end) => &capture[..end],
        None => capture,
    };
    sentence.trim().trim_end_matches('.').trim_end()
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn from(value: &str) -> Vec<MessageHeader> {
        vec![
            MessageHeader::new("Subject", "hello"),
            MessageHeader::new("From", value),
        ]
    }

    #[test]
    fn company_from_subject() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company("Thank you for applying to Acme Corp", ""),
            "Acme Corp"
        );
    }

    #[test]
    fn company_from_body_is_case_insensitive() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company("Update", "we have received your application at globex"),
            "globex"
        );
    }

    #[test]
    fn company_before_received_phrase() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company("Initech has received your application", ""),
            "Initech"
        );
    }

    #[test]
    fn earlier_pattern_wins() {
        let extractor = FieldExtractor::new();
        let body = "Thank you for applying to Umbrella\nYour application was sent to Hooli";
        assert_eq!(extractor.extract_company("", body), "Hooli");
    }

    #[test]
    fn subject_match_stops_before_body() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company(
                "Thank you for applying to Globex",
                "We are reviewing your application for the Analyst position"
            ),
            "Globex"
        );
    }

    #[test]
    fn body_match_stops_at_sentence_end() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company(
                "Update",
                "Thank you for applying to Globex Corp. We will be in touch soon."
            ),
            "Globex Corp"
        );
        assert_eq!(
            extractor.extract_company("", "Your application was sent to Hooli."),
            "Hooli"
        );
    }

    #[test]
    fn subject_wins_over_body_for_same_pattern() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company(
                "Thank you for applying to Initech",
                "Thank you for applying to Umbrella"
            ),
            "Initech"
        );
    }

    #[test]
    fn no_match_is_unknown() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_company("Weekly digest", "Top stories"), UNKNOWN);
    }

    #[test]
    fn sender_domain_is_capitalized() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_company_from_sender(&from("jobs@greenhouse.io")),
            Some("Greenhouse".to_string())
        );
        assert_eq!(
            extractor.extract_company_from_sender(&from("Acme Talent <no-reply@ACME.com>")),
            Some("Acme".to_string())
        );
    }

    #[test]
    fn sender_without_address_is_none() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_company_from_sender(&from("Recruiting Team")), None);
        assert_eq!(
            extractor.extract_company_from_sender(&[MessageHeader::new("Subject", "x")]),
            None
        );
    }

    #[test]
    fn sender_header_name_ignores_case() {
        let extractor = FieldExtractor::new();
        let headers = vec![MessageHeader::new("from", "talent@lever.co")];
        assert_eq!(
            extractor.extract_company_from_sender(&headers),
            Some("Lever".to_string())
        );
    }

    #[test]
    fn position_from_role_phrase() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_position("", "Thanks for applying for Backend Engineer role at Acme"),
            "Backend Engineer"
        );
    }

    #[test]
    fn position_from_position_phrase() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_position("Your application for the Data Analyst position", ""),
            "Data Analyst"
        );
    }

    #[test]
    fn position_does_not_span_subject_and_body() {
        let extractor = FieldExtractor::new();
        assert_eq!(
            extractor.extract_position("Thanks for your application for the", "Analyst position"),
            UNKNOWN
        );
    }

    #[test]
    fn position_no_match_is_unknown() {
        let extractor = FieldExtractor::new();
        assert_eq!(extractor.extract_position("Hello", "World"), UNKNOWN);
    }

    #[test]
    fn capitalize_lowercases_tail() {
        assert_eq!(capitalize("gREENHOUSE"), "Greenhouse");
        assert_eq!(capitalize(""), "");
    }
}
