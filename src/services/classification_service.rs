//! Job-application classification.
//!
//! The [`ClassificationService`] asks a zero-shot classifier whether a
//! message is a job application and pulls the company and job title out of
//! entity recognition over the same text.

use std::sync::Arc;

use super::PipelineError;
use crate::domain::{ClassificationResult, UNKNOWN};
use crate::providers::nlp::{EntityRecognizer, EntitySpan, NlpError, ZeroShotClassifier};

/// Positive label.
pub const JOB_APPLICATION: &str = "Job Application";

/// Negative label.
pub const NOT_JOB_APPLICATION: &str = "Not Job Application";

/// Entity labels naming an organization.
const ORGANIZATION_LABELS: &[&str] = &["ORG"];

/// Entity labels naming a job title; only custom NER models emit these.
const JOB_TITLE_LABELS: &[&str] = &["JOB", "JOB_TITLE", "TITLE"];

/// Classifies messages and extracts model-derived fields.
pub struct ClassificationService {
    classifier: Arc<dyn ZeroShotClassifier>,
    recognizer: Arc<dyn EntityRecognizer>,
    labels: Vec<String>,
}

impl ClassificationService {
    /// Creates a service over the given models.
    pub fn new(classifier: Arc<dyn ZeroShotClassifier>, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            classifier,
            recognizer,
            labels: vec![JOB_APPLICATION.to_string(), NOT_JOB_APPLICATION.to_string()],
        }
    }

    /// Classifies one message.
    ///
    /// The text is `subject + " " + body`. The message is an application when
    /// [`JOB_APPLICATION`] ranks first. The company is the last organization
    /// entity and the job title the last job-title entity; either is
    /// [`UNKNOWN`] when no such entity is found.
    pub async fn classify(&self, subject: &str, body: &str) -> Result<ClassificationResult, PipelineError> {
        let text = format!("{} {}", subject, body);

        let (ranking, entities) = futures::try_join!(
            self.classifier.classify(&text, &self.labels),
            self.recognizer.recognize(&text),
        )?;

        let top = ranking.top_label().ok_or_else(|| {
            PipelineError::ClassificationFailed(NlpError::InvalidResponse(
                "classifier returned no labels".to_string(),
            ))
        })?;

        let result = ClassificationResult {
            is_application: top == JOB_APPLICATION,
            company_name: last_entity(&entities, ORGANIZATION_LABELS),
            job_title: last_entity(&entities, JOB_TITLE_LABELS),
        };

        tracing::debug!(
            subject,
            is_application = result.is_application,
            company = %result.company_name,
            "Classified message"
        );

        Ok(result)
    }
}

fn last_entity(entities: &[EntitySpan], labels: &[&str]) -> String {
    entities
        .iter()
        .rev()
        .find(|e| labels.iter().any(|l| e.label.eq_ignore_ascii_case(l)))
        .map(|e| e.text.clone())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::providers::nlp::{LabelScores, MockEntityRecognizer, MockZeroShotClassifier};

    fn ranking(top: &str, other: &str) -> LabelScores {
        LabelScores::ranked([(top.to_string(), 0.9), (other.to_string(), 0.1)])
    }

    fn service(ranking: LabelScores, entities: Vec<EntitySpan>) -> ClassificationService {
        let mut classifier = MockZeroShotClassifier::new();
        classifier
            .expect_classify()
            .withf(|text, labels| {
                text == "Thanks for applying We got it" && labels.len() == 2 && labels[0] == JOB_APPLICATION
            })
            .times(1)
            .returning(move |_, _| Ok(ranking.clone()));

        let mut recognizer = MockEntityRecognizer::new();
        recognizer
            .expect_recognize()
            .times(1)
            .returning(move |_| Ok(entities.clone()));

        ClassificationService::new(Arc::new(classifier), Arc::new(recognizer))
    }

    #[tokio::test]
    async fn positive_with_entities() {
        let service = service(
            ranking(JOB_APPLICATION, NOT_JOB_APPLICATION),
            vec![
                EntitySpan::new("ORG", "Greenhouse", 0.8),
                EntitySpan::new("PER", "Jane", 0.9),
                EntitySpan::new("ORG", "Acme", 0.95),
                EntitySpan::new("JOB", "Backend Engineer", 0.7),
            ],
        );

        let result = service.classify("Thanks for applying", "We got it").await.unwrap();

        assert_eq!(
            result,
            ClassificationResult {
                is_application: true,
                company_name: "Acme".to_string(),
                job_title: "Backend Engineer".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn negative_without_entities() {
        let service = service(ranking(NOT_JOB_APPLICATION, JOB_APPLICATION), vec![]);

        let result = service.classify("Thanks for applying", "We got it").await.unwrap();

        assert_eq!(result, ClassificationResult::unresolved(false));
    }

    #[tokio::test]
    async fn empty_ranking_is_an_error() {
        let service = service(LabelScores::default(), vec![]);

        let result = service.classify("Thanks for applying", "We got it").await;
        assert!(matches!(
            result,
            Err(PipelineError::ClassificationFailed(NlpError::InvalidResponse(_)))
        ));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let mut classifier = MockZeroShotClassifier::new();
        classifier
            .expect_classify()
            .returning(|_, _| Err(NlpError::Model("weights missing".to_string())));
        let mut recognizer = MockEntityRecognizer::new();
        recognizer.expect_recognize().returning(|_| Ok(vec![]));

        let service = ClassificationService::new(Arc::new(classifier), Arc::new(recognizer));
        let result = service.classify("a", "b").await;

        assert!(matches!(
            result,
            Err(PipelineError::ClassificationFailed(NlpError::Model(_)))
        ));
    }
}
