//! Per-student marking orchestrator.
//!
//! Holds one session's read-only configuration (answer keys and concept
//! mapping) and runs the full pipeline for each student: score the Reading
//! sheet, score and split the combined QR/AR sheet, compile the analysis.
//! The engine has no interior mutability, so one instance can be shared
//! across threads marking different students.

use serde::{Deserialize, Serialize};

use crate::analysis::compile;
use crate::concepts::ConceptMapping;
use crate::error::ConfigError;
use crate::model::{AnswerKey, FullAnalysis, RawResponse, Subject, SubjectResult};
use crate::scorer::score;
use crate::splitter::{split, Section};

/// Answer lists for each subject of a session, in question order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAnswers {
    #[serde(default)]
    pub reading: Vec<String>,
    #[serde(default)]
    pub quantitative_reasoning: Vec<String>,
    #[serde(default)]
    pub abstract_reasoning: Vec<String>,
}

impl SessionAnswers {
    pub fn is_empty(&self) -> bool {
        self.reading.is_empty()
            && self.quantitative_reasoning.is_empty()
            && self.abstract_reasoning.is_empty()
    }

    /// Number of questions configured for `subject`.
    pub fn count(&self, subject: Subject) -> usize {
        self.answers(subject).len()
    }

    pub fn answers(&self, subject: Subject) -> &[String] {
        match subject {
            Subject::Reading => &self.reading,
            Subject::QuantitativeReasoning => &self.quantitative_reasoning,
            Subject::AbstractReasoning => &self.abstract_reasoning,
        }
    }
}

/// Detection output for one student's sheets.
#[derive(Debug, Clone, Default)]
pub struct StudentSheets {
    pub student_name: String,
    /// Reading sheet, if one was supplied.
    pub reading: Option<RawResponse>,
    /// Combined QR/AR sheet, if one was supplied.
    pub qrar: Option<RawResponse>,
    /// Manually assessed writing score.
    pub writing_score: f64,
}

/// Everything computed for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMarking {
    pub student_name: String,
    pub reading: SubjectResult,
    pub quantitative_reasoning: SubjectResult,
    pub abstract_reasoning: SubjectResult,
    pub analysis: FullAnalysis,
}

impl StudentMarking {
    /// Subject results in analysis order.
    pub fn subjects(&self) -> [&SubjectResult; 3] {
        [
            &self.reading,
            &self.quantitative_reasoning,
            &self.abstract_reasoning,
        ]
    }
}

/// The marking engine for one session.
#[derive(Debug, Clone)]
pub struct MarkingEngine {
    reading_key: Option<AnswerKey>,
    qrar_key: Option<AnswerKey>,
    qr_count: usize,
    ar_count: usize,
    concepts: ConceptMapping,
}

impl MarkingEngine {
    /// Build the engine, validating the answer keys up front.
    ///
    /// A subject with no answers is simply not marked; a session with no
    /// answers at all is rejected.
    pub fn new(answers: &SessionAnswers, concepts: ConceptMapping) -> Result<Self, ConfigError> {
        if answers.is_empty() {
            return Err(ConfigError::EmptyAnswerKey("session".into()));
        }

        let reading_key = if answers.reading.is_empty() {
            None
        } else {
            Some(AnswerKey::for_subject(Subject::Reading, &answers.reading)?)
        };

        let qr_count = answers.count(Subject::QuantitativeReasoning);
        let ar_count = answers.count(Subject::AbstractReasoning);
        let qrar_key = if qr_count + ar_count == 0 {
            None
        } else {
            Some(AnswerKey::combined(
                (
                    Subject::QuantitativeReasoning,
                    answers.quantitative_reasoning.as_slice(),
                ),
                (Subject::AbstractReasoning, answers.abstract_reasoning.as_slice()),
            )?)
        };

        tracing::debug!(
            reading = answers.reading.len(),
            qr = qr_count,
            ar = ar_count,
            concept_subjects = concepts.subjects.len(),
            "marking engine configured"
        );

        Ok(Self {
            reading_key,
            qrar_key,
            qr_count,
            ar_count,
            concepts,
        })
    }

    pub fn concepts(&self) -> &ConceptMapping {
        &self.concepts
    }

    /// Mark one student's sheets and compile their analysis.
    pub fn mark_student(&self, sheets: &StudentSheets) -> StudentMarking {
        let reading = match (&sheets.reading, &self.reading_key) {
            (Some(response), Some(key)) => score(Subject::Reading.name(), response, key),
            (Some(_), None) => {
                tracing::warn!(student = %sheets.student_name, "reading sheet supplied but no reading answers configured");
                SubjectResult::empty(Subject::Reading.name())
            }
            (None, _) => SubjectResult::empty(Subject::Reading.name()),
        };

        let (quantitative_reasoning, abstract_reasoning) = match (&sheets.qrar, &self.qrar_key) {
            (Some(response), Some(key)) => {
                let combined = score("QR/AR", response, key);
                split(
                    &combined,
                    Section::new(Subject::QuantitativeReasoning.name(), self.qr_count),
                    Section::new(Subject::AbstractReasoning.name(), self.ar_count),
                )
            }
            (Some(_), None) => {
                tracing::warn!(student = %sheets.student_name, "QR/AR sheet supplied but no QR/AR answers configured");
                empty_qrar()
            }
            (None, _) => empty_qrar(),
        };

        let analysis = compile(
            &reading,
            &quantitative_reasoning,
            &abstract_reasoning,
            &self.concepts,
            sheets.writing_score,
        );

        tracing::info!(
            student = %sheets.student_name,
            reading = reading.score,
            qr = quantitative_reasoning.score,
            ar = abstract_reasoning.score,
            writing = sheets.writing_score,
            "marked student"
        );

        StudentMarking {
            student_name: sheets.student_name.clone(),
            reading,
            quantitative_reasoning,
            abstract_reasoning,
            analysis,
        }
    }
}

fn empty_qrar() -> (SubjectResult, SubjectResult) {
    (
        SubjectResult::empty(Subject::QuantitativeReasoning.name()),
        SubjectResult::empty(Subject::AbstractReasoning.name()),
    )
}
