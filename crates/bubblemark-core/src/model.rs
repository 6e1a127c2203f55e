//! Core data model types for bubblemark.
//!
//! These types flow through the marking pipeline: answer keys and raw
//! detection output go in, per-question results, subject results and the
//! cross-subject analysis come out. Field names of everything serialized
//! here are relied on by downstream report renderers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Mastery cutoff, in percent. Inclusive.
pub const MASTERY_THRESHOLD: f64 = 51.0;

/// The marked subjects of an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Reading")]
    Reading,
    #[serde(rename = "Quantitative Reasoning")]
    QuantitativeReasoning,
    #[serde(rename = "Abstract Reasoning")]
    AbstractReasoning,
}

impl Subject {
    /// All subjects in analysis order.
    pub const ALL: [Subject; 3] = [
        Subject::Reading,
        Subject::QuantitativeReasoning,
        Subject::AbstractReasoning,
    ];

    /// Display name, also used as the concept-mapping key.
    pub fn name(&self) -> &'static str {
        match self {
            Subject::Reading => "Reading",
            Subject::QuantitativeReasoning => "Quantitative Reasoning",
            Subject::AbstractReasoning => "Abstract Reasoning",
        }
    }

    /// Prefix used when generating answer-key labels.
    pub fn label_prefix(&self) -> &'static str {
        match self {
            Subject::Reading => "RC",
            Subject::QuantitativeReasoning => "QR",
            Subject::AbstractReasoning => "AR",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reading" | "rc" => Ok(Subject::Reading),
            "quantitative reasoning" | "qr" => Ok(Subject::QuantitativeReasoning),
            "abstract reasoning" | "ar" => Ok(Subject::AbstractReasoning),
            other => Err(format!("unknown subject: {other}")),
        }
    }
}

/// One question of an answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub label: String,
    pub answer: String,
}

/// Ordered mapping of question label to expected answer.
///
/// Labels are unique and the key is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerKey {
    entries: IndexMap<String, String>,
}

impl AnswerKey {
    /// Build a key from `(label, answer)` pairs, preserving their order.
    pub fn new<I, L, A>(name: &str, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (L, A)>,
        L: Into<String>,
        A: Into<String>,
    {
        let mut map = IndexMap::new();
        for (label, answer) in entries {
            let label = label.into();
            if map.contains_key(&label) {
                return Err(ConfigError::DuplicateLabel(label));
            }
            map.insert(label, answer.into());
        }
        if map.is_empty() {
            return Err(ConfigError::EmptyAnswerKey(name.to_string()));
        }
        Ok(Self { entries: map })
    }

    /// Build a key for one subject, labelling questions `RC1`, `RC2`, ...
    pub fn for_subject<A: AsRef<str>>(subject: Subject, answers: &[A]) -> Result<Self, ConfigError> {
        Self::new(subject.name(), prefixed_labels(subject, answers))
    }

    /// Build the key of a combined sheet: all of `first`'s questions
    /// followed by all of `second`'s, each with its own label prefix.
    pub fn combined<A: AsRef<str>>(
        first: (Subject, &[A]),
        second: (Subject, &[A]),
    ) -> Result<Self, ConfigError> {
        let name = format!("{}/{}", first.0.label_prefix(), second.0.label_prefix());
        let entries = prefixed_labels(first.0, first.1).chain(prefixed_labels(second.0, second.1));
        Self::new(&name, entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(label, answer)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, a)| (l.as_str(), a.as_str()))
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }
}

fn prefixed_labels<A: AsRef<str>>(
    subject: Subject,
    answers: &[A],
) -> impl Iterator<Item = (String, String)> + '_ {
    answers.iter().enumerate().map(move |(i, a)| {
        (
            format!("{}{}", subject.label_prefix(), i + 1),
            a.as_ref().to_string(),
        )
    })
}

/// One field of raw detection output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Nothing detected.
    Absent,
    /// A single bubble value.
    Single(String),
    /// Several bubbles filled for one field.
    Multiple(Vec<String>),
}

impl RawValue {
    /// Convert one JSON detection value. Numbers are taken as their decimal
    /// text; objects and booleans are rejected.
    pub fn from_json(label: &str, value: &serde_json::Value) -> Result<Self, ConfigError> {
        use serde_json::Value;

        let scalar = |v: &Value| -> Result<String, ConfigError> {
            match v {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(ConfigError::InvalidRawResponse {
                    label: label.to_string(),
                    reason: format!("expected a string, found {}", json_kind(other)),
                }),
            }
        };

        match value {
            Value::Null => Ok(RawValue::Absent),
            Value::Array(items) => Ok(RawValue::Multiple(
                items.iter().map(scalar).collect::<Result<_, _>>()?,
            )),
            other => scalar(other).map(RawValue::Single),
        }
    }
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Detection output for one sheet, keyed by the detection engine's field
/// labels. Sorted so every scan over it is reproducible.
pub type RawResponse = BTreeMap<String, RawValue>;

/// The scored outcome of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Answer-key label.
    pub label: String,
    /// Canonical marked value: `""`, `"B"`, or `"A,C"` for a multi-mark.
    pub normalized_marked_value: String,
    /// Expected answer from the key.
    pub correct_value: String,
    pub is_correct: bool,
    /// More than one bubble was filled.
    #[serde(default)]
    pub multi_marked: bool,
}

/// Scored results for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub subject_name: String,
    pub score: usize,
    pub total_questions: usize,
    pub results: Vec<QuestionResult>,
    /// Label → canonical marked value, in answer-key order.
    #[serde(default)]
    pub normalized_response_map: IndexMap<String, String>,
}

impl SubjectResult {
    /// Assemble a subject result, deriving `score` and `total_questions`
    /// from `results`.
    pub fn new(
        subject_name: impl Into<String>,
        results: Vec<QuestionResult>,
        normalized_response_map: IndexMap<String, String>,
    ) -> Self {
        let score = results.iter().filter(|r| r.is_correct).count();
        Self {
            subject_name: subject_name.into(),
            score,
            total_questions: results.len(),
            results,
            normalized_response_map,
        }
    }

    /// A subject with no scored questions, used when a sheet was not supplied.
    pub fn empty(subject_name: impl Into<String>) -> Self {
        Self::new(subject_name, Vec::new(), IndexMap::new())
    }

    /// Percentage of questions answered correctly; 0.0 for an empty subject.
    pub fn percentage(&self) -> f64 {
        percentage(self.score, self.total_questions)
    }
}

/// `100 * part / whole`, or 0.0 when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

/// Whether a learning area has been mastered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasteryStatus {
    #[serde(rename = "Done well")]
    DoneWell,
    #[serde(rename = "Needs improvement")]
    NeedsImprovement,
}

impl MasteryStatus {
    /// Classify a percentage against [`MASTERY_THRESHOLD`].
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= MASTERY_THRESHOLD {
            MasteryStatus::DoneWell
        } else {
            MasteryStatus::NeedsImprovement
        }
    }
}

impl fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasteryStatus::DoneWell => write!(f, "Done well"),
            MasteryStatus::NeedsImprovement => write!(f, "Needs improvement"),
        }
    }
}

/// Performance in one learning area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAreaResult {
    pub area: String,
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
    pub status: MasteryStatus,
    /// Question numbers of the area, in authored order, joined by `", "`.
    pub question_numbers: String,
}

impl LearningAreaResult {
    pub fn new(area: impl Into<String>, correct: usize, total: usize, question_numbers: String) -> Self {
        let percentage = percentage(correct, total);
        Self {
            area: area.into(),
            correct,
            total,
            percentage,
            status: MasteryStatus::from_percentage(percentage),
            question_numbers,
        }
    }
}

/// Concept breakdown of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAnalysis {
    pub subject: String,
    pub areas: Vec<LearningAreaResult>,
    /// Scored labels that no area covers.
    pub unmapped_questions: Vec<String>,
}

/// Area names of one subject partitioned by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub done_well: Vec<String>,
    pub needs_improvement: Vec<String>,
    pub unmapped_questions: Vec<String>,
}

/// Raw score of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub score: usize,
    pub total: usize,
    pub percentage: f64,
}

/// The complete cross-subject analysis of one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    /// Subject name → learning areas, in analysis order.
    pub subject_areas: IndexMap<String, Vec<LearningAreaResult>>,
    /// Subject name → area names by status.
    pub summary: IndexMap<String, SubjectSummary>,
    /// Subject name → raw score.
    #[serde(default)]
    pub subject_scores: IndexMap<String, SubjectScore>,
    /// Manually assessed writing score, carried through unchanged.
    #[serde(default)]
    pub writing_score: f64,
    /// Sum of subject scores and the writing score.
    #[serde(default)]
    pub total_score: f64,
}
