//! Concept mapping and per-area mastery aggregation.
//!
//! A concept mapping assigns each subject's questions to named learning
//! areas. It is authored by a content team with its own numbering
//! (`"q1"`, `"RC1"`, `"1"`), so question identifiers and scored labels are
//! compared by their digits only.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::model::{json_kind, LearningAreaResult, QuestionResult, SubjectAnalysis};

/// One learning area and the questions that make it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptArea {
    pub name: String,
    /// Question identifiers in authored order.
    pub question_ids: Vec<String>,
}

/// The learning areas of one subject, in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConcepts {
    pub subject: String,
    pub areas: Vec<ConceptArea>,
}

/// Subject → area → question identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMapping {
    pub subjects: Vec<SubjectConcepts>,
}

/// Top-level keys that hold report settings rather than subjects.
pub const RESERVED_SECTIONS: [&str; 3] = ["score_config", "school_minimum_scores", "journey_stages"];

impl ConceptMapping {
    /// Build a mapping from its JSON form.
    ///
    /// Keys starting with `_` are instructions for authors and are skipped at
    /// every level, as are [`RESERVED_SECTIONS`]. Anything else must have the
    /// subject → area → list-of-ids shape.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let root = value
            .as_object()
            .ok_or_else(|| ConfigError::mapping("$", format!("expected an object, found {}", json_kind(value))))?;

        let mut subjects = Vec::new();
        for (subject, areas_value) in root {
            if is_metadata(subject) || RESERVED_SECTIONS.contains(&subject.as_str()) {
                continue;
            }
            let areas_obj = areas_value.as_object().ok_or_else(|| {
                ConfigError::mapping(
                    subject.as_str(),
                    format!("expected an object of areas, found {}", json_kind(areas_value)),
                )
            })?;

            let mut areas = Vec::new();
            for (area, ids_value) in areas_obj {
                if is_metadata(area) {
                    continue;
                }
                let path = format!("{subject}.{area}");
                let ids = ids_value.as_array().ok_or_else(|| {
                    ConfigError::mapping(
                        path.as_str(),
                        format!("expected a list of question ids, found {}", json_kind(ids_value)),
                    )
                })?;
                let question_ids = ids
                    .iter()
                    .map(|id| match id {
                        Value::String(s) => Ok(s.clone()),
                        Value::Number(n) if n.is_u64() => Ok(n.to_string()),
                        other => Err(ConfigError::mapping(
                            path.as_str(),
                            format!("question id must be a string or integer, found {}", json_kind(other)),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                areas.push(ConceptArea {
                    name: area.clone(),
                    question_ids,
                });
            }
            subjects.push(SubjectConcepts {
                subject: subject.clone(),
                areas,
            });
        }

        Ok(Self { subjects })
    }

    /// Areas of `subject`, if the mapping covers it.
    pub fn subject(&self, subject: &str) -> Option<&SubjectConcepts> {
        self.subjects.iter().find(|s| s.subject == subject)
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

fn is_metadata(key: &str) -> bool {
    key.starts_with('_')
}

/// Keep only the ASCII digits of a label or identifier.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Fold one subject's scored questions into its learning areas.
///
/// Without concepts for the subject there are no areas and every scored
/// label is reported unmapped. When two labels share a number, the first one
/// in `results` decides that number's correctness.
pub fn aggregate(
    subject_name: &str,
    results: &[QuestionResult],
    concepts: Option<&SubjectConcepts>,
) -> SubjectAnalysis {
    let mut correct_by_number: HashMap<String, bool> = HashMap::with_capacity(results.len());
    for r in results {
        let number = digits_only(&r.label);
        if !number.is_empty() {
            correct_by_number.entry(number).or_insert(r.is_correct);
        }
    }

    let areas = concepts.map(|c| c.areas.as_slice()).unwrap_or_default();
    let mut covered: HashSet<String> = HashSet::new();

    let area_results: Vec<LearningAreaResult> = areas
        .iter()
        .map(|area| {
            let numbers: Vec<String> = area.question_ids.iter().map(|id| digits_only(id)).collect();
            let correct = numbers
                .iter()
                .filter(|n| correct_by_number.get(n.as_str()).copied().unwrap_or(false))
                .count();
            let question_numbers = numbers
                .iter()
                .filter(|n| !n.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            covered.extend(numbers.into_iter().filter(|n| !n.is_empty()));
            LearningAreaResult::new(area.name.clone(), correct, area.question_ids.len(), question_numbers)
        })
        .collect();

    let unmapped_questions: Vec<String> = results
        .iter()
        .filter(|r| {
            let number = digits_only(&r.label);
            number.is_empty() || !covered.contains(&number)
        })
        .map(|r| r.label.clone())
        .collect();

    if concepts.is_none() && !results.is_empty() {
        tracing::warn!(subject = subject_name, "no concept mapping for subject");
    } else if !unmapped_questions.is_empty() {
        tracing::debug!(
            subject = subject_name,
            count = unmapped_questions.len(),
            "questions not covered by any learning area"
        );
    }

    SubjectAnalysis {
        subject: subject_name.to_string(),
        areas: area_results,
        unmapped_questions,
    }
}
