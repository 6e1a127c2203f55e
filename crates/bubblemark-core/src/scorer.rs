//! Scoring of one sheet against an answer key.

use indexmap::IndexMap;

use crate::model::{AnswerKey, QuestionResult, RawResponse, SubjectResult};
use crate::normalizer::normalize;
use crate::resolver::resolve;

/// Score `response` against `key`, question by question in key order.
///
/// Labels missing from the response are scored as blank and incorrect.
pub fn score(subject_name: &str, response: &RawResponse, key: &AnswerKey) -> SubjectResult {
    let mut results = Vec::with_capacity(key.len());
    let mut response_map = IndexMap::with_capacity(key.len());

    for (label, correct) in key.iter() {
        let raw = resolve(response, label);
        if raw.is_none() {
            tracing::debug!(subject = subject_name, label, "no detection field for label");
        }

        let marked = normalize(raw);
        if marked.is_multi_mark() {
            tracing::debug!(subject = subject_name, label, marks = %marked, "multi-mark scored incorrect");
        }

        let is_correct = marked.matches(correct);
        let marked_value = marked.to_string();
        response_map.insert(label.to_string(), marked_value.clone());
        results.push(QuestionResult {
            label: label.to_string(),
            normalized_marked_value: marked_value,
            correct_value: correct.to_string(),
            is_correct,
            multi_marked: marked.is_multi_mark(),
        });
    }

    let result = SubjectResult::new(subject_name, results, response_map);
    tracing::debug!(
        subject = subject_name,
        score = result.score,
        total = result.total_questions,
        "scored sheet"
    );
    result
}
