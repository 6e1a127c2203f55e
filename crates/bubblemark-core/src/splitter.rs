//! Splitting a combined sheet into independent subjects.
//!
//! One physical sheet can carry two subjects in a single label sequence
//! (Quantitative Reasoning followed by Abstract Reasoning). The already
//! scored questions are partitioned by position; nothing is re-scored.

use indexmap::IndexMap;

use crate::model::{QuestionResult, SubjectResult};

/// One section of a combined sheet.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub subject_name: &'a str,
    pub count: usize,
}

impl<'a> Section<'a> {
    pub fn new(subject_name: &'a str, count: usize) -> Self {
        Self {
            subject_name,
            count,
        }
    }
}

/// Split `combined` into its first `first.count` questions and the
/// `second.count` questions after them.
///
/// Counts beyond the available questions are clamped. Each half derives its
/// own score from its slice, so the two scores sum to the combined score
/// whenever the counts cover the whole sheet.
pub fn split(
    combined: &SubjectResult,
    first: Section<'_>,
    second: Section<'_>,
) -> (SubjectResult, SubjectResult) {
    let available = combined.results.len();
    let first_end = first.count.min(available);
    let second_end = first_end.saturating_add(second.count).min(available);

    if first.count.saturating_add(second.count) != available {
        tracing::warn!(
            subject = %combined.subject_name,
            available,
            first = first.count,
            second = second.count,
            "section counts do not cover the combined sheet"
        );
    }

    let first_result = slice(combined, first.subject_name, &combined.results[..first_end]);
    let second_result = slice(
        combined,
        second.subject_name,
        &combined.results[first_end..second_end],
    );
    (first_result, second_result)
}

fn slice(combined: &SubjectResult, subject_name: &str, results: &[QuestionResult]) -> SubjectResult {
    let response_map: IndexMap<String, String> = results
        .iter()
        .filter_map(|r| {
            combined
                .normalized_response_map
                .get(&r.label)
                .map(|v| (r.label.clone(), v.clone()))
        })
        .collect();
    SubjectResult::new(subject_name, results.to_vec(), response_map)
}
