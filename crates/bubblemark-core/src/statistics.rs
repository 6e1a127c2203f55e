//! Cohort statistics across a batch of marked students.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::StudentMarking;
use crate::model::{MasteryStatus, Subject};

/// Aggregate statistics for a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    /// Number of students included.
    pub students: usize,
    /// Mean writing score.
    pub avg_writing_score: f64,
    /// Subject name → statistics, in analysis order.
    pub per_subject: IndexMap<String, SubjectStats>,
}

/// Statistics for one subject across the cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    /// Students who were marked in this subject.
    #[serde(default)]
    pub students: usize,
    /// Mean raw score.
    pub avg_score: f64,
    /// Mean percentage correct.
    pub avg_percentage: f64,
    /// Area name → fraction of students rated "Done well", in [0, 1].
    pub done_well_rate: IndexMap<String, f64>,
}

/// Compute cohort statistics from marked students.
///
/// Subject figures cover only the students marked in that subject; a student
/// with no sheet for it does not count as scoring zero. An empty batch gives
/// zeroed statistics.
pub fn compute_cohort_stats(markings: &[StudentMarking]) -> CohortStats {
    let avg_writing_score = mean(markings.iter().map(|m| m.analysis.writing_score));

    let mut per_subject = IndexMap::new();
    for (i, subject) in Subject::ALL.iter().enumerate() {
        let name = subject.name();
        let sat: Vec<&StudentMarking> = markings
            .iter()
            .filter(|m| m.subjects()[i].total_questions > 0)
            .collect();

        let avg_score = mean(sat.iter().map(|m| m.subjects()[i].score as f64));
        let avg_percentage = mean(sat.iter().map(|m| m.subjects()[i].percentage()));

        // Area order follows the first student that has the area.
        let mut done_well: IndexMap<String, usize> = IndexMap::new();
        for marking in &sat {
            let Some(areas) = marking.analysis.subject_areas.get(name) else {
                continue;
            };
            for area in areas {
                let count = done_well.entry(area.area.clone()).or_insert(0);
                if area.status == MasteryStatus::DoneWell {
                    *count += 1;
                }
            }
        }
        let done_well_rate = done_well
            .into_iter()
            .map(|(area, count)| (area, count as f64 / sat.len() as f64))
            .collect();

        per_subject.insert(
            name.to_string(),
            SubjectStats {
                students: sat.len(),
                avg_score,
                avg_percentage,
                done_well_rate,
            },
        );
    }

    CohortStats {
        students: markings.len(),
        avg_writing_score,
        per_subject,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::ConceptMapping;
    use crate::engine::{MarkingEngine, SessionAnswers, StudentSheets};
    use crate::model::{RawResponse, RawValue};
    use serde_json::json;

    fn engine() -> MarkingEngine {
        let answers = SessionAnswers {
            reading: vec!["A".into(), "B".into()],
            ..Default::default()
        };
        let concepts = ConceptMapping::from_json(&json!({
            "Reading": { "Main ideas": ["1"], "Details": ["2"] }
        }))
        .unwrap();
        MarkingEngine::new(&answers, concepts).unwrap()
    }

    fn student(name: &str, marks: &[&str], writing: f64) -> StudentSheets {
        let reading: RawResponse = marks
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("RC{}", i + 1), RawValue::Single(m.to_string())))
            .collect();
        StudentSheets {
            student_name: name.into(),
            reading: Some(reading),
            qrar: None,
            writing_score: writing,
        }
    }

    #[test]
    fn averages_and_done_well_rates() {
        let engine = engine();
        let markings: Vec<StudentMarking> = [
            student("a", &["A", "B"], 40.0),
            student("b", &["A", "C"], 30.0),
            student("c", &["D", "C"], 20.0),
            student("d", &["A", "B"], 10.0),
        ]
        .iter()
        .map(|s| engine.mark_student(s))
        .collect();

        let stats = compute_cohort_stats(&markings);
        assert_eq!(stats.students, 4);
        assert_eq!(stats.per_subject["Reading"].students, 4);
        assert!((stats.avg_writing_score - 25.0).abs() < f64::EPSILON);

        let reading = &stats.per_subject["Reading"];
        assert!((reading.avg_score - 1.25).abs() < f64::EPSILON);
        assert!((reading.avg_percentage - 62.5).abs() < f64::EPSILON);
        assert!((reading.done_well_rate["Main ideas"] - 0.75).abs() < f64::EPSILON);
        assert!((reading.done_well_rate["Details"] - 0.5).abs() < f64::EPSILON);
        for rate in reading.done_well_rate.values() {
            assert!((0.0..=1.0).contains(rate));
        }
    }

    #[test]
    fn subject_averages_skip_students_without_the_sheet() {
        let answers = SessionAnswers {
            reading: vec!["A".into()],
            quantitative_reasoning: vec!["B".into()],
            ..Default::default()
        };
        let concepts = ConceptMapping::from_json(&json!({
            "Quantitative Reasoning": { "Algebra": ["1"] }
        }))
        .unwrap();
        let engine = MarkingEngine::new(&answers, concepts).unwrap();

        let with_qrar = StudentSheets {
            student_name: "a".into(),
            reading: None,
            qrar: Some(RawResponse::from([("QR1".to_string(), RawValue::Single("B".into()))])),
            writing_score: 30.0,
        };
        let reading_only = student("b", &["A"], 20.0);
        let markings = vec![engine.mark_student(&with_qrar), engine.mark_student(&reading_only)];

        let stats = compute_cohort_stats(&markings);
        assert_eq!(stats.students, 2);

        let qr = &stats.per_subject["Quantitative Reasoning"];
        assert_eq!(qr.students, 1);
        assert_eq!(qr.avg_score, 1.0);
        assert_eq!(qr.avg_percentage, 100.0);
        assert_eq!(qr.done_well_rate["Algebra"], 1.0);

        let reading = &stats.per_subject["Reading"];
        assert_eq!(reading.students, 1);
        assert_eq!(reading.avg_percentage, 100.0);

        let ar = &stats.per_subject["Abstract Reasoning"];
        assert_eq!(ar.students, 0);
        assert_eq!(ar.avg_percentage, 0.0);
    }

    #[test]
    fn empty_batch_is_zeroed() {
        let stats = compute_cohort_stats(&[]);
        assert_eq!(stats.students, 0);
        assert_eq!(stats.avg_writing_score, 0.0);
        assert_eq!(stats.per_subject.len(), 3);
        assert!(stats.per_subject["Reading"].done_well_rate.is_empty());
    }
}
