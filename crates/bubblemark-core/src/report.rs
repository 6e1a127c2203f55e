//! Marking report documents with JSON persistence and markdown summaries.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::StudentMarking;
use crate::model::{FullAnalysis, SubjectResult};
use crate::statistics::{compute_cohort_stats, CohortStats};

/// The marking report of one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Marking session name.
    pub session: String,
    pub student_name: String,
    /// Scored subjects in analysis order.
    pub subjects: Vec<SubjectResult>,
    pub analysis: FullAnalysis,
}

impl StudentReport {
    pub fn new(session: impl Into<String>, marking: StudentMarking) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session: session.into(),
            student_name: marking.student_name,
            subjects: vec![
                marking.reading,
                marking.quantitative_reasoning,
                marking.abstract_reasoning,
            ],
            analysis: marking.analysis,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.student_name));
        md.push_str(&format!(
            "**Total:** {} (writing {})\n\n",
            format_score(self.analysis.total_score),
            format_score(self.analysis.writing_score)
        ));

        md.push_str("| Subject | Score | Max | % |\n");
        md.push_str("|---------|-------|-----|---|\n");
        for (subject, score) in &self.analysis.subject_scores {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                subject, score.score, score.total, score.percentage
            ));
        }
        md.push_str(&format!(
            "| Writing | {} | - | - |\n\n",
            format_score(self.analysis.writing_score)
        ));

        for (subject, areas) in &self.analysis.subject_areas {
            if areas.is_empty() {
                continue;
            }
            md.push_str(&format!("### {subject}\n\n"));
            md.push_str("| Learning Area | Correct | % | Status | Questions |\n");
            md.push_str("|---------------|---------|---|--------|-----------|\n");
            for area in areas {
                md.push_str(&format!(
                    "| {} | {}/{} | {:.1}% | {} | {} |\n",
                    area.area, area.correct, area.total, area.percentage, area.status, area.question_numbers
                ));
            }
            md.push('\n');

            if let Some(summary) = self.analysis.summary.get(subject) {
                if !summary.unmapped_questions.is_empty() {
                    md.push_str(&format!(
                        "_Not in any learning area:_ {}\n\n",
                        summary.unmapped_questions.join(", ")
                    ));
                }
            }
        }

        md
    }
}

/// Outcome of one batch entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Success,
    Error,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Success => write!(f, "Success"),
            BatchStatus::Error => write!(f, "Error"),
        }
    }
}

/// One row of a batch: the student's scores, or why they could not be marked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub student_name: String,
    pub status: BatchStatus,
    pub writing_score: f64,
    pub reading_score: Option<usize>,
    pub qr_score: Option<usize>,
    pub ar_score: Option<usize>,
    #[serde(default)]
    pub notes: String,
    /// Full analysis, for successful entries.
    #[serde(default)]
    pub analysis: Option<FullAnalysis>,
}

impl BatchEntry {
    pub fn success(marking: &StudentMarking) -> Self {
        Self {
            student_name: marking.student_name.clone(),
            status: BatchStatus::Success,
            writing_score: marking.analysis.writing_score,
            reading_score: Some(marking.reading.score),
            qr_score: Some(marking.quantitative_reasoning.score),
            ar_score: Some(marking.abstract_reasoning.score),
            notes: String::new(),
            analysis: Some(marking.analysis.clone()),
        }
    }

    pub fn error(student_name: impl Into<String>, writing_score: f64, notes: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            status: BatchStatus::Error,
            writing_score,
            reading_score: None,
            qr_score: None,
            ar_score: None,
            notes: notes.into(),
            analysis: None,
        }
    }
}

/// The report of a marked batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub session: String,
    pub entries: Vec<BatchEntry>,
    /// Statistics over the successfully marked students.
    pub cohort: CohortStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchReport {
    /// Assemble a batch report. `markings` are the successfully marked
    /// students that feed the cohort statistics.
    pub fn new(
        session: impl Into<String>,
        entries: Vec<BatchEntry>,
        markings: &[StudentMarking],
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session: session.into(),
            entries,
            cohort: compute_cohort_stats(markings),
            duration_ms,
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        load_json(path)
    }

    /// Save the per-student summary rows as CSV, one row per entry.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create CSV summary at {}", path.display()))?;
        for entry in &self.entries {
            writer
                .serialize(SummaryRow::from(entry))
                .context("failed to write CSV summary row")?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to write CSV summary to {}", path.display()))?;
        Ok(())
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == BatchStatus::Error)
            .count()
    }
}

/// One line of the batch CSV summary.
#[derive(Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "Student Name")]
    student_name: &'a str,
    #[serde(rename = "Status")]
    status: BatchStatus,
    #[serde(rename = "Writing Score")]
    writing_score: String,
    #[serde(rename = "Reading Score")]
    reading_score: Option<usize>,
    #[serde(rename = "QR Score")]
    qr_score: Option<usize>,
    #[serde(rename = "AR Score")]
    ar_score: Option<usize>,
    #[serde(rename = "Notes")]
    notes: &'a str,
}

impl<'a> From<&'a BatchEntry> for SummaryRow<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        Self {
            student_name: &entry.student_name,
            status: entry.status,
            writing_score: format_score(entry.writing_score),
            reading_score: entry.reading_score,
            qr_score: entry.qr_score,
            ar_score: entry.ar_score,
            notes: &entry.notes,
        }
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse report JSON")
}

/// Whole numbers without a trailing `.0`.
fn format_score(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::ConceptMapping;
    use crate::engine::{MarkingEngine, SessionAnswers, StudentSheets};
    use crate::model::{RawResponse, RawValue};
    use serde_json::json;

    fn marking(name: &str, marks: &[&str]) -> StudentMarking {
        let answers = SessionAnswers {
            reading: vec!["A".into(), "B".into(), "C".into()],
            quantitative_reasoning: vec!["D".into()],
            ..Default::default()
        };
        let concepts = ConceptMapping::from_json(&json!({
            "Reading": { "Main ideas": ["1", "2"] }
        }))
        .unwrap();
        let engine = MarkingEngine::new(&answers, concepts).unwrap();
        let reading: RawResponse = marks
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("{}", i + 1), RawValue::Single(m.to_string())))
            .collect();
        engine.mark_student(&StudentSheets {
            student_name: name.into(),
            reading: Some(reading),
            qrar: None,
            writing_score: 35.5,
        })
    }

    #[test]
    fn json_roundtrip() {
        let report = StudentReport::new("mock", marking("Sam", &["A", "B", "D"]));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = StudentReport::load_json(&path).unwrap();

        assert_eq!(loaded.student_name, "Sam");
        assert_eq!(loaded.subjects.len(), 3);
        assert_eq!(loaded.analysis, report.analysis);
    }

    #[test]
    fn markdown_output() {
        let report = StudentReport::new("mock", marking("Sam", &["A", "B", "D"]));
        let md = report.to_markdown();
        assert!(md.contains("## Sam"));
        assert!(md.contains("**Total:** 37.5 (writing 35.5)"));
        assert!(md.contains("| Reading | 2 | 3 | 66.7% |"));
        assert!(md.contains("| Main ideas | 2/2 | 100.0% | Done well | 1, 2 |"));
        assert!(md.contains("_Not in any learning area:_ RC3"));
    }

    #[test]
    fn batch_report_counts_failures() {
        let ok = marking("Sam", &["A", "B", "C"]);
        let entries = vec![
            BatchEntry::success(&ok),
            BatchEntry::error("Alex", 20.0, "failed to read detection output"),
        ];
        let report = BatchReport::new("mock", entries, &[ok], 5);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.cohort.students, 1);
        assert_eq!(report.entries[0].reading_score, Some(3));
        assert_eq!(report.entries[1].status.to_string(), "Error");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[1].notes, "failed to read detection output");
    }

    #[test]
    fn batch_csv_summary() {
        let ok = marking("Sam", &["A", "B", "C"]);
        let entries = vec![
            BatchEntry::success(&ok),
            BatchEntry::error("Alex, Jr.", 20.0, "failed to read detection output"),
        ];
        let report = BatchReport::new("mock", entries, &[ok], 5);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        report.save_csv(&path).unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Student Name,Status,Writing Score,Reading Score,QR Score,AR Score,Notes",
                "Sam,Success,35.5,3,0,0,",
                "\"Alex, Jr.\",Error,20,,,,failed to read detection output",
            ]
        );
    }

    #[test]
    fn load_missing_report_fails() {
        assert!(StudentReport::load_json(Path::new("no_such_report.json")).is_err());
    }
}
