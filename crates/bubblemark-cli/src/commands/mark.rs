//! The `bubblemark mark` command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Table};

use bubblemark_core::engine::{MarkingEngine, StudentSheets};
use bubblemark_core::parser;
use bubblemark_core::report::StudentReport;

pub fn execute(
    config_path: PathBuf,
    reading: Option<PathBuf>,
    qrar: Option<PathBuf>,
    writing_score: f64,
    student: String,
    output: PathBuf,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        reading.is_some() || qrar.is_some(),
        "nothing to mark: pass --reading and/or --qrar"
    );
    anyhow::ensure!(
        writing_score.is_finite() && writing_score >= 0.0,
        "writing score must be a finite, non-negative number"
    );

    let config = parser::parse_marking_config(&config_path)?;
    let concepts = config.load_concepts()?;
    let engine = MarkingEngine::new(&config.answers, concepts.mapping)?;

    let sheets = StudentSheets {
        student_name: student,
        reading: reading.as_deref().map(parser::load_raw_response).transpose()?,
        qrar: qrar.as_deref().map(parser::load_raw_response).transpose()?,
        writing_score,
    };

    let marking = engine.mark_student(&sheets);
    let report = StudentReport::new(config.name, marking);

    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let stem = format!("{}-{timestamp}", file_slug(&report.student_name));

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("{stem}.md"));
                write_markdown(&report, &path)?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn write_markdown(report: &StudentReport, path: &Path) -> Result<()> {
    use anyhow::Context;

    std::fs::write(path, report.to_markdown())
        .with_context(|| format!("failed to write markdown report to {}", path.display()))
}

fn print_summary(report: &StudentReport) {
    let mut table = Table::new();
    table.set_header(vec!["Subject", "Score", "Max", "%", "Done well", "Needs improvement"]);

    for (subject, score) in &report.analysis.subject_scores {
        let summary = report.analysis.summary.get(subject);
        let join = |areas: Option<&Vec<String>>| areas.map(|a| a.join(", ")).unwrap_or_default();
        table.add_row(vec![
            Cell::new(subject),
            Cell::new(score.score),
            Cell::new(score.total),
            Cell::new(format!("{:.1}%", score.percentage)),
            Cell::new(join(summary.map(|s| &s.done_well))),
            Cell::new(join(summary.map(|s| &s.needs_improvement))),
        ]);
    }

    eprintln!("\n{}", report.student_name);
    eprintln!("{table}");
    eprintln!(
        "Writing: {}  Total: {}",
        report.analysis.writing_score, report.analysis.total_score
    );
}

/// Lowercase a student name into something safe for a file name.
pub(crate) fn file_slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if slug.is_empty() {
        "student".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_replaces_separators() {
        assert_eq!(file_slug("Sam Lee"), "sam-lee");
        assert_eq!(file_slug("O'Neil"), "o-neil");
        assert_eq!(file_slug("   "), "student");
    }
}
