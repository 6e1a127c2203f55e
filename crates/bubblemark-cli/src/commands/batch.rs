//! The `bubblemark batch` command.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use comfy_table::{Cell, Table};

use bubblemark_core::engine::{MarkingEngine, StudentMarking, StudentSheets};
use bubblemark_core::parser::{self, ManifestStudent};
use bubblemark_core::report::{BatchEntry, BatchReport, StudentReport};

use super::mark::file_slug;

pub fn execute(config_path: PathBuf, manifest_path: PathBuf, output: PathBuf) -> Result<()> {
    let start = Instant::now();

    let config = parser::parse_marking_config(&config_path)?;
    let concepts = config.load_concepts()?;
    let engine = MarkingEngine::new(&config.answers, concepts.mapping)?;
    let manifest = parser::load_manifest(&manifest_path)?;

    eprintln!(
        "bubblemark v{}: marking {} student(s) for {}",
        env!("CARGO_PKG_VERSION"),
        manifest.students.len(),
        config.name
    );

    std::fs::create_dir_all(&output)?;

    let mut entries = Vec::with_capacity(manifest.students.len());
    let mut markings = Vec::new();
    let mut used_stems = HashSet::new();

    for student in &manifest.students {
        let sheets = match load_sheets(student) {
            Ok(sheets) => sheets,
            Err(e) => {
                entries.push(failed(student, e));
                continue;
            }
        };

        let marking = engine.mark_student(&sheets);
        let stem = unique_stem(&mut used_stems, &file_slug(&marking.student_name));
        let path = output.join(format!("{stem}.json"));
        match StudentReport::new(config.name.clone(), marking.clone()).save_json(&path) {
            Ok(()) => {
                entries.push(BatchEntry::success(&marking));
                markings.push(marking);
            }
            Err(e) => entries.push(failed(student, e)),
        }
    }

    let report = BatchReport::new(
        config.name,
        entries,
        &markings,
        start.elapsed().as_millis() as u64,
    );

    print_summary(&report, &markings);

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("batch-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Batch report: {}", path.display());
    let csv_path = output.join(format!("batch-{timestamp}.csv"));
    report.save_csv(&csv_path)?;
    eprintln!("Batch summary: {}", csv_path.display());

    eprintln!(
        "\nComplete: {}/{} marked, {} failed ({:.1}s)",
        report.entries.len() - report.failures(),
        report.entries.len(),
        report.failures(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

fn failed(student: &ManifestStudent, e: anyhow::Error) -> BatchEntry {
    eprintln!("  ERROR: {}: {e:#}", student.name);
    BatchEntry::error(student.name.clone(), student.writing_score, format!("{e:#}"))
}

/// First of `slug`, `slug-2`, `slug-3`, ... not yet handed out.
fn unique_stem(used: &mut HashSet<String>, slug: &str) -> String {
    let mut stem = slug.to_string();
    let mut n = 1;
    while !used.insert(stem.clone()) {
        n += 1;
        stem = format!("{slug}-{n}");
    }
    stem
}

/// Load a manifest student's sheets. A student with no sheet files at all is
/// an error rather than an all-zero marking.
fn load_sheets(student: &ManifestStudent) -> Result<StudentSheets> {
    anyhow::ensure!(
        student.reading_file.is_some() || student.qrar_file.is_some(),
        "no sheet files listed"
    );

    Ok(StudentSheets {
        student_name: student.name.clone(),
        reading: student
            .reading_file
            .as_deref()
            .map(parser::load_raw_response)
            .transpose()?,
        qrar: student
            .qrar_file
            .as_deref()
            .map(parser::load_raw_response)
            .transpose()?,
        writing_score: student.writing_score,
    })
}

fn print_summary(report: &BatchReport, markings: &[StudentMarking]) {
    let mut table = Table::new();
    table.set_header(vec!["Student", "Status", "Writing", "Reading", "QR", "AR", "Total", "Notes"]);

    let score = |s: Option<usize>| s.map(|v| v.to_string()).unwrap_or_else(|| "-".into());

    for entry in &report.entries {
        let total = entry
            .analysis
            .as_ref()
            .map(|a| a.total_score.to_string())
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(&entry.student_name),
            Cell::new(entry.status),
            Cell::new(entry.writing_score),
            Cell::new(score(entry.reading_score)),
            Cell::new(score(entry.qr_score)),
            Cell::new(score(entry.ar_score)),
            Cell::new(total),
            Cell::new(&entry.notes),
        ]);
    }

    eprintln!("\n{table}");

    if markings.is_empty() {
        return;
    }

    let mut cohort = Table::new();
    cohort.set_header(vec!["Subject", "Avg score", "Avg %"]);
    for (subject, stats) in &report.cohort.per_subject {
        cohort.add_row(vec![
            Cell::new(subject),
            Cell::new(format!("{:.1}", stats.avg_score)),
            Cell::new(format!("{:.1}%", stats.avg_percentage)),
        ]);
    }
    eprintln!(
        "\nCohort ({} students, avg writing {:.1})",
        report.cohort.students, report.cohort.avg_writing_score
    );
    eprintln!("{cohort}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_slugs_get_suffixes() {
        let mut used = HashSet::new();
        assert_eq!(unique_stem(&mut used, "sam-lee"), "sam-lee");
        assert_eq!(unique_stem(&mut used, "sam-lee"), "sam-lee-2");
        assert_eq!(unique_stem(&mut used, "sam-lee-2"), "sam-lee-2-2");
        assert_eq!(unique_stem(&mut used, "sam-lee"), "sam-lee-3");
    }
}
