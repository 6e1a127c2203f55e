//! The `bubblemark validate` command.

use std::path::PathBuf;

use anyhow::Result;

use bubblemark_core::engine::MarkingEngine;
use bubblemark_core::model::Subject;
use bubblemark_core::parser;

pub fn execute(config_path: PathBuf) -> Result<()> {
    let config = parser::parse_marking_config(&config_path)?;

    let counts: Vec<String> = Subject::ALL
        .iter()
        .map(|s| format!("{} {}", s.label_prefix(), config.answers.count(*s)))
        .collect();
    println!("Marking config: {} ({})", config.name, counts.join(", "));

    let concepts = match &config.concept_mapping_path {
        Some(path) => {
            let file = parser::load_concept_file(path)?;
            println!(
                "Concept mapping: {} ({} subject(s))",
                path.display(),
                file.mapping.subjects.len()
            );
            Some(file)
        }
        None => {
            println!("Concept mapping: none");
            None
        }
    };

    // Structural errors are fatal, exactly as they would be when marking.
    MarkingEngine::new(
        &config.answers,
        concepts.as_ref().map(|c| c.mapping.clone()).unwrap_or_default(),
    )?;

    let warnings = parser::validate_config(&config, concepts.as_ref());
    for w in &warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|s| format!("  [{s}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Config valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
