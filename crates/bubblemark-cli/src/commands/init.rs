//! The `bubblemark init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("marking.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("concepts.json"), SAMPLE_CONCEPTS)?;

    std::fs::create_dir_all("sheets")?;
    write_if_missing(Path::new("sheets/reading-sample.json"), SAMPLE_READING_SHEET)?;

    println!("\nNext steps:");
    println!("  1. Fill in the answer lists in marking.toml");
    println!("  2. Map question numbers to learning areas in concepts.json");
    println!("  3. Run: bubblemark validate --config marking.toml");
    println!(
        "  4. Run: bubblemark mark --config marking.toml --reading sheets/reading-sample.json --format all"
    );

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# bubblemark marking configuration

[session]
name = "Sample Mock Exam"
concept_mapping = "concepts.json"

[answers]
reading = ["A", "C", "B", "D", "A", "E", "B", "C", "D", "A"]
quantitative_reasoning = ["B", "B", "D", "A", "C", "E"]
abstract_reasoning = ["C", "A", "E", "D"]
"#;

const SAMPLE_CONCEPTS: &str = r#"{
  "_instructions": "List the question numbers that belong to each learning area",
  "Reading": {
    "Understanding main ideas": ["1", "2", "6"],
    "Inference and deduction": ["3", "5", "8"],
    "Vocabulary context clues": ["4", "7", "9", "10"]
  },
  "Quantitative Reasoning": {
    "Geometry": ["1", "2", "3"],
    "Algebra": ["4", "5", "6"]
  },
  "Abstract Reasoning": {
    "Pattern recognition": ["1", "2", "3", "4"]
  },
  "score_config": {
    "reading_total": 10,
    "writing_total": 50,
    "qr_total": 6,
    "ar_total": 4,
    "total_max": 120
  }
}
"#;

const SAMPLE_READING_SHEET: &str = r#"{
  "q1": "A",
  "q2": "c",
  "q3": ["B", "D"],
  "q4": "D",
  "q5": null,
  "q6": "E",
  "q7": "A",
  "q8": "C",
  "q9": "D",
  "q10": "A"
}
"#;
