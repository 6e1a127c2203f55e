//! Session configuration and detection file loading.
//!
//! Loads marking configs (TOML), concept files (JSON), detection output
//! (JSON) and batch manifests, and validates configs for common authoring
//! mistakes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::concepts::{digits_only, ConceptMapping};
use crate::engine::SessionAnswers;
use crate::model::{RawResponse, RawValue, Subject};

/// Intermediate TOML structure for marking config files.
#[derive(Debug, Deserialize)]
struct TomlMarkingFile {
    #[serde(default)]
    session: TomlSessionHeader,
    #[serde(default)]
    answers: SessionAnswers,
}

#[derive(Debug, Default, Deserialize)]
struct TomlSessionHeader {
    #[serde(default)]
    name: String,
    #[serde(default)]
    concept_mapping: Option<PathBuf>,
}

/// A loaded marking configuration.
#[derive(Debug, Clone)]
pub struct MarkingConfig {
    /// Human-readable session name.
    pub name: String,
    /// Answer lists per subject.
    pub answers: SessionAnswers,
    /// Concept file location, resolved against the config's directory.
    pub concept_mapping_path: Option<PathBuf>,
}

impl MarkingConfig {
    /// Load the configured concept file, or an empty one if none is set.
    pub fn load_concepts(&self) -> Result<ConceptFile> {
        match &self.concept_mapping_path {
            Some(path) => load_concept_file(path),
            None => Ok(ConceptFile::default()),
        }
    }
}

/// Parse a marking config file.
pub fn parse_marking_config(path: &Path) -> Result<MarkingConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read marking config: {}", path.display()))?;

    parse_marking_config_str(&content, path)
}

/// Parse a marking config from a string. Relative concept-mapping paths are
/// resolved against `source_path`'s directory.
pub fn parse_marking_config_str(content: &str, source_path: &Path) -> Result<MarkingConfig> {
    let parsed: TomlMarkingFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let base = source_path.parent().unwrap_or_else(|| Path::new(""));
    let concept_mapping_path = parsed.session.concept_mapping.map(|p| {
        if p.is_absolute() {
            p
        } else {
            base.join(p)
        }
    });

    let name = if parsed.session.name.is_empty() {
        source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        parsed.session.name
    };

    Ok(MarkingConfig {
        name,
        answers: parsed.answers,
        concept_mapping_path,
    })
}

/// Section maximums used by report renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_section_total")]
    pub reading_total: u32,
    #[serde(default = "default_writing_total")]
    pub writing_total: u32,
    #[serde(default = "default_section_total")]
    pub qr_total: u32,
    #[serde(default = "default_section_total")]
    pub ar_total: u32,
    #[serde(default = "default_total_max")]
    pub total_max: u32,
}

fn default_section_total() -> u32 {
    35
}

fn default_writing_total() -> u32 {
    50
}

fn default_total_max() -> u32 {
    400
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            reading_total: default_section_total(),
            writing_total: default_writing_total(),
            qr_total: default_section_total(),
            ar_total: default_section_total(),
            total_max: default_total_max(),
        }
    }
}

impl ScoreConfig {
    /// Configured maximum for a bubble-marked subject.
    pub fn total_for(&self, subject: Subject) -> u32 {
        match subject {
            Subject::Reading => self.reading_total,
            Subject::QuantitativeReasoning => self.qr_total,
            Subject::AbstractReasoning => self.ar_total,
        }
    }
}

/// A concept file: the mapping plus report settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptFile {
    pub mapping: ConceptMapping,
    /// Present only if the file has a `score_config` section.
    pub score_config: Option<ScoreConfig>,
}

/// Load a concept file from disk.
pub fn load_concept_file(path: &Path) -> Result<ConceptFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read concept file: {}", path.display()))?;

    parse_concept_file_str(&content, path)
}

/// Parse a concept file from a JSON string.
pub fn parse_concept_file_str(content: &str, source_path: &Path) -> Result<ConceptFile> {
    let value: serde_json::Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    let mapping = ConceptMapping::from_json(&value)
        .with_context(|| format!("invalid concept file: {}", source_path.display()))?;

    let score_config = value
        .get("score_config")
        .map(|v| serde_json::from_value::<ScoreConfig>(v.clone()))
        .transpose()
        .with_context(|| format!("invalid score_config in {}", source_path.display()))?;

    Ok(ConceptFile {
        mapping,
        score_config,
    })
}

/// Load one sheet's detection output.
pub fn load_raw_response(path: &Path) -> Result<RawResponse> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read detection output: {}", path.display()))?;

    parse_raw_response_str(&content)
        .with_context(|| format!("invalid detection output: {}", path.display()))
}

/// Parse detection output: a JSON object of field label → null, string or
/// list of strings.
pub fn parse_raw_response_str(content: &str) -> Result<RawResponse> {
    let value: serde_json::Value = serde_json::from_str(content).context("failed to parse JSON")?;
    let fields = value
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("detection output must be a JSON object"))?;

    let response = fields
        .iter()
        .map(|(label, v)| -> Result<(String, RawValue)> {
            Ok((label.clone(), RawValue::from_json(label, v)?))
        })
        .collect::<Result<RawResponse>>()?;
    Ok(response)
}

/// A batch of students to mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub students: Vec<ManifestStudent>,
}

/// One manifest entry. Sheet paths are relative to the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStudent {
    pub name: String,
    #[serde(default)]
    pub writing_score: f64,
    #[serde(default)]
    pub reading_file: Option<PathBuf>,
    #[serde(default)]
    pub qrar_file: Option<PathBuf>,
}

/// Highest writing score a manifest may carry.
pub const MAX_WRITING_SCORE: f64 = 100.0;

/// Load a batch manifest, resolving sheet paths against its directory.
pub fn load_manifest(path: &Path) -> Result<BatchManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;

    parse_manifest_str(&content, path)
}

/// Parse and check a batch manifest. Relative sheet paths are resolved
/// against `source_path`'s directory.
///
/// The students list must be non-empty, every name non-blank and every
/// writing score within `0..=100`.
pub fn parse_manifest_str(content: &str, source_path: &Path) -> Result<BatchManifest> {
    let mut manifest: BatchManifest = serde_json::from_str(content)
        .with_context(|| format!("failed to parse manifest: {}", source_path.display()))?;

    anyhow::ensure!(
        !manifest.students.is_empty(),
        "manifest {} must list at least one student",
        source_path.display()
    );

    for (i, student) in manifest.students.iter().enumerate() {
        let entry = i + 1;
        anyhow::ensure!(
            !student.name.trim().is_empty(),
            "manifest student #{entry} is missing a name"
        );
        anyhow::ensure!(
            student.writing_score.is_finite()
                && (0.0..=MAX_WRITING_SCORE).contains(&student.writing_score),
            "manifest student #{entry} '{}' has an invalid writing score {} (expected 0-100)",
            student.name,
            student.writing_score
        );
    }

    let base = source_path.parent().unwrap_or_else(|| Path::new(""));
    for student in &mut manifest.students {
        for file in [&mut student.reading_file, &mut student.qrar_file]
            .into_iter()
            .flatten()
        {
            if file.is_relative() {
                *file = base.join(&*file);
            }
        }
    }

    Ok(manifest)
}

/// A warning from config validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The subject (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(subject: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Validate a marking config and its concept file for common issues.
pub fn validate_config(config: &MarkingConfig, concepts: Option<&ConceptFile>) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Answer keys
    for subject in Subject::ALL {
        let name = subject.name();
        let answers = config.answers.answers(subject);
        if answers.is_empty() {
            warnings.push(ValidationWarning::new(Some(name), "no answers configured; sheets will not be marked"));
            continue;
        }
        for (i, answer) in answers.iter().enumerate() {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                warnings.push(ValidationWarning::new(
                    Some(name),
                    format!("question {} has a blank answer and can never be credited", i + 1),
                ));
            } else if trimmed.chars().count() != 1 {
                warnings.push(ValidationWarning::new(
                    Some(name),
                    format!("question {} answer '{trimmed}' is not a single bubble value", i + 1),
                ));
            }
        }
    }

    let Some(concepts) = concepts else {
        return warnings;
    };

    if let Some(score_config) = &concepts.score_config {
        for subject in Subject::ALL {
            let count = config.answers.count(subject);
            let expected = score_config.total_for(subject) as usize;
            if count > 0 && count != expected {
                warnings.push(ValidationWarning::new(
                    Some(subject.name()),
                    format!("{count} answers configured but score_config total is {expected}"),
                ));
            }
        }
    }

    if concepts.mapping.is_empty() {
        warnings.push(ValidationWarning::new(None, "concept mapping has no subjects"));
    }

    // Concept mapping
    for subject_concepts in &concepts.mapping.subjects {
        let name = subject_concepts.subject.as_str();
        let Ok(subject) = name.parse::<Subject>() else {
            warnings.push(ValidationWarning::new(
                Some(name),
                "concept mapping subject is never marked",
            ));
            continue;
        };
        let question_count = config.answers.count(subject);

        let mut covered = HashSet::new();
        for area in &subject_concepts.areas {
            let mut seen = HashSet::new();
            for id in &area.question_ids {
                let number = digits_only(id);
                if number.is_empty() {
                    warnings.push(ValidationWarning::new(
                        Some(name),
                        format!("area '{}': question id '{id}' has no number", area.name),
                    ));
                    continue;
                }
                if !seen.insert(number.clone()) {
                    warnings.push(ValidationWarning::new(
                        Some(name),
                        format!("area '{}': question {number} listed more than once", area.name),
                    ));
                }
                match number.parse::<usize>() {
                    Ok(n) if (1..=question_count).contains(&n) => {
                        covered.insert(n);
                    }
                    _ => warnings.push(ValidationWarning::new(
                        Some(name),
                        format!(
                            "area '{}': question {number} is outside 1..={question_count}",
                            area.name
                        ),
                    )),
                }
            }
        }

        let uncovered: Vec<String> = (1..=question_count)
            .filter(|n| !covered.contains(n))
            .map(|n| n.to_string())
            .collect();
        if !uncovered.is_empty() {
            warnings.push(ValidationWarning::new(
                Some(name),
                format!("questions not in any area: {}", uncovered.join(", ")),
            ));
        }
    }

    warnings
}
