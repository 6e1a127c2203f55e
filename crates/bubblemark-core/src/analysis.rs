//! Cross-subject analysis compilation.

use indexmap::IndexMap;

use crate::concepts::{aggregate, ConceptMapping};
use crate::model::{
    FullAnalysis, MasteryStatus, Subject, SubjectAnalysis, SubjectResult, SubjectScore, SubjectSummary,
};

/// Compile the full analysis of one student.
///
/// Subjects are analysed in [`Subject::ALL`] order and keyed by their display
/// names, whatever `subject_name` the results carry. The writing score is
/// carried through verbatim.
pub fn compile(
    reading: &SubjectResult,
    quantitative: &SubjectResult,
    abstract_reasoning: &SubjectResult,
    mapping: &ConceptMapping,
    writing_score: f64,
) -> FullAnalysis {
    let mut subject_areas = IndexMap::new();
    let mut summary = IndexMap::new();
    let mut subject_scores = IndexMap::new();
    let mut total_score = writing_score;

    for (subject, result) in Subject::ALL
        .into_iter()
        .zip([reading, quantitative, abstract_reasoning])
    {
        let name = subject.name();
        let analysis = aggregate(name, &result.results, mapping.subject(name));

        summary.insert(name.to_string(), summarize(&analysis));
        subject_scores.insert(
            name.to_string(),
            SubjectScore {
                score: result.score,
                total: result.total_questions,
                percentage: result.percentage(),
            },
        );
        subject_areas.insert(name.to_string(), analysis.areas);
        total_score += result.score as f64;
    }

    FullAnalysis {
        subject_areas,
        summary,
        subject_scores,
        writing_score,
        total_score,
    }
}

fn summarize(analysis: &SubjectAnalysis) -> SubjectSummary {
    let (done_well, needs_improvement): (Vec<_>, Vec<_>) = analysis
        .areas
        .iter()
        .partition(|a| a.status == MasteryStatus::DoneWell);
    SubjectSummary {
        done_well: done_well.into_iter().map(|a| a.area.clone()).collect(),
        needs_improvement: needs_improvement.into_iter().map(|a| a.area.clone()).collect(),
        unmapped_questions: analysis.unmapped_questions.clone(),
    }
}
