//! bubblemark-core: marking and concept-analysis engine.
//!
//! Reconciles raw bubble-detection output against answer keys, scores each
//! question, splits combined sheets into subjects, and folds the results
//! into a learning-area mastery breakdown. The pipeline modules are pure and
//! synchronous; `parser` and `report` handle file I/O for front ends.

pub mod analysis;
pub mod concepts;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod scorer;
pub mod splitter;
pub mod statistics;

pub use analysis::compile;
pub use concepts::{aggregate, ConceptMapping};
pub use engine::{MarkingEngine, SessionAnswers, StudentMarking, StudentSheets};
pub use error::ConfigError;
pub use resolver::resolve;
pub use scorer::score;
pub use splitter::{split, Section};
