//! Canonical form of detected bubble values.

use std::fmt;

use crate::model::RawValue;

/// A detection value reduced to its comparison form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedValue {
    /// No mark.
    Blank,
    /// One mark, trimmed and upper-cased.
    Single(String),
    /// Several marks, sorted. Never credited.
    MultiMark(Vec<String>),
}

impl NormalizedValue {
    /// Whether this mark earns credit for `correct`.
    ///
    /// Multi-marks and blanks never match, whatever the key says.
    pub fn matches(&self, correct: &str) -> bool {
        match self {
            NormalizedValue::Single(v) => v.eq_ignore_ascii_case(correct.trim()),
            NormalizedValue::Blank | NormalizedValue::MultiMark(_) => false,
        }
    }

    pub fn is_multi_mark(&self) -> bool {
        matches!(self, NormalizedValue::MultiMark(_))
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Blank => Ok(()),
            NormalizedValue::Single(v) => f.write_str(v),
            NormalizedValue::MultiMark(vs) => f.write_str(&vs.join(",")),
        }
    }
}

/// Normalize a resolved detection value. `None` (label not found) is blank.
pub fn normalize(raw: Option<&RawValue>) -> NormalizedValue {
    match raw {
        None | Some(RawValue::Absent) => NormalizedValue::Blank,
        Some(RawValue::Single(v)) => single(v),
        Some(RawValue::Multiple(vs)) => match vs.as_slice() {
            [] => NormalizedValue::Blank,
            [only] => single(only),
            many => {
                let mut marks: Vec<String> = many.iter().map(|v| canonical(v)).collect();
                marks.sort();
                NormalizedValue::MultiMark(marks)
            }
        },
    }
}

fn single(v: &str) -> NormalizedValue {
    let v = canonical(v);
    if v.is_empty() {
        NormalizedValue::Blank
    } else {
        NormalizedValue::Single(v)
    }
}

fn canonical(v: &str) -> String {
    v.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_empty_are_blank() {
        assert_eq!(normalize(None), NormalizedValue::Blank);
        assert_eq!(normalize(Some(&RawValue::Absent)), NormalizedValue::Blank);
        assert_eq!(normalize(Some(&RawValue::Single("  ".into()))), NormalizedValue::Blank);
        assert_eq!(normalize(Some(&RawValue::Multiple(vec![]))), NormalizedValue::Blank);
        assert_eq!(NormalizedValue::Blank.to_string(), "");
    }

    #[test]
    fn single_is_trimmed_and_uppercased() {
        let v = normalize(Some(&RawValue::Single(" b ".into())));
        assert_eq!(v, NormalizedValue::Single("B".into()));
        assert!(v.matches("B"));
        assert!(v.matches(" b"));
        assert!(!v.matches("C"));
    }

    #[test]
    fn one_element_list_is_a_single_mark() {
        let v = normalize(Some(&RawValue::Multiple(vec!["c".into()])));
        assert_eq!(v, NormalizedValue::Single("C".into()));
    }

    #[test]
    fn multi_mark_is_sorted_and_never_matches() {
        let v = normalize(Some(&RawValue::Multiple(vec!["D".into(), "a".into()])));
        assert_eq!(v.to_string(), "A,D");
        assert!(v.is_multi_mark());
        assert!(!v.matches("A"));
        assert!(!v.matches("A,D"));
        assert!(!v.matches("D"));
    }

    #[test]
    fn blank_never_matches_blank_key() {
        assert!(!NormalizedValue::Blank.matches(""));
    }
}
