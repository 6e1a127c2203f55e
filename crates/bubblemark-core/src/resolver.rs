//! Answer-key label resolution against detection field labels.
//!
//! Sheet templates and answer keys are authored independently, so the
//! detection engine may report `q3` where the key says `RC3`. Resolution is
//! tolerant but deterministic: exact match, then case-insensitive match,
//! then the label's trailing number bare or behind a known prefix.

use crate::model::{RawResponse, RawValue};

/// Prefixes tried, in order, in front of a label's trailing number.
pub const LABEL_ALIASES: [&str; 8] = ["q", "Q", "rc", "RC", "qr", "QR", "ar", "AR"];

/// Find the detection value for an answer-key label.
///
/// Priority: exact > case-insensitive > bare digits > digits behind each
/// alias of [`LABEL_ALIASES`] in declared order. A field that is present
/// counts as a hit even when nothing was detected in it.
pub fn resolve<'a>(response: &'a RawResponse, key_label: &str) -> Option<&'a RawValue> {
    if let Some(value) = response.get(key_label) {
        return Some(value);
    }

    if let Some((_, value)) = response
        .iter()
        .find(|(field, _)| field.eq_ignore_ascii_case(key_label))
    {
        return Some(value);
    }

    let digits = trailing_digits(key_label)?;
    if let Some(value) = response.get(digits) {
        return Some(value);
    }

    LABEL_ALIASES
        .iter()
        .find_map(|alias| response.get(&format!("{alias}{digits}")))
}

/// The run of ASCII digits at the end of `label`, if any.
pub fn trailing_digits(label: &str) -> Option<&str> {
    let start = label
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    Some(&label[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(fields: &[(&str, RawValue)]) -> RawResponse {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn single(v: &str) -> RawValue {
        RawValue::Single(v.into())
    }

    #[test]
    fn trailing_digit_run() {
        assert_eq!(trailing_digits("RC12"), Some("12"));
        assert_eq!(trailing_digits("7"), Some("7"));
        assert_eq!(trailing_digits("q1a"), None);
        assert_eq!(trailing_digits("Vocab"), None);
        assert_eq!(trailing_digits("q1b23"), Some("23"));
    }

    #[test]
    fn exact_match_wins() {
        let r = response(&[("RC1", single("A")), ("rc1", single("B")), ("1", single("C"))]);
        assert_eq!(resolve(&r, "RC1"), Some(&single("A")));
    }

    #[test]
    fn case_insensitive_before_digits() {
        let r = response(&[("rc1", single("B")), ("1", single("C"))]);
        assert_eq!(resolve(&r, "RC1"), Some(&single("B")));
    }

    #[test]
    fn bare_digits_before_aliases() {
        let r = response(&[("q1", single("B")), ("1", single("C"))]);
        assert_eq!(resolve(&r, "RC1"), Some(&single("C")));
    }

    #[test]
    fn aliases_in_declared_order() {
        let r = response(&[("QR4", single("D")), ("q4", single("A"))]);
        assert_eq!(resolve(&r, "AR4"), Some(&single("A")));

        let r = response(&[("ar4", single("D")), ("QR4", single("B"))]);
        assert_eq!(resolve(&r, "x4"), Some(&single("B")));
    }

    #[test]
    fn equivalent_labels_resolve_alike() {
        for field in ["3", "q3", "Q3", "rc3", "RC3", "qr3", "QR3", "ar3", "AR3"] {
            let r = response(&[(field, single("C"))]);
            let expected = Some(&single("C"));
            assert_eq!(resolve(&r, "RC3"), expected, "field {field}");
            assert_eq!(resolve(&r, "rc3"), expected, "field {field}");
            assert_eq!(resolve(&r, "3"), expected, "field {field}");
        }
    }

    #[test]
    fn miss_is_none() {
        let r = response(&[("q2", single("A"))]);
        assert_eq!(resolve(&r, "RC1"), None);
        assert_eq!(resolve(&r, "Intro"), None);
    }

    #[test]
    fn present_but_absent_field_is_a_hit() {
        let r = response(&[("q5", RawValue::Absent), ("5", single("A"))]);
        assert_eq!(resolve(&r, "Q5"), Some(&RawValue::Absent));
    }
}
