//! Record validation.
//!
//! Validators are declared as explicit rule structs bound to attribute
//! names, and run as a batch over a record. Every failure is collected
//! into one [`ValidationError`] container; nothing short-circuits.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::record::Record;
use crate::value::Value;
use regex::Regex;

/// Length constraints for text attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// Membership constraint: the value must appear in the haystack.
#[derive(Debug, Clone)]
pub struct InRules {
    pub haystack: Vec<Value>,
}

/// Regex constraint for text attributes.
#[derive(Debug, Clone)]
pub struct PatternRules {
    pub regex: Regex,
}

/// Signature for custom checks. Receives the attribute name, its raw
/// value, and the shared error container.
pub type CallbackFn = fn(&str, &Value, &mut ValidationError);

/// One kind of validation check.
#[derive(Debug, Clone)]
pub enum ValidatorKind {
    /// Value must be present and non-null
    Required,
    /// Value must be an integer, a double, or numeric text
    Numeric,
    /// Value must be text within the given length bounds
    Text(TextRules),
    /// Value must be one of a fixed set
    In(InRules),
    /// Text value must match a regex
    Pattern(PatternRules),
    /// Custom check
    Callback(CallbackFn),
}

/// A validator kind bound to a set of attribute names.
#[derive(Debug, Clone)]
pub struct ValidatorBinding {
    pub fields: Vec<String>,
    pub kind: ValidatorKind,
    /// Skip absent or NULL values instead of failing them
    pub allow_empty: bool,
}

impl ValidatorBinding {
    /// Bind a validator kind to attribute names. Empty values are skipped
    /// by default, except for [`ValidatorKind::Required`].
    pub fn new(fields: impl IntoIterator<Item = impl Into<String>>, kind: ValidatorKind) -> Self {
        let allow_empty = !matches!(kind, ValidatorKind::Required);
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            kind,
            allow_empty,
        }
    }

    /// Override the empty-value policy.
    #[must_use]
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

/// Run every binding against a record, collecting all failures.
pub fn run_validators(record: &Record, bindings: &[ValidatorBinding]) -> ValidationError {
    let mut errors = ValidationError::new();
    for binding in bindings {
        for field in &binding.fields {
            let value = record.get_raw(field);
            let empty = matches!(value, None | Some(Value::Null));
            if empty {
                if !binding.allow_empty {
                    errors.add_required(field);
                }
                continue;
            }
            let value = match value {
                Some(v) => v,
                None => continue,
            };
            check(field, value, &binding.kind, &mut errors);
        }
    }
    errors
}

fn check(field: &str, value: &Value, kind: &ValidatorKind, errors: &mut ValidationError) {
    match kind {
        // Presence was already established above.
        ValidatorKind::Required => {}
        ValidatorKind::Numeric => {
            let numeric = match value {
                Value::BigInt(_) | Value::Double(_) => true,
                Value::Text(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            };
            if !numeric {
                errors.add(field, ValidationErrorKind::Numeric, "must be numeric");
            }
        }
        ValidatorKind::Text(rules) => match value {
            Value::Text(s) => {
                let length = s.chars().count();
                if let Some(min) = rules.min_length {
                    if length < min {
                        errors.add_min_length(field, min, length);
                    }
                }
                if let Some(max) = rules.max_length {
                    if length > max {
                        errors.add_max_length(field, max, length);
                    }
                }
            }
            other => {
                errors.add(
                    field,
                    ValidationErrorKind::NotText,
                    format!("must be text, got {}", other.type_name()),
                );
            }
        },
        ValidatorKind::In(rules) => {
            if !rules.haystack.contains(value) {
                errors.add(
                    field,
                    ValidationErrorKind::NotIn,
                    "is not in the allowed set",
                );
            }
        }
        ValidatorKind::Pattern(rules) => match value {
            Value::Text(s) => {
                if !rules.regex.is_match(s) {
                    errors.add(
                        field,
                        ValidationErrorKind::Pattern,
                        format!("does not match pattern '{}'", rules.regex.as_str()),
                    );
                }
            }
            other => {
                errors.add(
                    field,
                    ValidationErrorKind::NotText,
                    format!("must be text, got {}", other.type_name()),
                );
            }
        },
        ValidatorKind::Callback(callback) => callback(field, value, errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        let mut record = Record::new();
        for (name, value) in pairs {
            record.set_raw(*name, value.clone());
        }
        record
    }

    #[test]
    fn required_rejects_absent_and_null() {
        let bindings = vec![ValidatorBinding::new(
            ["name", "email"],
            ValidatorKind::Required,
        )];
        let rec = record(&[("name", Value::Null)]);
        let errors = run_validators(&rec, &bindings);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.for_field("name").len(), 1);
        assert_eq!(errors.for_field("email").len(), 1);
    }

    #[test]
    fn allow_empty_skips_nulls() {
        let bindings = vec![ValidatorBinding::new(["age"], ValidatorKind::Numeric)];
        let rec = record(&[("age", Value::Null)]);
        assert!(run_validators(&rec, &bindings).is_empty());
    }

    #[test]
    fn numeric_accepts_text_numbers() {
        let bindings = vec![ValidatorBinding::new(["age"], ValidatorKind::Numeric)];
        assert!(run_validators(&record(&[("age", Value::Text("42.5".into()))]), &bindings).is_empty());
        assert!(!run_validators(&record(&[("age", Value::Text("old".into()))]), &bindings).is_empty());
    }

    #[test]
    fn text_length_bounds() {
        let bindings = vec![ValidatorBinding::new(
            ["name"],
            ValidatorKind::Text(TextRules {
                min_length: Some(3),
                max_length: Some(5),
            }),
        )];
        assert!(run_validators(&record(&[("name", Value::Text("abcd".into()))]), &bindings).is_empty());

        let errors = run_validators(&record(&[("name", Value::Text("ab".into()))]), &bindings);
        assert_eq!(errors.errors[0].kind, ValidationErrorKind::MinLength);

        let errors = run_validators(&record(&[("name", Value::BigInt(7))]), &bindings);
        assert_eq!(errors.errors[0].kind, ValidationErrorKind::NotText);
    }

    #[test]
    fn in_set_membership() {
        let bindings = vec![ValidatorBinding::new(
            ["status"],
            ValidatorKind::In(InRules {
                haystack: vec![Value::Text("new".into()), Value::Text("done".into())],
            }),
        )];
        assert!(run_validators(&record(&[("status", Value::Text("new".into()))]), &bindings).is_empty());
        let errors = run_validators(&record(&[("status", Value::Text("odd".into()))]), &bindings);
        assert_eq!(errors.errors[0].kind, ValidationErrorKind::NotIn);
    }

    #[test]
    fn pattern_matching() {
        let bindings = vec![ValidatorBinding::new(
            ["code"],
            ValidatorKind::Pattern(PatternRules {
                regex: Regex::new(r"^[A-Z]{3}\d+$").unwrap(),
            }),
        )];
        assert!(run_validators(&record(&[("code", Value::Text("ABC12".into()))]), &bindings).is_empty());
        assert!(!run_validators(&record(&[("code", Value::Text("abc".into()))]), &bindings).is_empty());
    }

    #[test]
    fn callback_reports_through_container() {
        fn positive(field: &str, value: &Value, errors: &mut ValidationError) {
            if value.as_i64().is_none_or(|i| i <= 0) {
                errors.add_custom(field, "must be positive");
            }
        }
        let bindings = vec![ValidatorBinding::new(
            ["count"],
            ValidatorKind::Callback(positive),
        )];
        assert!(run_validators(&record(&[("count", Value::BigInt(1))]), &bindings).is_empty());
        let errors = run_validators(&record(&[("count", Value::BigInt(-2))]), &bindings);
        assert_eq!(errors.errors[0].kind, ValidationErrorKind::Custom);
    }

    #[test]
    fn failures_aggregate_across_bindings() {
        let bindings = vec![
            ValidatorBinding::new(["name"], ValidatorKind::Required),
            ValidatorBinding::new(["age"], ValidatorKind::Numeric),
        ];
        let rec = record(&[("age", Value::Text("old".into()))]);
        let errors = run_validators(&rec, &bindings);
        assert_eq!(errors.len(), 2);
    }
}
