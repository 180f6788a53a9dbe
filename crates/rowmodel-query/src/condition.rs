//! Conditions: one rule template plus its bound parameters.

use rowmodel_core::error::{ConfigError, Result};
use rowmodel_core::fragment::Fragment;
use rowmodel_core::value::Value;
use std::str::FromStr;

/// Logical connector between list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    #[default]
    And,
    Or,
}

impl Operator {
    /// The SQL keyword for this operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::And => "AND",
            Operator::Or => "OR",
        }
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Operator::And),
            "OR" => Ok(Operator::Or),
            other => Err(ConfigError::new(format!("unknown operator '{other}'"))),
        }
    }
}

/// A single predicate: a rule template with placeholder tokens, the
/// parameters that fill them, and the operator connecting it to the
/// previous condition in a list.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    rule: String,
    params: Vec<Value>,
    operator: Operator,
}

impl Condition {
    /// Create a condition from a rule template, its parameters, and the
    /// operator connecting it to the previous list entry.
    pub fn new(rule: impl Into<String>, params: Vec<Value>, operator: Operator) -> Self {
        Self {
            rule: rule.into(),
            params,
            operator,
        }
    }

    /// The rule template, placeholders intact.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The connecting operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Append this condition to a fragment sequence: the parenthesized
    /// rule first, then each parameter.
    pub fn apply_to(&self, fragments: &mut Vec<Fragment>) {
        fragments.push(Fragment::Sql(format!("({})", self.rule)));
        for param in &self.params {
            fragments.push(Fragment::Param(param.clone()));
        }
    }

    /// Append a list of conditions, connecting each entry after the first
    /// with its own operator. The operator appears exactly N-1 times and
    /// never leads.
    pub fn apply_list_to(fragments: &mut Vec<Fragment>, conditions: &[Condition]) {
        for (i, condition) in conditions.iter().enumerate() {
            if i > 0 {
                fragments.push(Fragment::Sql(condition.operator.as_str().to_string()));
            }
            condition.apply_to(fragments);
        }
    }

    /// Build a condition from a descriptor: either a bare rule string or a
    /// 1-3 element array `[rule, params?, operator?]`. Parameters may be a
    /// single scalar or an array of scalars.
    pub fn from_descriptor(descriptor: &serde_json::Value) -> Result<Self> {
        match descriptor {
            serde_json::Value::String(rule) => {
                Ok(Self::new(rule.clone(), Vec::new(), Operator::And))
            }
            serde_json::Value::Array(parts) => {
                if parts.is_empty() || parts.len() > 3 {
                    return Err(ConfigError::new(format!(
                        "condition descriptor must have 1 to 3 elements, got {}",
                        parts.len()
                    ))
                    .into());
                }
                let rule = parts[0].as_str().ok_or_else(|| {
                    ConfigError::new("condition rule must be a string")
                })?;
                let params = match parts.get(1) {
                    None | Some(serde_json::Value::Null) => Vec::new(),
                    Some(serde_json::Value::Array(items)) => {
                        items.iter().cloned().map(Value::from_json).collect()
                    }
                    Some(scalar) => vec![Value::from_json(scalar.clone())],
                };
                let operator = match parts.get(2) {
                    None => Operator::And,
                    Some(serde_json::Value::String(word)) => word.parse()?,
                    Some(other) => {
                        return Err(ConfigError::new(format!(
                            "condition operator must be a string, got {other}"
                        ))
                        .into());
                    }
                };
                Ok(Self::new(rule, params, operator))
            }
            other => Err(ConfigError::new(format!(
                "condition descriptor must be a string or array, got {other}"
            ))
            .into()),
        }
    }
}

impl From<&str> for Condition {
    fn from(rule: &str) -> Self {
        Condition::new(rule, Vec::new(), Operator::And)
    }
}

impl From<String> for Condition {
    fn from(rule: String) -> Self {
        Condition::new(rule, Vec::new(), Operator::And)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_parenthesizes_rule_and_appends_params() {
        let condition = Condition::new(
            "%n = %s",
            vec![Value::Text("name".into()), Value::Text("alice".into())],
            Operator::And,
        );
        let mut frags = Vec::new();
        condition.apply_to(&mut frags);
        assert_eq!(
            frags,
            vec![
                Fragment::Sql("(%n = %s)".into()),
                Fragment::Param(Value::Text("name".into())),
                Fragment::Param(Value::Text("alice".into())),
            ]
        );
    }

    #[test]
    fn list_places_operator_between_entries() {
        let conditions = vec![
            Condition::from("a = 1"),
            Condition::new("b = 2", vec![], Operator::Or),
            Condition::new("c = 3", vec![], Operator::And),
        ];
        let mut frags = Vec::new();
        Condition::apply_list_to(&mut frags, &conditions);
        let sql: Vec<&str> = frags
            .iter()
            .map(|f| match f {
                Fragment::Sql(s) => s.as_str(),
                Fragment::Param(_) => panic!("no params expected"),
            })
            .collect();
        assert_eq!(sql, vec!["(a = 1)", "OR", "(b = 2)", "AND", "(c = 3)"]);
    }

    #[test]
    fn single_entry_list_has_no_operator() {
        let mut frags = Vec::new();
        Condition::apply_list_to(&mut frags, &[Condition::from("a = 1")]);
        assert_eq!(frags, vec![Fragment::Sql("(a = 1)".into())]);
    }

    #[test]
    fn from_descriptor_round_trip() {
        let condition = Condition::from_descriptor(&json!(["%n = %i", ["id", 7], "or"])).unwrap();
        assert_eq!(condition.rule(), "%n = %i");
        assert_eq!(
            condition.params(),
            &[Value::Text("id".into()), Value::BigInt(7)]
        );
        assert_eq!(condition.operator(), Operator::Or);
    }

    #[test]
    fn from_descriptor_scalar_param_and_bare_string() {
        let condition = Condition::from_descriptor(&json!(["age > %i", 18])).unwrap();
        assert_eq!(condition.params(), &[Value::BigInt(18)]);

        let condition = Condition::from_descriptor(&json!("deleted IS NULL")).unwrap();
        assert_eq!(condition.rule(), "deleted IS NULL");
        assert!(condition.params().is_empty());
    }

    #[test]
    fn from_descriptor_rejects_malformed_descriptors() {
        assert!(Condition::from_descriptor(&json!([])).is_err());
        assert!(Condition::from_descriptor(&json!(["a", [], "xor"])).is_err());
        assert!(Condition::from_descriptor(&json!(["a", [], 3])).is_err());
        assert!(Condition::from_descriptor(&json!(42)).is_err());
        assert!(Condition::from_descriptor(&json!(["a", [], "and", "extra"])).is_err());
    }

    #[test]
    fn operator_parsing_is_case_insensitive() {
        assert_eq!("and".parse::<Operator>().unwrap(), Operator::And);
        assert_eq!(" OR ".parse::<Operator>().unwrap(), Operator::Or);
        assert!("maybe".parse::<Operator>().is_err());
    }
}
