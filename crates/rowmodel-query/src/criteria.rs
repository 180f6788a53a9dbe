//! Criteria: the query-fragment accumulator.
//!
//! A criteria collects select expressions, joins, WHERE/HAVING condition
//! lists, grouping, ordering, paging, and eager-relation names, then
//! renders them into one fragment sequence in a fixed clause order.

use crate::condition::{Condition, Operator};
use crate::join::{Join, JoinKind};
use rowmodel_core::error::{ConfigError, Result};
use rowmodel_core::fragment::Fragment;
use rowmodel_core::value::Value;

/// Accumulated query state, rendered by [`Criteria::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    select: Vec<String>,
    where_: Vec<Condition>,
    having: Vec<Condition>,
    joins: Vec<Join>,
    group: Vec<String>,
    order: Vec<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    with: Vec<String>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            select: vec!["t.*".to_string()],
            where_: Vec::new(),
            having: Vec::new(),
            joins: Vec::new(),
            group: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            with: Vec::new(),
        }
    }
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the select list.
    pub fn select(&mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Cap the row count. Values below 1 clamp to 1.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = Some(limit.max(1));
        self
    }

    /// Skip leading rows. Negative values clamp to 0.
    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = Some(offset.max(0));
        self
    }

    /// Append an ORDER BY expression.
    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.order.push(expr.into());
        self
    }

    /// Append a GROUP BY expression.
    pub fn group_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.group.push(expr.into());
        self
    }

    /// Append an inner join.
    pub fn inner_join(
        &mut self,
        table: impl Into<String>,
        on: Vec<Condition>,
        alias: Option<String>,
    ) -> &mut Self {
        self.joins.push(Join::new(JoinKind::Inner, table, alias, on));
        self
    }

    /// Append a left join.
    pub fn left_join(
        &mut self,
        table: impl Into<String>,
        on: Vec<Condition>,
        alias: Option<String>,
    ) -> &mut Self {
        self.joins.push(Join::new(JoinKind::Left, table, alias, on));
        self
    }

    /// Append a raw WHERE condition.
    pub fn where_rule(
        &mut self,
        rule: impl Into<String>,
        params: Vec<Value>,
        operator: Operator,
    ) -> &mut Self {
        self.where_.push(Condition::new(rule, params, operator));
        self
    }

    /// Append a raw HAVING condition.
    pub fn having_rule(
        &mut self,
        rule: impl Into<String>,
        params: Vec<Value>,
        operator: Operator,
    ) -> &mut Self {
        self.having.push(Condition::new(rule, params, operator));
        self
    }

    /// `column = value`
    pub fn compare(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition("%n = %s", column, vec![value.into()], on_having, operator)
    }

    /// `column < value`
    pub fn less_than(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition("%n < %i", column, vec![value.into()], on_having, operator)
    }

    /// `column <= value`
    pub fn less_or_equal(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition("%n <= %i", column, vec![value.into()], on_having, operator)
    }

    /// `column > value`
    pub fn more_than(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition("%n > %i", column, vec![value.into()], on_having, operator)
    }

    /// `column >= value`
    pub fn more_or_equal(
        &mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition("%n >= %i", column, vec![value.into()], on_having, operator)
    }

    /// `column BETWEEN low AND high`
    pub fn between(
        &mut self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition(
            "%n BETWEEN %i AND %i",
            column,
            vec![low.into(), high.into()],
            on_having,
            operator,
        )
    }

    /// `column IN (values…)`
    pub fn in_list(
        &mut self,
        column: impl Into<String>,
        values: Vec<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition(
            "%n IN %l",
            column,
            vec![Value::Array(values)],
            on_having,
            operator,
        )
    }

    /// `column NOT IN (values…)`
    pub fn not_in(
        &mut self,
        column: impl Into<String>,
        values: Vec<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition(
            "%n NOT IN %l",
            column,
            vec![Value::Array(values)],
            on_having,
            operator,
        )
    }

    /// `column LIKE pattern`
    pub fn search(
        &mut self,
        column: impl Into<String>,
        pattern: impl Into<String>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        self.push_condition(
            "%n LIKE %~like~",
            column,
            vec![Value::Text(pattern.into())],
            on_having,
            operator,
        )
    }

    fn push_condition(
        &mut self,
        rule: &str,
        column: impl Into<String>,
        mut params: Vec<Value>,
        on_having: bool,
        operator: Operator,
    ) -> &mut Self {
        params.insert(0, Value::Text(column.into()));
        let condition = Condition::new(rule, params, operator);
        if on_having {
            self.having.push(condition);
        } else {
            self.where_.push(condition);
        }
        self
    }

    /// Register a relation name for eager loading.
    pub fn with(&mut self, relation: impl Into<String>) -> &mut Self {
        self.with.push(relation.into());
        self
    }

    /// Eager relation names, deduplicated by first occurrence.
    pub fn relation_list(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for name in &self.with {
            if !seen.contains(&name.as_str()) {
                seen.push(name.as_str());
            }
        }
        seen
    }

    /// Render the accumulated state against a base table. The base table
    /// is always aliased `t`. Clause order is fixed: select, joins, WHERE,
    /// GROUP BY, HAVING, ORDER BY, LIMIT, OFFSET.
    pub fn build(&self, table: &str) -> Vec<Fragment> {
        let mut fragments = vec![Fragment::Sql(format!(
            "SELECT {} FROM {} AS t",
            self.select.join(", "),
            table
        ))];
        for join in &self.joins {
            join.apply_to(&mut fragments);
        }
        if !self.where_.is_empty() {
            fragments.push(Fragment::Sql("WHERE".to_string()));
            Condition::apply_list_to(&mut fragments, &self.where_);
        }
        if !self.group.is_empty() {
            fragments.push(Fragment::Sql(format!("GROUP BY {}", self.group.join(", "))));
        }
        if !self.having.is_empty() {
            fragments.push(Fragment::Sql("HAVING".to_string()));
            Condition::apply_list_to(&mut fragments, &self.having);
        }
        if !self.order.is_empty() {
            fragments.push(Fragment::Sql(format!("ORDER BY {}", self.order.join(", "))));
        }
        if let Some(limit) = self.limit {
            fragments.push(Fragment::Sql(format!("LIMIT {limit}")));
        }
        if let Some(offset) = self.offset {
            fragments.push(Fragment::Sql(format!("OFFSET {offset}")));
        }
        fragments
    }

    /// Fold another criteria into this one. Scalar-category fields
    /// (`select`, `limit`, `offset`) take the other's value wholesale,
    /// including unset ones; list fields concatenate self-then-other.
    pub fn merge_with(&mut self, other: &Criteria) -> &mut Self {
        self.select = other.select.clone();
        self.limit = other.limit;
        self.offset = other.offset;
        self.where_.extend(other.where_.iter().cloned());
        self.having.extend(other.having.iter().cloned());
        self.joins.extend(other.joins.iter().cloned());
        self.group.extend(other.group.iter().cloned());
        self.order.extend(other.order.iter().cloned());
        self.with.extend(other.with.iter().cloned());
        self
    }

    /// Build a criteria from a descriptor mapping. Recognized keys:
    /// `select`, `where`, `having`, `joins`, `group`, `order`, `limit`,
    /// `offset`, `with`. Unknown keys are rejected.
    pub fn from_descriptor(descriptor: &serde_json::Value) -> Result<Self> {
        let map = descriptor.as_object().ok_or_else(|| {
            ConfigError::new(format!("criteria descriptor must be a mapping, got {descriptor}"))
        })?;

        let mut criteria = Criteria::new();
        for (key, value) in map {
            match key.as_str() {
                "select" => {
                    criteria.select = string_list(value, "select")?;
                }
                "where" => {
                    for item in condition_descriptors(value, "where")? {
                        criteria.where_.push(Condition::from_descriptor(item)?);
                    }
                }
                "having" => {
                    for item in condition_descriptors(value, "having")? {
                        criteria.having.push(Condition::from_descriptor(item)?);
                    }
                }
                "joins" => {
                    let items = value
                        .as_array()
                        .ok_or_else(|| ConfigError::new("criteria joins must be an array"))?;
                    for item in items {
                        criteria.joins.push(Join::from_descriptor(item)?);
                    }
                }
                "group" => {
                    criteria.group = string_list(value, "group")?;
                }
                "order" => {
                    criteria.order = string_list(value, "order")?;
                }
                "limit" => {
                    criteria.limit(integer(value, "limit")?);
                }
                "offset" => {
                    criteria.offset(integer(value, "offset")?);
                }
                "with" => {
                    criteria.with = string_list(value, "with")?;
                }
                other => {
                    return Err(
                        ConfigError::new(format!("unknown criteria key '{other}'")).into()
                    );
                }
            }
        }
        Ok(criteria)
    }
}

fn string_list(value: &serde_json::Value, key: &str) -> Result<Vec<String>> {
    match value {
        serde_json::Value::String(s) => Ok(vec![s.clone()]),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::new(format!("criteria {key} entries must be strings")).into()
                })
            })
            .collect(),
        other => Err(ConfigError::new(format!(
            "criteria {key} must be a string or array, got {other}"
        ))
        .into()),
    }
}

fn condition_descriptors<'a>(
    value: &'a serde_json::Value,
    key: &str,
) -> Result<Vec<&'a serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => Ok(items.iter().collect()),
        serde_json::Value::String(_) => Ok(vec![value]),
        other => Err(ConfigError::new(format!(
            "criteria {key} must be a string or array, got {other}"
        ))
        .into()),
    }
}

fn integer(value: &serde_json::Value, key: &str) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| ConfigError::new(format!("criteria {key} must be an integer")).into())
}
