//! Join clauses.

use crate::condition::Condition;
use rowmodel_core::error::{ConfigError, Result};
use rowmodel_core::fragment::Fragment;
use std::str::FromStr;

/// Supported join flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl JoinKind {
    /// The SQL keyword sequence for this join kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JOIN" | "INNER" | "INNER JOIN" => Ok(JoinKind::Inner),
            "LEFT" | "LEFT JOIN" => Ok(JoinKind::Left),
            other => Err(ConfigError::new(format!("unknown join kind '{other}'"))),
        }
    }
}

/// One join: a target table with an optional alias and ON conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    kind: JoinKind,
    table: String,
    alias: Option<String>,
    conditions: Vec<Condition>,
}

impl Join {
    /// Create a join clause. When `alias` is `None`, the table name doubles
    /// as the alias.
    pub fn new(
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<String>,
        conditions: Vec<Condition>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            alias,
            conditions,
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The effective alias: explicit, or the table name.
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Append this join to a fragment sequence: the join header, then the
    /// ON condition list when present.
    pub fn apply_to(&self, fragments: &mut Vec<Fragment>) {
        fragments.push(Fragment::Sql(format!(
            "{} {} {}",
            self.kind.as_str(),
            self.table,
            self.alias()
        )));
        if !self.conditions.is_empty() {
            fragments.push(Fragment::Sql("ON".to_string()));
            Condition::apply_list_to(fragments, &self.conditions);
        }
    }

    /// Build a join from a descriptor mapping with keys `table`
    /// (required), `conditions`, `kind`, and `alias`. Unknown keys are
    /// rejected.
    pub fn from_descriptor(descriptor: &serde_json::Value) -> Result<Self> {
        let map = descriptor.as_object().ok_or_else(|| {
            ConfigError::new(format!("join descriptor must be a mapping, got {descriptor}"))
        })?;

        let mut table = None;
        let mut alias = None;
        let mut kind = JoinKind::default();
        let mut conditions = Vec::new();

        for (key, value) in map {
            match key.as_str() {
                "table" => {
                    table = Some(
                        value
                            .as_str()
                            .ok_or_else(|| ConfigError::new("join table must be a string"))?
                            .to_string(),
                    );
                }
                "alias" => {
                    alias = Some(
                        value
                            .as_str()
                            .ok_or_else(|| ConfigError::new("join alias must be a string"))?
                            .to_string(),
                    );
                }
                "kind" => {
                    let word = value
                        .as_str()
                        .ok_or_else(|| ConfigError::new("join kind must be a string"))?;
                    kind = word.parse()?;
                }
                "conditions" => {
                    let items = value
                        .as_array()
                        .ok_or_else(|| ConfigError::new("join conditions must be an array"))?;
                    for item in items {
                        conditions.push(Condition::from_descriptor(item)?);
                    }
                }
                other => {
                    return Err(
                        ConfigError::new(format!("unknown join key '{other}'")).into()
                    );
                }
            }
        }

        let table =
            table.ok_or_else(|| ConfigError::new("join descriptor is missing 'table'"))?;
        Ok(Self::new(kind, table, alias, conditions))
    }
}
