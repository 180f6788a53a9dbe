//! Deferred query fragments.
//!
//! A query is an ordered sequence of fragments: SQL text interleaved with
//! bound parameters. Placeholder tokens inside SQL text (`%n`, `%i`, `%s`,
//! `%l`, `%~like~`) are never interpolated here; the execution collaborator
//! renders them against the parameters that follow.

use crate::value::Value;

/// One element of a query fragment sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// A piece of SQL text, possibly containing placeholder tokens
    Sql(String),
    /// A bound parameter, positionally matched to the preceding SQL text
    Param(Value),
}

impl Fragment {
    /// Create a SQL text fragment.
    pub fn sql(text: impl Into<String>) -> Self {
        Fragment::Sql(text.into())
    }

    /// Create a parameter fragment.
    pub fn param(value: impl Into<Value>) -> Self {
        Fragment::Param(value.into())
    }

    /// Whether this fragment is SQL text.
    pub const fn is_sql(&self) -> bool {
        matches!(self, Fragment::Sql(_))
    }
}

/// Render a fragment sequence as a single line for logging and error
/// messages. Parameters appear inline in display form; this is a preview,
/// not executable SQL.
pub fn preview(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        if !out.is_empty() {
            out.push(' ');
        }
        match fragment {
            Fragment::Sql(text) => out.push_str(text),
            Fragment::Param(value) => out.push_str(&value.to_string()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_interleaves_sql_and_params() {
        let frags = vec![
            Fragment::sql("SELECT t.* FROM users AS t"),
            Fragment::sql("WHERE"),
            Fragment::sql("(%n = %s)"),
            Fragment::param("name"),
            Fragment::param("alice"),
        ];
        assert_eq!(
            preview(&frags),
            "SELECT t.* FROM users AS t WHERE (%n = %s) 'name' 'alice'"
        );
    }
}
