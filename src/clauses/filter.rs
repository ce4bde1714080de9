use std::cmp::Ordering;
use std::fmt;

use crate::types::{Record, SqlValue};

/// Comparison operators a table store can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    /// Parses an operator as written in SQL text.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Neq),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Lte),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Gte),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Neq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `column <op> value` condition.
/// Several filters on one request are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: CompareOp,
    pub value: SqlValue,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates an equality condition: column = value
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, CompareOp::Eq, value)
    }

    /// Evaluates the condition against a record.
    /// A missing column or a NULL on either side never matches.
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.column)
            .and_then(|actual| actual.compare(&self.value))
            .map(|ordering| self.op.holds(ordering))
            .unwrap_or(false)
    }

    /// Builds the SQL fragment and collects its parameter.
    /// `param_offset` is the starting parameter number (1-indexed for PostgreSQL).
    pub fn build_sql(&self, param_offset: usize, params: &mut Vec<SqlValue>) -> String {
        params.push(self.value.clone());
        format!(
            "{} {} ${}",
            quote_ident(&self.column),
            self.op.symbol(),
            param_offset + params.len()
        )
    }
}

/// Double-quotes an identifier, doubling any embedded quote.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_clause() {
        let filter = Filter::eq("name", "John");
        let mut params = Vec::new();
        let sql = filter.build_sql(0, &mut params);

        assert_eq!(sql, "\"name\" = $1");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0], SqlValue::Text("John".to_string()));
    }

    #[test]
    fn test_range_clause_numbering() {
        let mut params = vec![SqlValue::Text("Ana".into())];
        let sql = Filter::new("estoque", CompareOp::Lte, 5).build_sql(0, &mut params);

        assert_eq!(sql, "\"estoque\" <= $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_matches() {
        let record = Record::new().with("id", 7).with("ativo", true);

        assert!(Filter::eq("id", 7).matches(&record));
        assert!(Filter::eq("id", "7").matches(&record));
        assert!(!Filter::eq("id", 8).matches(&record));
        assert!(Filter::new("id", CompareOp::Gt, 3).matches(&record));
        assert!(Filter::eq("ativo", true).matches(&record));
        assert!(!Filter::eq("missing", 1).matches(&record));
        assert!(!Filter::eq("id", SqlValue::Null).matches(&record));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(CompareOp::from_symbol("<>"), Some(CompareOp::Neq));
        assert_eq!(CompareOp::from_symbol("!="), Some(CompareOp::Neq));
        assert_eq!(CompareOp::from_symbol(">="), Some(CompareOp::Gte));
        assert_eq!(CompareOp::from_symbol("LIKE"), None);
    }
}
