//! Legacy statement translation.
//!
//! A raw `(text, params)` pair flows through four stages inside one call:
//! normalizer -> parser (classification) -> binder -> dispatcher. Nothing is
//! cached between calls.

mod binder;
mod dispatcher;
mod lexer;
mod normalizer;
mod parser;

use crate::clauses::{CompareOp, Filter, OrderBy};
use crate::config::ShimConfig;
use crate::error::{Result, UnsupportedReason};
use crate::querier::Querier;
use crate::types::{Record, SqlValue};

pub use dispatcher::dispatch;
pub use normalizer::{normalize, Normalizer};

/// The syntactic category of a statement, derived from its text alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementShape {
    SelectAll { table: String },
    SelectCount { table: String },
    Insert { table: String, columns: Vec<String> },
    Update { table: String, set_columns: Vec<String> },
    Delete { table: String },
    Unrecognized { original_text: String },
}

impl StatementShape {
    pub fn kind(&self) -> &'static str {
        match self {
            StatementShape::SelectAll { .. } => "select",
            StatementShape::SelectCount { .. } => "count",
            StatementShape::Insert { .. } => "insert",
            StatementShape::Update { .. } => "update",
            StatementShape::Delete { .. } => "delete",
            StatementShape::Unrecognized { .. } => "unrecognized",
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            StatementShape::SelectAll { table }
            | StatementShape::SelectCount { table }
            | StatementShape::Insert { table, .. }
            | StatementShape::Update { table, .. }
            | StatementShape::Delete { table } => Some(table),
            StatementShape::Unrecognized { .. } => None,
        }
    }
}

/// A value slot in a statement: a positional param or an inline literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Param(usize),
    Literal(SqlValue),
}

/// The single WHERE condition a statement may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub value: Operand,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectModifiers {
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
}

/// A statement with its parameters resolved, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub shape: StatementShape,
    pub predicate: Option<Predicate>,
    pub params: Vec<SqlValue>,
    /// INSERT values or UPDATE assignments, aligned with the shape's columns.
    pub values: Vec<Operand>,
    pub modifiers: SelectModifiers,
    pub count_alias: Option<String>,
}

impl BoundStatement {
    /// Resolves an operand against the params. Binding guarantees the index is in range.
    pub fn resolve(&self, operand: &Operand) -> SqlValue {
        match operand {
            Operand::Param(index) => self.params.get(*index).cloned().unwrap_or(SqlValue::Null),
            Operand::Literal(value) => value.clone(),
        }
    }

    /// Column -> value map of an INSERT or UPDATE; empty for other shapes.
    pub fn assignments(&self) -> Record {
        let columns = match &self.shape {
            StatementShape::Insert { columns, .. } => columns,
            StatementShape::Update { set_columns, .. } => set_columns,
            _ => return Record::new(),
        };
        columns
            .iter()
            .zip(&self.values)
            .map(|(column, operand)| (column.clone(), self.resolve(operand)))
            .collect()
    }

    /// The predicate as a store filter.
    pub fn predicate_filter(&self) -> Option<Filter> {
        self.predicate
            .as_ref()
            .map(|p| Filter::new(p.column.clone(), p.op, self.resolve(&p.value)))
    }
}

/// What a translated statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// Rows of a SELECT, in store order.
    Rows(Vec<Record>),
    Mutation {
        affected_id: Option<SqlValue>,
        affected_count: u64,
    },
    /// The statement was not translated and the store was not contacted.
    Unsupported(UnsupportedReason),
}

impl TranslationOutcome {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TranslationOutcome::Unsupported(_))
    }
}

/// Runs the translation pipeline with one configuration.
#[derive(Debug, Clone)]
pub struct Translator {
    normalizer: Normalizer,
    config: ShimConfig,
}

impl Translator {
    pub fn new(config: ShimConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.now_literal.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    /// Normalizes and classifies a statement.
    pub fn classify(&self, text: &str) -> StatementShape {
        let normalized = self.normalize(text);
        match parser::parse(&normalized) {
            Ok(parsed) => parsed.shape,
            Err(_) => StatementShape::Unrecognized {
                original_text: text.to_string(),
            },
        }
    }

    /// Normalizes, classifies and binds without touching any store.
    pub fn bind(
        &self,
        text: &str,
        params: &[SqlValue],
    ) -> std::result::Result<BoundStatement, UnsupportedReason> {
        let normalized = self.normalize(text);
        let parsed = parser::parse(&normalized).map_err(UnsupportedReason::from)?;
        binder::bind(parsed, params, &self.config)
    }

    /// Translates and executes a statement.
    ///
    /// Untranslatable statements come back as `Ok(Unsupported(reason))`;
    /// only store failures are errors.
    pub async fn translate(
        &self,
        text: &str,
        params: &[SqlValue],
        querier: &Querier,
    ) -> Result<TranslationOutcome> {
        let bound = match self.bind(text, params) {
            Ok(bound) => bound,
            Err(reason) => {
                tracing::warn!(statement = %text, reason = %reason, "sql.unsupported");
                return Ok(TranslationOutcome::Unsupported(reason));
            }
        };
        tracing::debug!(
            shape = bound.shape.kind(),
            table = bound.shape.table().unwrap_or_default(),
            params = params.len(),
            "sql.translate"
        );
        dispatch(&bound, querier, &self.config).await
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(ShimConfig::default())
    }
}

/// Classifies already-normalized text with no other processing.
pub fn classify(normalized: &str) -> StatementShape {
    match parser::parse(normalized) {
        Ok(parsed) => parsed.shape,
        Err(_) => StatementShape::Unrecognized {
            original_text: normalized.to_string(),
        },
    }
}
