//! Binds positional parameters to a parsed statement.

use crate::config::{CountFilterPolicy, ShimConfig};
use crate::error::UnsupportedReason;
use crate::types::SqlValue;

use super::parser::{ParsedStatement, WhereClause};
use super::{BoundStatement, Operand, StatementShape};

/// Checks arity and predicate policy, producing a statement ready to dispatch.
///
/// Mutations need exactly one param per placeholder. SELECTs need at least
/// that many and ignore the rest.
pub(crate) fn bind(
    parsed: ParsedStatement,
    params: &[SqlValue],
    config: &ShimConfig,
) -> Result<BoundStatement, UnsupportedReason> {
    let ParsedStatement {
        shape,
        values,
        filter,
        modifiers,
        count_alias,
        placeholders,
    } = parsed;

    let predicate = match (&shape, filter) {
        (_, WhereClause::None) => None,
        (StatementShape::SelectCount { .. }, _)
            if config.count_filter == CountFilterPolicy::Ignore =>
        {
            None
        }
        (_, WhereClause::Single(predicate)) => Some(predicate),
        (_, WhereClause::Opaque(miss)) => return Err(miss.into()),
    };

    match &shape {
        StatementShape::Insert { columns, .. } if columns.len() != values.len() => {
            return Err(UnsupportedReason::ExtractionMismatch {
                expected: columns.len(),
                actual: values.len(),
            });
        }
        StatementShape::Insert { .. }
        | StatementShape::Update { .. }
        | StatementShape::Delete { .. } => {
            if params.len() != placeholders {
                return Err(UnsupportedReason::ExtractionMismatch {
                    expected: placeholders,
                    actual: params.len(),
                });
            }
        }
        StatementShape::SelectCount { .. } if predicate.is_none() => {}
        StatementShape::SelectAll { .. } | StatementShape::SelectCount { .. } => {
            if params.len() < placeholders {
                return Err(UnsupportedReason::ExtractionMismatch {
                    expected: placeholders,
                    actual: params.len(),
                });
            }
        }
        StatementShape::Unrecognized { .. } => return Err(UnsupportedReason::ClassificationMiss),
    }

    if let Some(predicate) = &predicate {
        if !config.literal_predicates && matches!(predicate.value, Operand::Literal(_)) {
            return Err(UnsupportedReason::LiteralPredicate);
        }
    }

    Ok(BoundStatement {
        shape,
        predicate,
        params: params.to_vec(),
        values,
        modifiers,
        count_alias,
    })
}
