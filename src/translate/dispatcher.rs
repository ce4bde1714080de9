//! Maps a bound statement onto one builder call.

use crate::clauses::CountMode;
use crate::config::ShimConfig;
use crate::error::{Result, UnsupportedReason};
use crate::querier::Querier;
use crate::types::{Record, SqlValue};

use super::{BoundStatement, StatementShape, TranslationOutcome};

/// Executes a bound statement with a single store request.
///
/// Store failures are returned as errors untouched. An unrecognized shape
/// never reaches the store.
pub async fn dispatch(
    bound: &BoundStatement,
    querier: &Querier,
    config: &ShimConfig,
) -> Result<TranslationOutcome> {
    let filter = bound.predicate_filter();

    match &bound.shape {
        StatementShape::Insert { table, .. } => {
            let rows = querier
                .from(table.as_str())
                .insert(bound.assignments())
                .returning()
                .execute()
                .await?;
            let affected_id = rows
                .rows_ref()
                .first()
                .and_then(|row| row.get(&config.id_column).cloned());
            Ok(TranslationOutcome::Mutation {
                affected_id,
                affected_count: 1,
            })
        }
        StatementShape::Update { table, .. } => {
            let mut builder = querier.from(table.as_str()).update(bound.assignments());
            if let Some(f) = filter {
                builder = builder.filter(f.column, f.op, f.value);
            }
            let rows = builder.returning().execute().await?;
            Ok(TranslationOutcome::Mutation {
                affected_id: None,
                affected_count: rows.len() as u64,
            })
        }
        StatementShape::Delete { table } => {
            let mut builder = querier.from(table.as_str()).delete();
            if let Some(f) = filter {
                builder = builder.filter(f.column, f.op, f.value);
            }
            let rows = builder.returning().execute().await?;
            Ok(TranslationOutcome::Mutation {
                affected_id: None,
                affected_count: rows.len() as u64,
            })
        }
        StatementShape::SelectAll { table } => {
            let mut builder = querier.from(table.as_str()).select(&["*"]);
            if let Some(f) = filter {
                builder = builder.filter(f.column, f.op, f.value);
            }
            if let Some(order) = &bound.modifiers.order {
                builder = builder.order(order.clone());
            }
            if let Some(limit) = bound.modifiers.limit {
                builder = builder.limit(limit);
            }
            Ok(TranslationOutcome::Rows(builder.execute().await?.rows()))
        }
        StatementShape::SelectCount { table } => {
            let mut builder = querier
                .from(table.as_str())
                .select(&["*"])
                .count(CountMode::Exact)
                .head();
            if let Some(f) = filter {
                builder = builder.filter(f.column, f.op, f.value);
            }
            let result = builder.execute().await?;
            let total = result.count().unwrap_or(result.len() as u64);
            let alias = bound.count_alias.as_deref().unwrap_or(&config.count_alias);
            Ok(TranslationOutcome::Rows(vec![
                Record::new().with(alias, SqlValue::Int(total as i64))
            ]))
        }
        StatementShape::Unrecognized { .. } => Ok(TranslationOutcome::Unsupported(
            UnsupportedReason::ClassificationMiss,
        )),
    }
}
