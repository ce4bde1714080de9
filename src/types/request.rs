use crate::clauses::{CountMode, Filter, OrderBy};
use crate::types::Record;

/// What a store request does to its table.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Read the given columns; `["*"]` means every column.
    Select { columns: Vec<String> },
    Insert { record: Record },
    /// Overwrite the given columns on every matching row.
    Update { values: Record },
    Delete,
}

/// A fully built, table-scoped request, as produced by the builders and
/// consumed by a [`TableStore`](crate::traits::TableStore).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub table: String,
    pub action: Action,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub count: Option<CountMode>,
    /// Only the count is wanted, no rows.
    pub head: bool,
    /// Mutations return the affected rows.
    pub returning: bool,
}

impl StoreRequest {
    pub(crate) fn new(table: impl Into<String>, action: Action) -> Self {
        Self {
            table: table.into(),
            action,
            filters: Vec::new(),
            order: None,
            limit: None,
            count: None,
            head: false,
            returning: false,
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self.action, Action::Select { .. })
    }
}
