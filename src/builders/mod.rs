mod mutation;
mod select;

use std::sync::Arc;

use crate::traits::TableStore;
use crate::types::{Action, Record, StoreRequest};

pub use mutation::{DeleteBuilder, FilteredMutation, InsertBuilder, UpdateBuilder};
pub use select::SelectBuilder;

/// Entry point for a request against one table.
/// Must call `.select()`, `.insert()`, `.update()` or `.delete()` to proceed.
pub struct TableQuery {
    store: Arc<dyn TableStore>,
    table: String,
}

impl TableQuery {
    pub(crate) fn new(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Read the given columns; pass `&["*"]` for every column.
    pub fn select(self, columns: &[&str]) -> SelectBuilder {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        SelectBuilder::new(
            self.store,
            StoreRequest::new(self.table, Action::Select { columns }),
        )
    }

    pub fn insert(self, record: Record) -> InsertBuilder {
        InsertBuilder::new(
            self.store,
            StoreRequest::new(self.table, Action::Insert { record }),
        )
    }

    pub fn update(self, values: Record) -> UpdateBuilder {
        FilteredMutation::new(
            self.store,
            StoreRequest::new(self.table, Action::Update { values }),
        )
    }

    pub fn delete(self) -> DeleteBuilder {
        FilteredMutation::new(self.store, StoreRequest::new(self.table, Action::Delete))
    }
}
