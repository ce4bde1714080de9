use std::sync::Arc;

use crate::clauses::{CompareOp, Filter};
use crate::error::Result;
use crate::traits::TableStore;
use crate::types::{RowSet, SqlValue, StoreRequest};

/// INSERT builder. Call `.returning()` to get the stored row back.
pub struct InsertBuilder {
    store: Arc<dyn TableStore>,
    request: StoreRequest,
}

impl InsertBuilder {
    pub(crate) fn new(store: Arc<dyn TableStore>, request: StoreRequest) -> Self {
        Self { store, request }
    }

    pub fn returning(mut self) -> Self {
        self.request.returning = true;
        self
    }

    pub(crate) fn build(self) -> (Arc<dyn TableStore>, StoreRequest) {
        (self.store, self.request)
    }

    pub async fn execute(self) -> Result<RowSet> {
        let (store, request) = self.build();
        store.execute(&request).await
    }
}

/// UPDATE or DELETE builder.
/// Filters select the affected rows; `.returning()` returns them.
pub struct FilteredMutation {
    store: Arc<dyn TableStore>,
    request: StoreRequest,
}

pub type UpdateBuilder = FilteredMutation;
pub type DeleteBuilder = FilteredMutation;

impl FilteredMutation {
    pub(crate) fn new(store: Arc<dyn TableStore>, request: StoreRequest) -> Self {
        Self { store, request }
    }

    /// Affect rows where `column = value`.
    pub fn eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.filter(column, CompareOp::Eq, value)
    }

    /// Affect rows where `column <op> value`.
    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.request.filters.push(Filter::new(column, op, value));
        self
    }

    pub fn returning(mut self) -> Self {
        self.request.returning = true;
        self
    }

    pub(crate) fn build(self) -> (Arc<dyn TableStore>, StoreRequest) {
        (self.store, self.request)
    }

    pub async fn execute(self) -> Result<RowSet> {
        let (store, request) = self.build();
        store.execute(&request).await
    }
}
