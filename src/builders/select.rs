use std::sync::Arc;

use crate::clauses::{CompareOp, CountMode, Filter, OrderBy};
use crate::error::Result;
use crate::traits::TableStore;
use crate::types::{Record, RowSet, SqlValue, StoreRequest};

/// SELECT builder after table and columns have been specified.
/// Can optionally add filters, ORDER BY, LIMIT, a count, or execute directly.
pub struct SelectBuilder {
    store: Arc<dyn TableStore>,
    request: StoreRequest,
}

impl SelectBuilder {
    pub(crate) fn new(store: Arc<dyn TableStore>, request: StoreRequest) -> Self {
        Self { store, request }
    }

    /// Keep rows where `column = value`.
    pub fn eq(self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.filter(column, CompareOp::Eq, value)
    }

    /// Keep rows where `column <op> value`.
    pub fn filter(
        mut self,
        column: impl Into<String>,
        op: CompareOp,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.request.filters.push(Filter::new(column, op, value));
        self
    }

    /// Keep rows matching every column of `conditions` by equality.
    pub fn match_all(mut self, conditions: &Record) -> Self {
        for (column, value) in conditions.iter() {
            self.request.filters.push(Filter::eq(column.clone(), value.clone()));
        }
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.request.order = Some(order);
        self
    }

    /// Add a LIMIT to the query.
    pub fn limit(mut self, n: u64) -> Self {
        self.request.limit = Some(n);
        self
    }

    /// Ask the store for the number of matching rows.
    pub fn count(mut self, mode: CountMode) -> Self {
        self.request.count = Some(mode);
        self
    }

    /// Only the count is wanted; the store returns no rows.
    pub fn head(mut self) -> Self {
        self.request.head = true;
        self
    }

    pub(crate) fn build(self) -> (Arc<dyn TableStore>, StoreRequest) {
        (self.store, self.request)
    }

    /// Execute the request and return the result.
    pub async fn execute(self) -> Result<RowSet> {
        let (store, request) = self.build();
        store.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::querier::Querier;
    use crate::types::Action;
    use async_trait::async_trait;

    // Mock store for testing
    struct MockStore;

    #[async_trait]
    impl TableStore for MockStore {
        async fn execute(&self, _request: &StoreRequest) -> Result<RowSet> {
            Ok(RowSet::empty())
        }
    }

    fn querier() -> Querier {
        Querier::new(Arc::new(MockStore))
    }

    #[test]
    fn test_build_simple_select() {
        let (_, request) = querier().from("users").select(&["id", "name"]).build();

        assert_eq!(request.table, "users");
        assert_eq!(
            request.action,
            Action::Select {
                columns: vec!["id".to_string(), "name".to_string()]
            }
        );
        assert!(request.filters.is_empty());
        assert_eq!(request.limit, None);
    }

    #[test]
    fn test_build_select_with_filter() {
        let (_, request) = querier()
            .from("users")
            .select(&["*"])
            .eq("name", "John")
            .build();

        assert_eq!(request.filters, vec![Filter::eq("name", "John")]);
    }

    #[test]
    fn test_build_select_with_order_and_limit() {
        let (_, request) = querier()
            .from("users")
            .select(&["*"])
            .filter("age", CompareOp::Gte, 18)
            .order(OrderBy::desc("created_at"))
            .limit(10)
            .build();

        assert_eq!(request.filters.len(), 1);
        assert_eq!(request.order, Some(OrderBy::desc("created_at")));
        assert_eq!(request.limit, Some(10));
    }

    #[test]
    fn test_build_count_head() {
        let (_, request) = querier()
            .from("clientes")
            .select(&["*"])
            .match_all(&Record::new().with("ativo", true).with("cidade", "Recife"))
            .count(CountMode::Exact)
            .head()
            .build();

        assert_eq!(request.count, Some(CountMode::Exact));
        assert!(request.head);
        assert_eq!(request.filters.len(), 2);
    }
}
