use std::sync::Arc;

use crate::builders::TableQuery;
use crate::traits::TableStore;

/// Request builder factory.
/// Created from a Database and used to build and execute table requests.
#[derive(Clone)]
pub struct Querier {
    store: Arc<dyn TableStore>,
}

impl Querier {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Start building a request against `table`.
    pub fn from(&self, table: impl Into<String>) -> TableQuery {
        TableQuery::new(Arc::clone(&self.store), table)
    }
}
