use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RowSet, StoreRequest};

/// The table-scoped filter-builder capability the shim targets.
///
/// A store receives one fully built request per call and answers it in a
/// single round trip. It never sees raw SQL from callers. Implementations are
/// responsible for:
/// - Applying filters, ordering, limit and count modifiers
/// - Converting SqlValue parameters to native types
/// - Returning affected rows for mutations when `returning` is set
///
/// Failures surface as `ShimError::StoreFailed` or `ShimError::ConnectionFailed`
/// and are passed to the caller unchanged; nothing above this trait retries.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn execute(&self, request: &StoreRequest) -> Result<RowSet>;
}
