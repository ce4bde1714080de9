mod request;
mod row;
mod sql_value;

pub use request::{Action, StoreRequest};
pub use row::{Record, RowSet};
pub use sql_value::SqlValue;
