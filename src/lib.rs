//! sqlshim - run legacy parameterized SQL against a filter-builder table store
//!
//! Legacy call sites speak `query(sql, params)` / `run(sql, params)`. The
//! store only understands table-scoped requests: select, insert, update or
//! delete with simple comparison filters. sqlshim recognizes a closed set of
//! statement shapes and turns each into one such request. Anything else is an
//! explicit `Unsupported` outcome rather than a guess.
//!
//! # Example
//! ```ignore
//! use sqlshim::{Database, ShimConfig, SqlValue};
//!
//! // Connect to database
//! let db = Database::connect("postgres://localhost/loja", ShimConfig::default()).await?;
//!
//! // Legacy statement path
//! let result = db
//!     .run(
//!         "INSERT INTO produtos (nome, preco_venda) VALUES (?, ?)",
//!         &["Tela".into(), 120.5.into()],
//!     )
//!     .await?;
//!
//! // Structured path
//! let produto = db.get("produtos", result.id.unwrap_or(SqlValue::Null)).await?;
//! ```

pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod querier;
pub mod traits;
pub mod translate;
pub mod types;

mod facade;

// Re-export main types for convenient access
pub use clauses::{CompareOp, CountMode, Filter, OrderBy};
pub use config::{CountFilterPolicy, ShimConfig, UnsupportedPolicy};
pub use error::{Result, ShimError, UnsupportedReason};
pub use facade::{Database, RunResult};
pub use querier::Querier;
pub use traits::TableStore;
pub use translate::{BoundStatement, StatementShape, TranslationOutcome, Translator};
pub use types::{Action, Record, RowSet, SqlValue, StoreRequest};
