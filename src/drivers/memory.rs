use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::clauses::Filter;
use crate::error::{Result, ShimError};
use crate::traits::TableStore;
use crate::types::{Action, Record, RowSet, SqlValue, StoreRequest};

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Record>,
    next_id: i64,
}

impl MemoryTable {
    fn assign_id(&mut self, id_column: &str, record: &mut Record) {
        match record.get(id_column).and_then(SqlValue::as_i64) {
            Some(id) => self.next_id = self.next_id.max(id),
            None if record.get(id_column).is_none() => {
                self.next_id += 1;
                record.insert(id_column, self.next_id);
            }
            None => {}
        }
    }
}

/// An in-memory table store.
///
/// Serves the same requests a remote store would and records every request
/// it receives, so tests can verify what the shim sent.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use sqlshim::drivers::MemoryStore;
/// use sqlshim::types::Record;
///
/// let store = Arc::new(
///     MemoryStore::new()
///         .with_table("clientes")
///         .with_rows("produtos", vec![Record::new().with("nome", "Tela")]),
/// );
/// ```
pub struct MemoryStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
    recorded_requests: Mutex<Vec<StoreRequest>>,
    failures: Mutex<VecDeque<String>>,
    id_column: String,
}

impl MemoryStore {
    /// Create a store with no tables. Row ids live in the `id` column.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            recorded_requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            id_column: "id".to_string(),
        }
    }

    /// Use a different column for store-assigned ids.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Create an empty table.
    pub fn with_table(self, table: &str) -> Self {
        lock(&self.tables).entry(table.to_string()).or_default();
        self
    }

    /// Create a table (if needed) and append rows, assigning ids where missing.
    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Record>) -> Self {
        {
            let mut tables = lock(&self.tables);
            let entry = tables.entry(table.to_string()).or_default();
            for mut row in rows {
                entry.assign_id(&self.id_column, &mut row);
                entry.rows.push(row);
            }
        }
        self
    }

    /// Make the next request fail with `StoreFailed(message)` without touching data.
    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.failures).push_back(message.into());
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        lock(&self.tables)
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Get all recorded requests that have been executed.
    pub fn recorded_requests(&self) -> Vec<StoreRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// Get the last recorded request, if any.
    pub fn last_request(&self) -> Option<StoreRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    /// Clear all recorded requests.
    pub fn clear_recorded_requests(&self) {
        lock(&self.recorded_requests).clear();
    }

    /// Assert that exactly n requests were executed.
    pub fn assert_request_count(&self, expected: usize) {
        let actual = lock(&self.recorded_requests).len();
        assert_eq!(
            actual, expected,
            "Request count mismatch. Expected: {}, Actual: {}",
            expected, actual
        );
    }

    fn apply(&self, request: &StoreRequest) -> Result<RowSet> {
        let mut tables = lock(&self.tables);
        let table = tables.get_mut(&request.table).ok_or_else(|| {
            ShimError::StoreFailed(format!("relation \"{}\" does not exist", request.table))
        })?;

        if matches!(request.action, Action::Update { .. } | Action::Delete)
            && request.filters.is_empty()
        {
            return Err(ShimError::StoreFailed(format!(
                "{} on \"{}\" requires a filter",
                if matches!(request.action, Action::Delete) { "DELETE" } else { "UPDATE" },
                request.table
            )));
        }

        let filters: Vec<Filter> = request
            .filters
            .iter()
            .map(|f| Filter::new(f.column.clone(), f.op, resolve_now(&f.value)))
            .collect();
        let matches = |row: &Record| filters.iter().all(|f| f.matches(row));

        let affected = match &request.action {
            Action::Select { columns } => return Ok(select(table, request, columns, matches)),
            Action::Insert { record } => {
                let mut record = resolve_record(record);
                table.assign_id(&self.id_column, &mut record);
                table.rows.push(record.clone());
                vec![record]
            }
            Action::Update { values } => {
                let values = resolve_record(values);
                let mut updated = Vec::new();
                for row in table.rows.iter_mut().filter(|r| matches(&**r)) {
                    row.merge(&values);
                    updated.push(row.clone());
                }
                updated
            }
            Action::Delete => {
                let (removed, kept): (Vec<Record>, Vec<Record>) = std::mem::take(&mut table.rows)
                    .into_iter()
                    .partition(|r| matches(r));
                table.rows = kept;
                removed
            }
        };

        if request.returning {
            Ok(RowSet::new(affected))
        } else {
            Ok(RowSet::empty())
        }
    }
}

/// Text the translator uses for "the current time".
const NOW_TEXT: &str = "now()";

/// Replaces the now literal with the current UTC time, `YYYY-MM-DD HH:MM:SS`.
fn resolve_now(value: &SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(s) if s.trim().eq_ignore_ascii_case(NOW_TEXT) => {
            SqlValue::Text(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string())
        }
        other => other.clone(),
    }
}

fn resolve_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(column, value)| (column.clone(), resolve_now(value)))
        .collect()
}

fn select(
    table: &MemoryTable,
    request: &StoreRequest,
    columns: &[String],
    matches: impl Fn(&Record) -> bool,
) -> RowSet {
    let mut rows: Vec<Record> = table.rows.iter().filter(|r| matches(*r)).cloned().collect();
    let total = rows.len() as u64;

    if let Some(order) = &request.order {
        rows.sort_by(|a, b| {
            let ordering = match (a.get(&order.column), b.get(&order.column)) {
                (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if order.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
    }
    if let Some(limit) = request.limit {
        rows.truncate(limit as usize);
    }

    let projected = columns.iter().all(|c| c != "*");
    let rows = if request.head {
        Vec::new()
    } else if projected {
        rows.into_iter()
            .map(|row| {
                columns
                    .iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect()
            })
            .collect()
    } else {
        rows
    };

    let result = RowSet::new(rows);
    match request.count {
        Some(_) => result.with_count(total),
        None => result,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn execute(&self, request: &StoreRequest) -> Result<RowSet> {
        // Record the request
        lock(&self.recorded_requests).push(request.clone());

        if let Some(message) = lock(&self.failures).pop_front() {
            return Err(ShimError::StoreFailed(message));
        }

        self.apply(request)
    }
}
