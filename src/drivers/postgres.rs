use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

use crate::clauses::quote_ident;
use crate::error::{Result, ShimError};
use crate::traits::TableStore;
use crate::types::{Action, Record, RowSet, SqlValue, StoreRequest};

const WINDOW_COUNT_COLUMN: &str = "__sqlshim_count";

/// Table store backed by PostgreSQL through tokio-postgres.
///
/// Each request is rendered into one parameterized statement. Nothing but
/// builder-produced requests reaches the server.
pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| ShimError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection closed");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl TableStore for PostgresStore {
    async fn execute(&self, request: &StoreRequest) -> Result<RowSet> {
        let (sql, params) = render(request)?;
        tracing::debug!(table = %request.table, sql = %sql, "postgres.execute");

        let statement = self
            .client
            .prepare(&sql)
            .await
            .map_err(|e| ShimError::StoreFailed(e.to_string()))?;

        // Bind each value to the type the server inferred for its placeholder
        let bound = params
            .iter()
            .zip(statement.params())
            .map(|(value, ty)| bind_param(value, ty))
            .collect::<Result<Vec<_>>>()?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = bound
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(&statement, &param_refs)
            .await
            .map_err(|e| ShimError::StoreFailed(e.to_string()))?;

        if request.count.is_some() && request.head {
            let count = match rows.first() {
                Some(row) => row
                    .try_get::<_, i64>(0)
                    .map_err(|e| ShimError::StoreFailed(e.to_string()))?,
                None => 0,
            };
            return Ok(RowSet::empty().with_count(count as u64));
        }

        let mut records = rows.iter().map(row_to_record).collect::<Result<Vec<_>>>()?;
        if request.count.is_some() {
            let mut count = 0;
            for record in records.iter_mut() {
                if let Some(total) = record.remove(WINDOW_COUNT_COLUMN).and_then(|v| v.as_i64()) {
                    count = total as u64;
                }
            }
            return Ok(RowSet::new(records).with_count(count));
        }
        Ok(RowSet::new(records))
    }
}

/// Renders a request into SQL with `$n` placeholders and its parameters.
pub fn render(request: &StoreRequest) -> Result<(String, Vec<SqlValue>)> {
    let mut sql = String::with_capacity(128);
    let mut params = Vec::new();
    let table = quote_ident(&request.table);

    match &request.action {
        Action::Select { columns } => {
            let projection = if columns.is_empty() || columns.iter().any(|c| c == "*") {
                "*".to_string()
            } else {
                columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ")
            };
            sql.push_str("SELECT ");
            match (request.count.is_some(), request.head) {
                (true, true) => sql.push_str("count(*)"),
                (true, false) => {
                    sql.push_str(&projection);
                    sql.push_str(", count(*) OVER () AS ");
                    sql.push_str(&quote_ident(WINDOW_COUNT_COLUMN));
                }
                _ => sql.push_str(&projection),
            }
            sql.push_str(" FROM ");
            sql.push_str(&table);
        }
        Action::Insert { record } => {
            sql.push_str("INSERT INTO ");
            sql.push_str(&table);
            if record.is_empty() {
                sql.push_str(" DEFAULT VALUES");
            } else {
                let (columns, placeholders): (Vec<_>, Vec<_>) = record
                    .iter()
                    .map(|(column, value)| {
                        params.push(value.clone());
                        (quote_ident(column), format!("${}", params.len()))
                    })
                    .unzip();
                sql.push_str(&format!(
                    " ({}) VALUES ({})",
                    columns.join(", "),
                    placeholders.join(", ")
                ));
            }
        }
        Action::Update { values } => {
            if values.is_empty() {
                return Err(ShimError::StoreFailed(format!(
                    "UPDATE on {} has no values",
                    request.table
                )));
            }
            let assignments: Vec<String> = values
                .iter()
                .map(|(column, value)| {
                    params.push(value.clone());
                    format!("{} = ${}", quote_ident(column), params.len())
                })
                .collect();
            sql.push_str("UPDATE ");
            sql.push_str(&table);
            sql.push_str(" SET ");
            sql.push_str(&assignments.join(", "));
        }
        Action::Delete => {
            sql.push_str("DELETE FROM ");
            sql.push_str(&table);
        }
    }

    // WHERE clause
    if !request.filters.is_empty() {
        let conditions: Vec<String> = request
            .filters
            .iter()
            .map(|f| f.build_sql(0, &mut params))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if !request.is_mutation() && !request.head {
        if let Some(order) = &request.order {
            sql.push_str(" ORDER BY ");
            sql.push_str(&quote_ident(&order.column));
            sql.push_str(if order.ascending { " ASC" } else { " DESC" });
        }
        if let Some(limit) = request.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }
    }

    if request.is_mutation() && request.returning {
        sql.push_str(" RETURNING *");
    }

    Ok((sql, params))
}

fn bind_error(value: &SqlValue, ty: &Type) -> ShimError {
    ShimError::StoreFailed(format!("cannot bind {:?} as {}", value, ty))
}

/// Convert a SqlValue to a boxed ToSql matching the parameter type.
fn bind_param(value: &SqlValue, ty: &Type) -> Result<Box<dyn ToSql + Sync + Send>> {
    let boxed: Box<dyn ToSql + Sync + Send> = match *ty {
        Type::BOOL => Box::new(to_bool(value).ok_or_else(|| bind_error(value, ty))?),
        Type::INT2 => {
            let v = to_int(value, ty)?
                .map(i16::try_from)
                .transpose()
                .map_err(|_| bind_error(value, ty))?;
            Box::new(v)
        }
        Type::INT4 => {
            let v = to_int(value, ty)?
                .map(i32::try_from)
                .transpose()
                .map_err(|_| bind_error(value, ty))?;
            Box::new(v)
        }
        Type::INT8 => Box::new(to_int(value, ty)?),
        Type::FLOAT4 => Box::new(to_float(value, ty)?.map(|f| f as f32)),
        Type::FLOAT8 => Box::new(to_float(value, ty)?),
        Type::NUMERIC => Box::new(to_decimal(value, ty)?),
        Type::UUID => Box::new(to_uuid(value, ty)?),
        Type::TIMESTAMPTZ => Box::new(to_timestamp(value, ty)?),
        Type::TIMESTAMP => Box::new(to_timestamp(value, ty)?.map(|t| t.naive_utc())),
        Type::DATE => Box::new(to_timestamp(value, ty)?.map(|t| t.date_naive())),
        Type::JSON | Type::JSONB => Box::new(match value {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(
                serde_json::from_str::<serde_json::Value>(s)
                    .unwrap_or_else(|_| serde_json::Value::String(s.clone())),
            ),
            other => Some(serde_json::Value::from(other.clone())),
        }),
        _ => Box::new(match value {
            SqlValue::Null => None,
            SqlValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }),
    };
    Ok(boxed)
}

/// `None` means the value cannot be a boolean; `Some(None)` is NULL.
fn to_bool(value: &SqlValue) -> Option<Option<bool>> {
    match value {
        SqlValue::Null => Some(None),
        SqlValue::Bool(b) => Some(Some(*b)),
        SqlValue::Int(0) => Some(Some(false)),
        SqlValue::Int(1) => Some(Some(true)),
        SqlValue::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(Some(true)),
            "false" | "f" | "0" => Some(Some(false)),
            _ => None,
        },
        _ => None,
    }
}

fn to_int(value: &SqlValue, ty: &Type) -> Result<Option<i64>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Bool(b) => Ok(Some(*b as i64)),
        other => other.as_i64().map(Some).ok_or_else(|| bind_error(value, ty)),
    }
}

fn to_float(value: &SqlValue, ty: &Type) -> Result<Option<f64>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Int(i) => Ok(Some(*i as f64)),
        SqlValue::Float(f) => Ok(Some(*f)),
        SqlValue::Text(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| bind_error(value, ty)),
        SqlValue::Bool(_) => Err(bind_error(value, ty)),
    }
}

fn to_decimal(value: &SqlValue, ty: &Type) -> Result<Option<Decimal>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Int(i) => Ok(Some(Decimal::from(*i))),
        SqlValue::Float(f) => Decimal::from_f64(*f)
            .map(Some)
            .ok_or_else(|| bind_error(value, ty)),
        SqlValue::Text(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| bind_error(value, ty)),
        SqlValue::Bool(_) => Err(bind_error(value, ty)),
    }
}

fn to_uuid(value: &SqlValue, ty: &Type) -> Result<Option<Uuid>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Text(s) => Uuid::parse_str(s.trim())
            .map(Some)
            .map_err(|_| bind_error(value, ty)),
        _ => Err(bind_error(value, ty)),
    }
}

/// NUMERIC reads as a float when it fits, otherwise as its exact text.
fn decimal_value(d: Decimal) -> SqlValue {
    match d.to_f64() {
        Some(f) if Decimal::from_f64(f) == Some(d) => SqlValue::Float(f),
        _ => SqlValue::Text(d.to_string()),
    }
}

fn to_timestamp(value: &SqlValue, ty: &Type) -> Result<Option<DateTime<Utc>>> {
    match value {
        SqlValue::Null => Ok(None),
        SqlValue::Int(secs) => DateTime::from_timestamp(*secs, 0)
            .map(Some)
            .ok_or_else(|| bind_error(value, ty)),
        SqlValue::Text(s) => {
            let s = s.trim();
            if matches!(
                s.to_ascii_lowercase().as_str(),
                "now()" | "now" | "current_timestamp"
            ) {
                return Ok(Some(Utc::now()));
            }
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Ok(Some(t.with_timezone(&Utc)));
            }
            ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|t| Some(t.and_utc()))
                .ok_or_else(|| bind_error(value, ty))
        }
        _ => Err(bind_error(value, ty)),
    }
}

fn row_to_record(row: &Row) -> Result<Record> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| Ok((col.name().to_string(), column_value(row, i, col.type_())?)))
        .collect()
}

/// Read one column as a SqlValue according to its declared type.
fn column_value(row: &Row, index: usize, ty: &Type) -> Result<SqlValue> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(index).map(SqlValue::from),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(index)
            .map(|v| v.map(i64::from).into()),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(index)
            .map(|v| v.map(i64::from).into()),
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(SqlValue::from),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(index)
            .map(|v| v.map(f64::from).into()),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(SqlValue::from),
        Type::NUMERIC => row
            .try_get::<_, Option<Decimal>>(index)
            .map(|v| v.map(decimal_value).unwrap_or(SqlValue::Null)),
        Type::UUID => row
            .try_get::<_, Option<Uuid>>(index)
            .map(|v| v.map(|u| u.to_string()).into()),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(index)
            .map(|v| v.map(|t| t.to_rfc3339()).into()),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(index)
            .map(|v| v.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()).into()),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(index)
            .map(|v| v.map(|d| d.to_string()).into()),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .map(|v| v.map(SqlValue::from).unwrap_or(SqlValue::Null)),
        _ => row.try_get::<_, Option<String>>(index).map(SqlValue::from),
    };
    value.map_err(|e| {
        ShimError::StoreFailed(format!("cannot read column {} of type {}: {}", index, ty, e))
    })
}
