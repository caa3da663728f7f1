//! PostgreSQL document store.
//!
//! Each tenant gets its own schema; a resource table has the layout
//! `(id TEXT PRIMARY KEY, jsonb JSONB NOT NULL)`.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgDatabaseError, PgPoolOptions};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};

use super::{generate_id, stamp_id, DocumentPage, DocumentStore, StoreError, StoreResult};
use crate::domain::cql::{CompareValue, Matcher, Predicate, SortDirection, SortKey};
use crate::domain::query::BoundedQuery;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => {
                let detail = db
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.detail())
                    .map(|d| d.to_string());
                StoreError::Database {
                    code: db.code().map(|c| c.into_owned()),
                    message: db.message().to_string(),
                    detail,
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Tls(_) | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(e.to_string()),
            other => StoreError::Database {
                code: None,
                message: other.to_string(),
                detail: None,
            },
        }
    }
}

/// Opens the shared connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Store over one tenant schema.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    schema: String,
}

impl PostgresDocumentStore {
    /// `schema` must be a validated SQL identifier.
    pub fn new(pool: PgPool, schema: String) -> Self {
        Self { pool, schema }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.schema, table)
    }

    /// Creates the tenant schema and the resource table when missing.
    pub async fn ensure_table(&self, table: &str) -> StoreResult<()> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                jsonb JSONB NOT NULL
            )",
            self.qualified(table)
        ))
        .execute(&self.pool)
        .await?;
        info!("Table {} is ready", self.qualified(table));
        Ok(())
    }
}

fn push_path(qb: &mut QueryBuilder<'_, Postgres>, column: &str, op: &str, path: &[String]) {
    qb.push("(")
        .push(column)
        .push(format!(" {} ", op))
        .push_bind(path.to_vec())
        .push("::text[])");
}

fn push_text(qb: &mut QueryBuilder<'_, Postgres>, column: &str, path: &[String]) {
    push_path(qb, column, "#>>", path);
}

fn push_numeric_case(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    path: &[String],
    op: &str,
    n: f64,
) {
    qb.push("CASE WHEN jsonb_typeof");
    push_path(qb, column, "#>", path);
    qb.push(" = 'number' THEN ");
    push_text(qb, column, path);
    qb.push(format!("::numeric {} ", op))
        .push_bind(n)
        .push("::numeric ELSE FALSE END");
}

fn push_matcher(qb: &mut QueryBuilder<'_, Postgres>, column: &str, path: &[String], matcher: &Matcher) {
    qb.push("COALESCE(");
    match matcher {
        Matcher::Pattern {
            pattern,
            numeric,
            negate,
            ..
        } => {
            if *negate {
                qb.push("NOT ");
            }
            qb.push("(");
            push_text(qb, column, path);
            qb.push(" ~ ").push_bind(pattern.clone());
            if let Some(n) = numeric {
                qb.push(" OR ");
                push_numeric_case(qb, column, path, "=", *n);
            }
            qb.push(")");
        }
        Matcher::Compare { op, value } => match value {
            CompareValue::Number(n) => push_numeric_case(qb, column, path, op.sql(), *n),
            CompareValue::Text(t) => {
                push_text(qb, column, path);
                qb.push(format!(" COLLATE \"C\" {} ", op.sql()))
                    .push_bind(t.clone());
            }
        },
    }
    qb.push(", FALSE)");
}

/// Renders `predicate` as a boolean SQL expression over `column`.
pub fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, column: &str, predicate: &Predicate) {
    match predicate {
        Predicate::All => {
            qb.push("TRUE");
        }
        Predicate::KeyEquals(id) => {
            qb.push("id = ").push_bind(id.clone());
        }
        Predicate::Field { path, matcher } => push_matcher(qb, column, path, matcher),
        Predicate::And(l, r) => {
            qb.push("(");
            push_predicate(qb, column, l);
            qb.push(" AND ");
            push_predicate(qb, column, r);
            qb.push(")");
        }
        Predicate::Or(l, r) => {
            qb.push("(");
            push_predicate(qb, column, l);
            qb.push(" OR ");
            push_predicate(qb, column, r);
            qb.push(")");
        }
        Predicate::Not(inner) => {
            qb.push("(NOT ");
            push_predicate(qb, column, inner);
            qb.push(")");
        }
    }
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, column: &str, sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }
    qb.push(" ORDER BY ");
    for (i, key) in sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_path(qb, column, "#>", &key.path);
        qb.push(match key.direction {
            SortDirection::Ascending => " ASC",
            SortDirection::Descending => " DESC",
        });
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn list(
        &self,
        table: &str,
        query: &BoundedQuery,
        want_count: bool,
    ) -> StoreResult<DocumentPage> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT jsonb FROM {} WHERE ",
            self.qualified(table)
        ));
        push_predicate(&mut qb, &query.column, &query.predicate);
        push_order_by(&mut qb, &query.column, &query.sort);
        qb.push(" LIMIT ")
            .push_bind(query.limit as i64)
            .push(" OFFSET ")
            .push_bind(query.offset as i64);
        debug!("list: {}", qb.sql());

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            documents.push(row.try_get::<JsonValue, _>("jsonb")?);
        }

        let total = if want_count {
            let mut count = QueryBuilder::<Postgres>::new(format!(
                "SELECT count(*) FROM {} WHERE ",
                self.qualified(table)
            ));
            push_predicate(&mut count, &query.column, &query.predicate);
            let n: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;
            Some(n.max(0) as u64)
        } else {
            None
        };

        Ok(DocumentPage { documents, total })
    }

    async fn get_by_id(&self, table: &str, id: &str) -> StoreResult<Option<JsonValue>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT jsonb FROM {} WHERE ",
            self.qualified(table)
        ));
        push_predicate(&mut qb, "jsonb", &Predicate::KeyEquals(id.to_string()));
        let row = qb.build().fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<JsonValue, _>("jsonb")?)),
            None => Ok(None),
        }
    }

    async fn insert(
        &self,
        table: &str,
        id: Option<&str>,
        document: JsonValue,
    ) -> StoreResult<String> {
        let id = id.map(|s| s.to_string()).unwrap_or_else(generate_id);
        let stored: String = sqlx::query_scalar(&format!(
            "INSERT INTO {} (id, jsonb) VALUES ($1, $2) RETURNING id",
            self.qualified(table)
        ))
        .bind(&id)
        .bind(stamp_id(document, &id))
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update(&self, table: &str, document: JsonValue, id: &str) -> StoreResult<u64> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET jsonb = $1 WHERE id = $2",
            self.qualified(table)
        ))
        .bind(stamp_id(document, id))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, table: &str, id: &str) -> StoreResult<u64> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.qualified(table)))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
