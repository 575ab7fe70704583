//! Sequence-store resolvers backed by SQLite.
//!
//! Each entity is a [`SqlTable`]: a base `SELECT`, a set of filter clauses
//! and an optional row post-processing step. Filter values are always bound
//! as parameters; only the static clauses and validated window numbers are
//! spliced into the statement text.
//!
//! A page window is pushed into every filter's sub-query before the
//! candidate lists are intersected. With two or more filters a page can
//! therefore come back short when matching rows fall on different pages of
//! different sub-queries. Callers needing exact pages should pass a single
//! filter.

mod entities;

pub use entities::table_for;

use async_trait::async_trait;
use cov2k_core::{
    EntityName, EntityResolver, Filter, FilterIntersection, PageWindow, PaginationPolicy,
    Record, ResolveError, ResolveResult, Scalar,
};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use crate::connection::SqlitePool;
use crate::error::StoreResult;

/// Turns a filter value into the parameters of its clause.
pub type Binder = fn(&'static str, &Scalar) -> ResolveResult<Vec<Value>>;

/// One `AND ...` condition with `?` placeholders.
#[derive(Debug)]
pub struct SqlFilter {
    pub key: &'static str,
    pub clause: &'static str,
    pub bind: Binder,
}

impl SqlFilter {
    fn params(&self, value: &Scalar) -> ResolveResult<Vec<Value>> {
        (self.bind)(self.key, value)
    }
}

#[derive(Debug)]
pub struct SqlTable {
    pub entity: EntityName,
    /// Base query ending in a `WHERE` so clauses can be appended.
    pub select: &'static str,
    pub group_by: Option<&'static str>,
    pub order_by: &'static str,
    pub by_id: SqlFilter,
    /// In evaluation order.
    pub filters: &'static [SqlFilter],
    pub post: Option<fn(Record) -> Record>,
}

impl SqlTable {
    pub fn statement(&self, clause: Option<&str>, window: Option<PageWindow>) -> String {
        let mut sql = String::from(self.select);
        if let Some(clause) = clause {
            sql.push(' ');
            sql.push_str(clause);
        }
        if let Some(group_by) = self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        sql.push(' ');
        match window {
            Some(window) => sql.push_str(&window.sql_fragment(self.order_by)),
            None => {
                sql.push_str("ORDER BY ");
                sql.push_str(self.order_by);
            }
        }
        sql
    }

    fn finish(&self, records: Vec<Record>) -> Vec<Record> {
        match self.post {
            Some(post) => records.into_iter().map(post).collect(),
            None => records,
        }
    }
}

struct Query {
    key: Option<&'static str>,
    sql: String,
    params: Vec<Value>,
}

/// Resolver for one sequence-store entity.
///
/// Pagination is mandatory at the API surface and pushed down into every
/// statement. Without a window the full result is returned.
#[derive(Clone)]
pub struct SqlResolver {
    pool: SqlitePool,
    table: &'static SqlTable,
}

impl SqlResolver {
    pub fn new(pool: SqlitePool, table: &'static SqlTable) -> Self {
        Self { pool, table }
    }

    pub fn entity(&self) -> EntityName {
        self.table.entity
    }

    async fn execute(&self, queries: Vec<Query>) -> ResolveResult<Vec<(Option<&'static str>, Vec<Record>)>> {
        let results = self
            .pool
            .run(move |conn| {
                queries
                    .into_iter()
                    .map(|q| Ok((q.key, fetch(conn, &q.sql, &q.params)?)))
                    .collect::<StoreResult<Vec<_>>>()
            })
            .await?;
        Ok(results
            .into_iter()
            .map(|(key, records)| (key, self.table.finish(records)))
            .collect())
    }
}

#[async_trait]
impl EntityResolver for SqlResolver {
    async fn list(&self, filter: &Filter, window: Option<PageWindow>) -> ResolveResult<Vec<Record>> {
        if let Some(key) = filter
            .keys()
            .find(|k| !self.table.filters.iter().any(|f| f.key == *k))
        {
            return Err(ResolveError::UnsupportedFilter(key.to_string()));
        }

        let mut queries = Vec::new();
        for sql_filter in self.table.filters {
            if let Some(value) = filter.get(sql_filter.key) {
                queries.push(Query {
                    key: Some(sql_filter.key),
                    sql: self.table.statement(Some(sql_filter.clause), window),
                    params: sql_filter.params(value)?,
                });
            }
        }

        if queries.is_empty() {
            debug!(entity = %self.table.entity, "Unfiltered query");
            let sql = self.table.statement(None, window);
            let mut results = self
                .execute(vec![Query {
                    key: None,
                    sql,
                    params: Vec::new(),
                }])
                .await?;
            return Ok(results.pop().map(|(_, records)| records).unwrap_or_default());
        }

        debug!(entity = %self.table.entity, filters = queries.len(), "Filtered query");
        let mut intersection = FilterIntersection::new();
        for (key, records) in self.execute(queries).await? {
            intersection.add_filter(key, records);
        }

        let entity = self.table.entity;
        Ok(intersection
            .intersect(|r| r.identifier(entity).cloned())?
            .into_records()
            .unwrap_or_default())
    }

    async fn get(&self, id: &str) -> ResolveResult<Vec<Record>> {
        let by_id = &self.table.by_id;
        let query = Query {
            key: None,
            sql: self.table.statement(Some(by_id.clause), None),
            params: by_id.params(&Scalar::from(id.trim()))?,
        };
        let mut results = self.execute(vec![query]).await?;
        Ok(results.pop().map(|(_, records)| records).unwrap_or_default())
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::Mandatory
    }

    fn supported_filters(&self) -> Vec<&'static str> {
        self.table.filters.iter().map(|f| f.key).collect()
    }
}

fn fetch(conn: &Connection, sql: &str, params: &[Value]) -> StoreResult<Vec<Record>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut record = Record::new();
        for (idx, name) in columns.iter().enumerate() {
            record.insert(name.clone(), scalar_of(row.get_ref(idx)?));
        }
        Ok(record)
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn scalar_of(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Int(i),
        ValueRef::Real(f) => Scalar::Float(f),
        ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_without_window_is_unbounded() {
        let table = table_for(EntityName::Sequences).unwrap();
        let sql = table.statement(None, None);
        assert!(sql.ends_with("ORDER BY s.sequence_id"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn test_statement_pushes_window_after_group_by() {
        let table = table_for(EntityName::Assays).unwrap();
        let window = PageWindow::new(10, 3).unwrap();
        let sql = table.statement(Some("AND e.cell_type LIKE ?"), Some(window));
        let group = sql.find("GROUP BY").unwrap();
        let clause = sql.find("AND e.cell_type").unwrap();
        assert!(clause < group);
        assert!(sql.ends_with("LIMIT 10 OFFSET 20"));
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(scalar_of(ValueRef::Integer(3)), Scalar::Int(3));
        assert_eq!(scalar_of(ValueRef::Text(b"S")), Scalar::from("S"));
        assert!(scalar_of(ValueRef::Null).is_null());
    }
}
