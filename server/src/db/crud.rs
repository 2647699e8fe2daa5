// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Lookups, listings and deletions shared by all persisted entities.

use crate::db::{count_to_u64, ensure_one_row};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbResult, Executor};
use anta_core::model::{Page, PageRequest};
use futures::TryStreamExt;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A domain type stored as one row of a table.
pub(crate) trait Entity: Sized {
    /// Name of the table that holds the entity.
    const TABLE: &'static str;

    /// Whether rows are flagged with a `deleted` column instead of being removed.
    const SOFT_DELETE: bool = false;

    /// Ordering of listings.
    const ORDER_BY: &'static str = "id";

    /// Parses a PostgreSQL `row` into the entity.
    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self>;

    /// Parses a SQLite `row` into the entity.
    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self>;
}

/// Value to compare a column against.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FilterValue {
    /// An integer, typically a foreign key.
    Int(i64),

    /// A string, typically an enumeration value.
    Text(String),
}

/// Equality condition on one column used to narrow listings.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Filter {
    /// Column to compare.  Never comes from user input.
    column: &'static str,

    /// Value the column must be equal to.
    value: FilterValue,
}

impl Filter {
    /// Matches rows whose `column` equals the integer `value`.
    pub(crate) fn int(column: &'static str, value: i64) -> Self {
        Self { column, value: FilterValue::Int(value) }
    }

    /// Matches rows whose `column` equals the string `value`.
    pub(crate) fn text<S: Into<String>>(column: &'static str, value: S) -> Self {
        Self { column, value: FilterValue::Text(value.into()) }
    }
}

/// Builds the `WHERE` clause for `filters`, hiding soft-deleted rows of `E`.
///
/// `placeholder` returns the syntax for the n-th (1-based) bound parameter.
fn where_clause<E: Entity>(filters: &[Filter], placeholder: fn(usize) -> String) -> String {
    let mut conditions = Vec::with_capacity(filters.len() + 1);
    if E::SOFT_DELETE {
        conditions.push("deleted = FALSE".to_owned());
    }
    for (i, filter) in filters.iter().enumerate() {
        conditions.push(format!("{} = {}", filter.column, placeholder(i + 1)));
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// Placeholder syntax for PostgreSQL.
#[cfg(feature = "postgres")]
fn pg_placeholder(n: usize) -> String {
    format!("${}", n)
}

/// Placeholder syntax for SQLite.
#[cfg(any(feature = "sqlite", test))]
fn sqlite_placeholder(_n: usize) -> String {
    "?".to_owned()
}

/// Binds the values of `filters` to `$query` in order.
macro_rules! bind_filters [
    ( $query:expr, $filters:expr ) => {{
        let mut query = $query;
        for filter in $filters {
            query = match &filter.value {
                FilterValue::Int(i) => query.bind(*i),
                FilterValue::Text(s) => query.bind(s.clone()),
            };
        }
        query
    }}
];

/// Gets the entity of type `E` with identifier `id`.
pub(crate) async fn get<E: Entity>(ex: &mut Executor, id: i64) -> DbResult<E> {
    let hide_deleted = if E::SOFT_DELETE { " AND deleted = FALSE" } else { "" };
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!("SELECT * FROM {} WHERE id = $1{}", E::TABLE, hide_deleted);
            let row = sqlx::query(&query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            E::from_pg_row(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!("SELECT * FROM {} WHERE id = ?{}", E::TABLE, hide_deleted);
            let row = sqlx::query(&query_str)
                .bind(id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            E::from_sqlite_row(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Counts the entities of type `E` that match all `filters`.
pub(crate) async fn count<E: Entity>(ex: &mut Executor, filters: &[Filter]) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT COUNT(*) AS count FROM {} {}",
                E::TABLE,
                where_clause::<E>(filters, pg_placeholder)
            );
            let query = bind_filters!(sqlx::query(&query_str), filters);
            let row = query.fetch_one(ex.conn()).await.map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT COUNT(*) AS count FROM {} {}",
                E::TABLE,
                where_clause::<E>(filters, sqlite_placeholder)
            );
            let query = bind_filters!(sqlx::query(&query_str), filters);
            let row = query.fetch_one(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    count_to_u64(count)
}

/// Lists one page of the entities of type `E` that match all `filters`.
pub(crate) async fn list<E: Entity>(
    ex: &mut Executor,
    filters: &[Filter],
    page: PageRequest,
) -> DbResult<Page<E>> {
    let total = count::<E>(ex, filters).await?;

    let mut items = Vec::with_capacity(page.limit() as usize);
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT * FROM {} {} ORDER BY {} LIMIT ${} OFFSET ${}",
                E::TABLE,
                where_clause::<E>(filters, pg_placeholder),
                E::ORDER_BY,
                filters.len() + 1,
                filters.len() + 2,
            );
            let query = bind_filters!(sqlx::query(&query_str), filters)
                .bind(i64::from(page.limit()))
                .bind(page.offset());
            let mut rows = query.fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                items.push(E::from_pg_row(row)?);
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT * FROM {} {} ORDER BY {} LIMIT ? OFFSET ?",
                E::TABLE,
                where_clause::<E>(filters, sqlite_placeholder),
                E::ORDER_BY,
            );
            let query = bind_filters!(sqlx::query(&query_str), filters)
                .bind(i64::from(page.limit()))
                .bind(page.offset());
            let mut rows = query.fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                items.push(E::from_sqlite_row(row)?);
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }

    Ok(Page::new(items, page, total))
}

/// Permanently removes the entity of type `E` with identifier `id`.
pub(crate) async fn delete<E: Entity>(ex: &mut Executor, id: i64) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
            sqlx::query(&query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
            sqlx::query(&query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(affected)
}

/// Flags the entity of type `E` with identifier `id` as deleted.
///
/// Deleting an already-deleted entity reports it as missing.
pub(crate) async fn soft_delete<E: Entity>(ex: &mut Executor, id: i64) -> DbResult<()> {
    debug_assert!(E::SOFT_DELETE, "{} does not support soft deletion", E::TABLE);
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                format!("UPDATE {} SET deleted = TRUE WHERE id = $1 AND deleted = FALSE", E::TABLE);
            sqlx::query(&query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                format!("UPDATE {} SET deleted = TRUE WHERE id = ? AND deleted = FALSE", E::TABLE);
            sqlx::query(&query_str)
                .bind(id)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(affected)
}
