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

//! Database abstraction over PostgreSQL and SQLite.
//!
//! PostgreSQL serves production traffic.  SQLite exists so that unit tests can run against a real
//! relational engine without any external setup.  Services write their queries once per backend
//! and dispatch on the `Executor` variant.

use crate::model::ModelError;
use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Database errors.  Errors we know how to classify get their own variant and anything else is
/// reported as a `BackendError`.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// A uniqueness constraint rejected the write.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Data stored in the database could not be converted into domain types.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The requested row, or a row referenced by the write, does not exist.
    #[error("Entity not found")]
    NotFound,

    /// The database cannot take more work right now (pool exhausted or too many connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// Users destructure this type and issue backend-specific queries in each arm.  The executor may
/// be backed by a plain pool connection or by an open transaction.
pub enum Executor {
    /// A PostgreSQL executor.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An executor backed by an open transaction.
///
/// Dropping the transaction without calling `commit` rolls it back.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(e) => e.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over a database connection pool.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the pool and waits for in-flight connections to be returned.
    async fn close(&self);
}

/// Macros to help instantiate tests for multiple database systems.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Instantiates the `module::name` test for the database returned by `setup`.
    ///
    /// The `extra` metadata parameter can be used to tag the generated test.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            #[tokio::test]
            $(#[$extra])?
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Instantiates a collection of tests for a specific database system.
    ///
    /// `setup` must evaluate to the database object that the tests expect, already initialized
    /// with the desired schema.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]);
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                $crate::db::testutils::generate_one_test!($name, $setup, $module);
            )+
        };
    ];

    pub use generate_tests;
}
