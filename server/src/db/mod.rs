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

//! Database abstraction in terms of the operations needed by the service.
//!
//! Every entity module exposes free functions that take an `Executor` and issue one query per
//! backend.  Lookups and listings that look the same for all entities live in `crud`.

#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbError, DbResult, Executor};

mod admin;
pub(crate) use admin::*;
pub(crate) mod crud;
mod drivers;
pub(crate) use drivers::*;
mod otps;
pub(crate) use otps::*;
mod payments;
pub(crate) use payments::*;
mod promos;
pub(crate) use promos::*;
#[cfg(test)]
mod tests;
#[cfg(test)]
pub(crate) mod testutils;
mod trips;
pub(crate) use trips::*;
mod users;
pub(crate) use users::*;
mod vehicles;
pub(crate) use vehicles::*;
mod zones;
pub(crate) use zones::*;

/// Initializes the database schema.
pub(crate) async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Validates that a write statement touched exactly one row, with zero meaning that the target
/// row does not exist.
fn ensure_one_row(affected: u64) -> DbResult<()> {
    match affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Write affected {} rows instead of 1", n))),
    }
}

/// Converts a non-negative count returned by the database into a `u64`.
fn count_to_u64(count: i64) -> DbResult<u64> {
    u64::try_from(count)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid count {}: {}", count, e)))
}
