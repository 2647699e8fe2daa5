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

//! Test utilities for the database layer.

use crate::db::init_schema;
use crate::model::{FullName, Role, User, UserId};
use anta_core::db::{Db, Executor};
use anta_core::model::PhoneNumber;
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

/// Timestamp used for rows whose creation time does not matter.
pub(crate) const SOME_TIME: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

/// Opens a fresh in-memory SQLite database with the schema in place.
pub(crate) async fn setup_sqlite() -> Arc<dyn Db + Send + Sync> {
    let db = anta_core::db::sqlite::testutils::setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    Arc::new(db)
}

/// Connects to the PostgreSQL test database with the schema in place.
#[cfg(feature = "postgres")]
pub(crate) async fn setup_postgres() -> Arc<dyn Db + Send + Sync> {
    let db = anta_core::db::postgres::testutils::setup().await;
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    Arc::new(db)
}

/// Creates a user with `role` whose phone number is derived from `n`.
pub(crate) async fn put_user(ex: &mut Executor, n: u32, role: Role) -> User {
    crate::db::create_user(
        ex,
        PhoneNumber::new(format!("+6281200{:05}", n)).unwrap(),
        FullName::new(format!("User {}", n)).unwrap(),
        None,
        role,
        SOME_TIME,
    )
    .await
    .unwrap()
}

/// Returns an identifier that no user will ever have.
pub(crate) fn unknown_user_id() -> UserId {
    UserId::new(987654321)
}
