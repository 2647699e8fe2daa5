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

//! Database operations on users.

use crate::db::crud::Entity;
use crate::db::{count_to_u64, ensure_one_row};
use crate::model::{FullName, Role, User, UserId, UserStatus};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbResult, Executor};
use anta_core::model::{EmailAddress, PhoneNumber};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

impl Entity for User {
    const TABLE: &'static str = "users";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(postgres::map_sqlx_error)?;
        let email: Option<String> = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let phone_verified: bool =
            row.try_get("phone_verified").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(User {
            id: UserId::new(id),
            phone: PhoneNumber::new(phone)?,
            full_name: FullName::new(full_name)?,
            email: email.map(EmailAddress::new).transpose()?,
            role: Role::parse(role)?,
            status: UserStatus::parse(status)?,
            phone_verified,
            created_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let full_name: String = row.try_get("full_name").map_err(sqlite::map_sqlx_error)?;
        let email: Option<String> = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let role: String = row.try_get("role").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let phone_verified: bool =
            row.try_get("phone_verified").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;

        Ok(User {
            id: UserId::new(id),
            phone: PhoneNumber::new(phone)?,
            full_name: FullName::new(full_name)?,
            email: email.map(EmailAddress::new).transpose()?,
            role: Role::parse(role)?,
            status: UserStatus::parse(status)?,
            phone_verified,
            created_at,
        })
    }
}

/// Creates a new active and unverified user.
pub(crate) async fn create_user(
    ex: &mut Executor,
    phone: PhoneNumber,
    full_name: FullName,
    email: Option<EmailAddress>,
    role: Role,
    now: OffsetDateTime,
) -> DbResult<User> {
    let status = UserStatus::Active;
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO users
                    (phone, full_name, email, role, status, phone_verified, created_at)
                VALUES ($1, $2, $3, $4, $5, FALSE, $6)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .bind(full_name.as_str())
                .bind(email.as_ref().map(EmailAddress::as_str))
                .bind(role.as_str())
                .bind(status.as_str())
                .bind(now)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = sqlite::unpack_timestamp(now)?;
            let query_str = "
                INSERT INTO users
                    (phone, full_name, email, role, status, phone_verified,
                    created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, FALSE, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .bind(full_name.as_str())
                .bind(email.as_ref().map(EmailAddress::as_str))
                .bind(role.as_str())
                .bind(status.as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(User {
        id: UserId::new(id),
        phone,
        full_name,
        email,
        role,
        status,
        phone_verified: false,
        created_at: now,
    })
}

/// Persists the mutable profile fields of `user`.
pub(crate) async fn update_user(ex: &mut Executor, user: &User) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE users SET full_name = $1, email = $2, role = $3, status = $4
                WHERE id = $5
            ";
            sqlx::query(query_str)
                .bind(user.full_name.as_str())
                .bind(user.email.as_ref().map(EmailAddress::as_str))
                .bind(user.role.as_str())
                .bind(user.status.as_str())
                .bind(user.id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE users SET full_name = ?, email = ?, role = ?, status = ?
                WHERE id = ?
            ";
            sqlx::query(query_str)
                .bind(user.full_name.as_str())
                .bind(user.email.as_ref().map(EmailAddress::as_str))
                .bind(user.role.as_str())
                .bind(user.status.as_str())
                .bind(user.id.as_i64())
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

/// Marks the user that owns `phone` as verified.  Returns false if no user owns it.
pub(crate) async fn set_phone_verified(ex: &mut Executor, phone: &PhoneNumber) -> DbResult<bool> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE users SET phone_verified = TRUE WHERE phone = $1")
                .bind(phone.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            sqlx::query("UPDATE users SET phone_verified = TRUE WHERE phone = ?")
                .bind(phone.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(affected > 0)
}

/// Counts the rows in other tables that reference the user `id` and prevent its deletion.
pub(crate) async fn count_user_references(ex: &mut Executor, id: UserId) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT
                    (SELECT COUNT(*) FROM drivers WHERE user_id = $1)
                    + (SELECT COUNT(*) FROM trips WHERE rider_id = $1)
                    + (SELECT COUNT(*) FROM ratings WHERE rater_id = $1)
                    + (SELECT COUNT(*) FROM admin_logs WHERE admin_id = $1) AS count
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT
                    (SELECT COUNT(*) FROM drivers WHERE user_id = ?)
                    + (SELECT COUNT(*) FROM trips WHERE rider_id = ?)
                    + (SELECT COUNT(*) FROM ratings WHERE rater_id = ?)
                    + (SELECT COUNT(*) FROM admin_logs WHERE admin_id = ?) AS count
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .bind(id.as_i64())
                .bind(id.as_i64())
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    count_to_u64(count)
}
