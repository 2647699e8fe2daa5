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

//! Database operations on one-time passwords.

use crate::db::{count_to_u64, ensure_one_row};
use crate::model::{Otp, OtpCode, OtpId};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbResult, Executor};
use anta_core::model::PhoneNumber;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

/// Parses a PostgreSQL `row` into an `Otp`.
#[cfg(feature = "postgres")]
fn otp_from_pg_row(row: PgRow) -> DbResult<Otp> {
    let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
    let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
    let code: String = row.try_get("code").map_err(postgres::map_sqlx_error)?;
    let attempts: i64 = row.try_get("attempts").map_err(postgres::map_sqlx_error)?;
    let consumed: bool = row.try_get("consumed").map_err(postgres::map_sqlx_error)?;
    let created_at: OffsetDateTime = row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
    let expires_at: OffsetDateTime = row.try_get("expires_at").map_err(postgres::map_sqlx_error)?;

    Ok(Otp {
        id: OtpId::new(id),
        phone: PhoneNumber::new(phone)?,
        code: OtpCode::new(code)?,
        attempts,
        consumed,
        created_at,
        expires_at,
    })
}

/// Parses a SQLite `row` into an `Otp`.
#[cfg(any(feature = "sqlite", test))]
fn otp_from_sqlite_row(row: SqliteRow) -> DbResult<Otp> {
    let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
    let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
    let code: String = row.try_get("code").map_err(sqlite::map_sqlx_error)?;
    let attempts: i64 = row.try_get("attempts").map_err(sqlite::map_sqlx_error)?;
    let consumed: bool = row.try_get("consumed").map_err(sqlite::map_sqlx_error)?;
    let created_at = sqlite::get_timestamp(&row, "created_at")?;
    let expires_at = sqlite::get_timestamp(&row, "expires_at")?;

    Ok(Otp {
        id: OtpId::new(id),
        phone: PhoneNumber::new(phone)?,
        code: OtpCode::new(code)?,
        attempts,
        consumed,
        created_at,
        expires_at,
    })
}

/// Stores a fresh `code` for `phone` that is valid until `expires_at`.
pub(crate) async fn create_otp(
    ex: &mut Executor,
    phone: PhoneNumber,
    code: OtpCode,
    now: OffsetDateTime,
    expires_at: OffsetDateTime,
) -> DbResult<Otp> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO otps (phone, code, attempts, consumed, created_at, expires_at)
                VALUES ($1, $2, 0, FALSE, $3, $4)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .bind(code.as_str())
                .bind(now)
                .bind(expires_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (created_at_secs, created_at_nsecs) = sqlite::unpack_timestamp(now)?;
            let (expires_at_secs, expires_at_nsecs) = sqlite::unpack_timestamp(expires_at)?;
            let query_str = "
                INSERT INTO otps
                    (phone, code, attempts, consumed, created_at_secs, created_at_nsecs,
                    expires_at_secs, expires_at_nsecs)
                VALUES (?, ?, 0, FALSE, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .bind(code.as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .bind(expires_at_secs)
                .bind(expires_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Otp {
        id: OtpId::new(id),
        phone,
        code,
        attempts: 0,
        consumed: false,
        created_at: now,
        expires_at,
    })
}

/// Counts the codes issued to `phone` at or after `since`.
pub(crate) async fn count_otps_since(
    ex: &mut Executor,
    phone: &PhoneNumber,
    since: OffsetDateTime,
) -> DbResult<u64> {
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let row = sqlx::query(
                "SELECT COUNT(*) AS count FROM otps WHERE phone = $1 AND created_at >= $2",
            )
            .bind(phone.as_str())
            .bind(since)
            .fetch_one(ex.conn())
            .await
            .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (since_secs, since_nsecs) = sqlite::unpack_timestamp(since)?;
            let query_str = "
                SELECT COUNT(*) AS count FROM otps
                WHERE phone = ?
                    AND (created_at_secs > ? OR (created_at_secs = ? AND created_at_nsecs >= ?))
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .bind(since_secs)
                .bind(since_secs)
                .bind(since_nsecs)
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

/// Gets the most recently issued code for `phone` that has not been consumed yet.
pub(crate) async fn get_latest_unconsumed_otp(
    ex: &mut Executor,
    phone: &PhoneNumber,
) -> DbResult<Option<Otp>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT * FROM otps WHERE phone = $1 AND consumed = FALSE
                ORDER BY id DESC LIMIT 1
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .fetch_optional(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.map(otp_from_pg_row).transpose()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM otps WHERE phone = ? AND consumed = FALSE
                ORDER BY id DESC LIMIT 1
            ";
            let row = sqlx::query(query_str)
                .bind(phone.as_str())
                .fetch_optional(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.map(otp_from_sqlite_row).transpose()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Records one failed verification attempt against code `id`.
pub(crate) async fn increment_otp_attempts(ex: &mut Executor, id: OtpId) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE otps SET attempts = attempts + 1 WHERE id = $1")
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlx::query("UPDATE otps SET attempts = attempts + 1 WHERE id = ?")
            .bind(id.as_i64())
            .execute(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .rows_affected(),

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(affected)
}

/// Marks code `id` as used so that it cannot be verified again.
pub(crate) async fn consume_otp(ex: &mut Executor, id: OtpId) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE otps SET consumed = TRUE WHERE id = $1 AND consumed = FALSE")
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            sqlx::query("UPDATE otps SET consumed = TRUE WHERE id = ? AND consumed = FALSE")
                .bind(id.as_i64())
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
