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

//! Database operations on promo codes.

use crate::db::crud::Entity;
use crate::db::ensure_one_row;
use crate::model::{PromoCode, PromoCodeName, PromoId, PromoKind};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbResult, Executor};
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

impl Entity for PromoCode {
    const TABLE: &'static str = "promo_codes";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let code: String = row.try_get("code").map_err(postgres::map_sqlx_error)?;
        let kind: String = row.try_get("kind").map_err(postgres::map_sqlx_error)?;
        let value: i64 = row.try_get("value").map_err(postgres::map_sqlx_error)?;
        let max_uses: Option<i64> = row.try_get("max_uses").map_err(postgres::map_sqlx_error)?;
        let uses: i64 = row.try_get("uses").map_err(postgres::map_sqlx_error)?;
        let active: bool = row.try_get("active").map_err(postgres::map_sqlx_error)?;
        let expires_at: Option<OffsetDateTime> =
            row.try_get("expires_at").map_err(postgres::map_sqlx_error)?;

        Ok(PromoCode {
            id: PromoId::new(id),
            code: PromoCodeName::new(code)?,
            kind: PromoKind::parse(kind)?,
            value,
            max_uses,
            uses,
            active,
            expires_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let code: String = row.try_get("code").map_err(sqlite::map_sqlx_error)?;
        let kind: String = row.try_get("kind").map_err(sqlite::map_sqlx_error)?;
        let value: i64 = row.try_get("value").map_err(sqlite::map_sqlx_error)?;
        let max_uses: Option<i64> = row.try_get("max_uses").map_err(sqlite::map_sqlx_error)?;
        let uses: i64 = row.try_get("uses").map_err(sqlite::map_sqlx_error)?;
        let active: bool = row.try_get("active").map_err(sqlite::map_sqlx_error)?;
        let expires_at = sqlite::get_opt_timestamp(&row, "expires_at")?;

        Ok(PromoCode {
            id: PromoId::new(id),
            code: PromoCodeName::new(code)?,
            kind: PromoKind::parse(kind)?,
            value,
            max_uses,
            uses,
            active,
            expires_at,
        })
    }
}

/// Creates a new active promo code that has never been used.
pub(crate) async fn create_promo(
    ex: &mut Executor,
    code: PromoCodeName,
    kind: PromoKind,
    value: i64,
    max_uses: Option<i64>,
    expires_at: Option<OffsetDateTime>,
) -> DbResult<PromoCode> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO promo_codes (code, kind, value, max_uses, uses, active, expires_at)
                VALUES ($1, $2, $3, $4, 0, TRUE, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(code.as_str())
                .bind(kind.as_str())
                .bind(value)
                .bind(max_uses)
                .bind(expires_at)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (expires_at_secs, expires_at_nsecs) = match expires_at {
                Some(expires_at) => {
                    let (secs, nsecs) = sqlite::unpack_timestamp(expires_at)?;
                    (Some(secs), Some(nsecs))
                }
                None => (None, None),
            };
            let query_str = "
                INSERT INTO promo_codes
                    (code, kind, value, max_uses, uses, active, expires_at_secs, expires_at_nsecs)
                VALUES (?, ?, ?, ?, 0, TRUE, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(code.as_str())
                .bind(kind.as_str())
                .bind(value)
                .bind(max_uses)
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

    Ok(PromoCode {
        id: PromoId::new(id),
        code,
        kind,
        value,
        max_uses,
        uses: 0,
        active: true,
        expires_at,
    })
}

/// Gets the promo code named `code`.
pub(crate) async fn get_promo_by_code(
    ex: &mut Executor,
    code: &PromoCodeName,
) -> DbResult<PromoCode> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let row = sqlx::query("SELECT * FROM promo_codes WHERE code = $1")
                .bind(code.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            PromoCode::from_pg_row(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let row = sqlx::query("SELECT * FROM promo_codes WHERE code = ?")
                .bind(code.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            PromoCode::from_sqlite_row(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Prevents any further redemption of `code`.
pub(crate) async fn deactivate_promo(ex: &mut Executor, code: &PromoCodeName) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE promo_codes SET active = FALSE WHERE code = $1")
                .bind(code.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlx::query("UPDATE promo_codes SET active = FALSE WHERE code = ?")
            .bind(code.as_str())
            .execute(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .rows_affected(),

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_row(affected)
}

/// Counts one use of `code` if it is still redeemable at `now`.
///
/// The checks and the increment happen in a single statement so that concurrent redemptions can
/// never push `uses` past `max_uses`.  Returns false if the code could not be redeemed.
pub(crate) async fn redeem_promo(
    ex: &mut Executor,
    code: &PromoCodeName,
    now: OffsetDateTime,
) -> DbResult<bool> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE promo_codes SET uses = uses + 1
                WHERE code = $1 AND active = TRUE
                    AND (expires_at IS NULL OR expires_at > $2)
                    AND (max_uses IS NULL OR uses < max_uses)
            ";
            sqlx::query(query_str)
                .bind(code.as_str())
                .bind(now)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = sqlite::unpack_timestamp(now)?;
            let query_str = "
                UPDATE promo_codes SET uses = uses + 1
                WHERE code = ? AND active = TRUE
                    AND (expires_at_secs IS NULL
                        OR expires_at_secs > ?
                        OR (expires_at_secs = ? AND expires_at_nsecs > ?))
                    AND (max_uses IS NULL OR uses < max_uses)
            ";
            sqlx::query(query_str)
                .bind(code.as_str())
                .bind(now_secs)
                .bind(now_secs)
                .bind(now_nsecs)
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
