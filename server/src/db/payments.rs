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

//! Database operations on payments and wallets.

use crate::db::crud::Entity;
use crate::db::ensure_one_row;
use crate::model::{
    OwnerKind, Payment, PaymentId, PaymentMethod, PaymentStatus, TripId, Wallet, WalletId,
};
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

impl Entity for Payment {
    const TABLE: &'static str = "payments";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let trip_id: i64 = row.try_get("trip_id").map_err(postgres::map_sqlx_error)?;
        let amount_cents: i64 = row.try_get("amount_cents").map_err(postgres::map_sqlx_error)?;
        let method: String = row.try_get("method").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(Payment {
            id: PaymentId::new(id),
            trip_id: TripId::new(trip_id),
            amount_cents,
            method: PaymentMethod::parse(method)?,
            status: PaymentStatus::parse(status)?,
            created_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let trip_id: i64 = row.try_get("trip_id").map_err(sqlite::map_sqlx_error)?;
        let amount_cents: i64 = row.try_get("amount_cents").map_err(sqlite::map_sqlx_error)?;
        let method: String = row.try_get("method").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;

        Ok(Payment {
            id: PaymentId::new(id),
            trip_id: TripId::new(trip_id),
            amount_cents,
            method: PaymentMethod::parse(method)?,
            status: PaymentStatus::parse(status)?,
            created_at,
        })
    }
}

impl Entity for Wallet {
    const TABLE: &'static str = "wallets";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let owner_kind: String = row.try_get("owner_kind").map_err(postgres::map_sqlx_error)?;
        let owner_id: i64 = row.try_get("owner_id").map_err(postgres::map_sqlx_error)?;
        let balance_cents: i64 = row.try_get("balance_cents").map_err(postgres::map_sqlx_error)?;

        Ok(Wallet {
            id: WalletId::new(id),
            owner_kind: OwnerKind::parse(owner_kind)?,
            owner_id,
            balance_cents,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let owner_kind: String = row.try_get("owner_kind").map_err(sqlite::map_sqlx_error)?;
        let owner_id: i64 = row.try_get("owner_id").map_err(sqlite::map_sqlx_error)?;
        let balance_cents: i64 = row.try_get("balance_cents").map_err(sqlite::map_sqlx_error)?;

        Ok(Wallet {
            id: WalletId::new(id),
            owner_kind: OwnerKind::parse(owner_kind)?,
            owner_id,
            balance_cents,
        })
    }
}

/// Records a payment of `amount_cents` for trip `trip_id`.
pub(crate) async fn create_payment(
    ex: &mut Executor,
    trip_id: TripId,
    amount_cents: i64,
    method: PaymentMethod,
    status: PaymentStatus,
    now: OffsetDateTime,
) -> DbResult<Payment> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO payments (trip_id, amount_cents, method, status, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip_id.as_i64())
                .bind(amount_cents)
                .bind(method.as_str())
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
                INSERT INTO payments
                    (trip_id, amount_cents, method, status, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip_id.as_i64())
                .bind(amount_cents)
                .bind(method.as_str())
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

    Ok(Payment { id: PaymentId::new(id), trip_id, amount_cents, method, status, created_at: now })
}

/// Checks whether trip `trip_id` has already been settled.
pub(crate) async fn has_completed_payment(ex: &mut Executor, trip_id: TripId) -> DbResult<bool> {
    let completed = PaymentStatus::Completed;
    let count: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let row = sqlx::query(
                "SELECT COUNT(*) AS count FROM payments WHERE trip_id = $1 AND status = $2",
            )
            .bind(trip_id.as_i64())
            .bind(completed.as_str())
            .fetch_one(ex.conn())
            .await
            .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let row = sqlx::query(
                "SELECT COUNT(*) AS count FROM payments WHERE trip_id = ? AND status = ?",
            )
            .bind(trip_id.as_i64())
            .bind(completed.as_str())
            .fetch_one(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(count > 0)
}

/// Gets the wallet of the owner identified by `owner_kind` and `owner_id`.
pub(crate) async fn get_wallet(
    ex: &mut Executor,
    owner_kind: OwnerKind,
    owner_id: i64,
) -> DbResult<Wallet> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let row = sqlx::query("SELECT * FROM wallets WHERE owner_kind = $1 AND owner_id = $2")
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Wallet::from_pg_row(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let row = sqlx::query("SELECT * FROM wallets WHERE owner_kind = ? AND owner_id = ?")
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Wallet::from_sqlite_row(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Creates an empty wallet for the owner identified by `owner_kind` and `owner_id`.
pub(crate) async fn create_wallet(
    ex: &mut Executor,
    owner_kind: OwnerKind,
    owner_id: i64,
) -> DbResult<Wallet> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO wallets (owner_kind, owner_id, balance_cents) VALUES ($1, $2, 0)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO wallets (owner_kind, owner_id, balance_cents) VALUES (?, ?, 0)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Wallet { id: WalletId::new(id), owner_kind, owner_id, balance_cents: 0 })
}

/// Adds `amount_cents` to the wallet of the given owner, creating the wallet if it is missing.
pub(crate) async fn top_up(
    ex: &mut Executor,
    owner_kind: OwnerKind,
    owner_id: i64,
    amount_cents: i64,
) -> DbResult<Wallet> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO wallets (owner_kind, owner_id, balance_cents) VALUES ($1, $2, $3)
                ON CONFLICT (owner_kind, owner_id)
                    DO UPDATE SET balance_cents = wallets.balance_cents + excluded.balance_cents
                RETURNING *
            ";
            let row = sqlx::query(query_str)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .bind(amount_cents)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Wallet::from_pg_row(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO wallets (owner_kind, owner_id, balance_cents) VALUES (?, ?, ?)
                ON CONFLICT (owner_kind, owner_id)
                    DO UPDATE SET balance_cents = wallets.balance_cents + excluded.balance_cents
                RETURNING *
            ";
            let row = sqlx::query(query_str)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .bind(amount_cents)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Wallet::from_sqlite_row(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Subtracts `amount_cents` from the wallet of the given owner only if the balance covers it.
///
/// Returns false, without touching the wallet, if the balance is insufficient or if the wallet
/// does not exist.
pub(crate) async fn debit_if_sufficient(
    ex: &mut Executor,
    owner_kind: OwnerKind,
    owner_id: i64,
    amount_cents: i64,
) -> DbResult<bool> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE wallets SET balance_cents = balance_cents - $1
                WHERE owner_kind = $2 AND owner_id = $3 AND balance_cents >= $1
            ";
            sqlx::query(query_str)
                .bind(amount_cents)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE wallets SET balance_cents = balance_cents - ?
                WHERE owner_kind = ? AND owner_id = ? AND balance_cents >= ?
            ";
            sqlx::query(query_str)
                .bind(amount_cents)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .bind(amount_cents)
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

/// Adds `amount_cents` to the existing wallet of the given owner.
pub(crate) async fn credit(
    ex: &mut Executor,
    owner_kind: OwnerKind,
    owner_id: i64,
    amount_cents: i64,
) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE wallets SET balance_cents = balance_cents + $1
                WHERE owner_kind = $2 AND owner_id = $3
            ";
            sqlx::query(query_str)
                .bind(amount_cents)
                .bind(owner_kind.as_str())
                .bind(owner_id)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE wallets SET balance_cents = balance_cents + ?
                WHERE owner_kind = ? AND owner_id = ?
            ";
            sqlx::query(query_str)
                .bind(amount_cents)
                .bind(owner_kind.as_str())
                .bind(owner_id)
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
