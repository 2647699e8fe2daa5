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

//! Database operations backing the admin surface: audit logs and platform stats.

use crate::db::crud::Entity;
use crate::model::{AdminLog, AdminLogId, DriverStatus, PaymentStatus, Stats, TripStatus, UserId};
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

impl Entity for AdminLog {
    const TABLE: &'static str = "admin_logs";
    const ORDER_BY: &'static str = "id DESC";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let admin_id: i64 = row.try_get("admin_id").map_err(postgres::map_sqlx_error)?;
        let action: String = row.try_get("action").map_err(postgres::map_sqlx_error)?;
        let entity: String = row.try_get("entity").map_err(postgres::map_sqlx_error)?;
        let entity_id: Option<i64> = row.try_get("entity_id").map_err(postgres::map_sqlx_error)?;
        let details: Option<String> = row.try_get("details").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(AdminLog {
            id: AdminLogId::new(id),
            admin_id: UserId::new(admin_id),
            action,
            entity,
            entity_id,
            details,
            created_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let admin_id: i64 = row.try_get("admin_id").map_err(sqlite::map_sqlx_error)?;
        let action: String = row.try_get("action").map_err(sqlite::map_sqlx_error)?;
        let entity: String = row.try_get("entity").map_err(sqlite::map_sqlx_error)?;
        let entity_id: Option<i64> = row.try_get("entity_id").map_err(sqlite::map_sqlx_error)?;
        let details: Option<String> = row.try_get("details").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;

        Ok(AdminLog {
            id: AdminLogId::new(id),
            admin_id: UserId::new(admin_id),
            action,
            entity,
            entity_id,
            details,
            created_at,
        })
    }
}

/// Appends an audit record for `action` taken by `admin_id` on `entity`.
pub(crate) async fn create_admin_log(
    ex: &mut Executor,
    admin_id: UserId,
    action: &str,
    entity: &str,
    entity_id: Option<i64>,
    details: Option<String>,
    now: OffsetDateTime,
) -> DbResult<AdminLog> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO admin_logs (admin_id, action, entity, entity_id, details, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(admin_id.as_i64())
                .bind(action)
                .bind(entity)
                .bind(entity_id)
                .bind(details.as_deref())
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
                INSERT INTO admin_logs
                    (admin_id, action, entity, entity_id, details,
                    created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(admin_id.as_i64())
                .bind(action)
                .bind(entity)
                .bind(entity_id)
                .bind(details.as_deref())
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

    Ok(AdminLog {
        id: AdminLogId::new(id),
        admin_id,
        action: action.to_owned(),
        entity: entity.to_owned(),
        entity_id,
        details,
        created_at: now,
    })
}

/// Computes the platform-wide counters in one round trip.
pub(crate) async fn get_stats(ex: &mut Executor) -> DbResult<Stats> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT
                    (SELECT COUNT(*) FROM users) AS users,
                    (SELECT COUNT(*) FROM drivers WHERE deleted = FALSE) AS drivers,
                    (SELECT COUNT(*) FROM drivers
                        WHERE deleted = FALSE AND status = $1) AS online_drivers,
                    (SELECT COUNT(*) FROM trips WHERE deleted = FALSE) AS trips,
                    (SELECT COUNT(*) FROM trips
                        WHERE deleted = FALSE AND status = $2) AS completed_trips,
                    (SELECT COUNT(*) FROM trips
                        WHERE deleted = FALSE AND status = $3) AS cancelled_trips,
                    (SELECT CAST(COALESCE(SUM(amount_cents), 0) AS BIGINT) FROM payments
                        WHERE status = $4) AS revenue_cents
            ";
            let row = sqlx::query(query_str)
                .bind(DriverStatus::Online.as_str())
                .bind(TripStatus::Completed.as_str())
                .bind(TripStatus::Cancelled.as_str())
                .bind(PaymentStatus::Completed.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Ok(Stats {
                users: row.try_get("users").map_err(postgres::map_sqlx_error)?,
                drivers: row.try_get("drivers").map_err(postgres::map_sqlx_error)?,
                online_drivers: row.try_get("online_drivers").map_err(postgres::map_sqlx_error)?,
                trips: row.try_get("trips").map_err(postgres::map_sqlx_error)?,
                completed_trips: row
                    .try_get("completed_trips")
                    .map_err(postgres::map_sqlx_error)?,
                cancelled_trips: row
                    .try_get("cancelled_trips")
                    .map_err(postgres::map_sqlx_error)?,
                revenue_cents: row.try_get("revenue_cents").map_err(postgres::map_sqlx_error)?,
            })
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT
                    (SELECT COUNT(*) FROM users) AS users,
                    (SELECT COUNT(*) FROM drivers WHERE deleted = FALSE) AS drivers,
                    (SELECT COUNT(*) FROM drivers
                        WHERE deleted = FALSE AND status = ?) AS online_drivers,
                    (SELECT COUNT(*) FROM trips WHERE deleted = FALSE) AS trips,
                    (SELECT COUNT(*) FROM trips
                        WHERE deleted = FALSE AND status = ?) AS completed_trips,
                    (SELECT COUNT(*) FROM trips
                        WHERE deleted = FALSE AND status = ?) AS cancelled_trips,
                    (SELECT COALESCE(SUM(amount_cents), 0) FROM payments
                        WHERE status = ?) AS revenue_cents
            ";
            let row = sqlx::query(query_str)
                .bind(DriverStatus::Online.as_str())
                .bind(TripStatus::Completed.as_str())
                .bind(TripStatus::Cancelled.as_str())
                .bind(PaymentStatus::Completed.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(Stats {
                users: row.try_get("users").map_err(sqlite::map_sqlx_error)?,
                drivers: row.try_get("drivers").map_err(sqlite::map_sqlx_error)?,
                online_drivers: row.try_get("online_drivers").map_err(sqlite::map_sqlx_error)?,
                trips: row.try_get("trips").map_err(sqlite::map_sqlx_error)?,
                completed_trips: row.try_get("completed_trips").map_err(sqlite::map_sqlx_error)?,
                cancelled_trips: row.try_get("cancelled_trips").map_err(sqlite::map_sqlx_error)?,
                revenue_cents: row.try_get("revenue_cents").map_err(sqlite::map_sqlx_error)?,
            })
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}
