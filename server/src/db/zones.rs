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

//! Database operations on pricing zones.

use crate::db::crud::Entity;
use crate::model::{Zone, ZoneId, ZoneRates};
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

impl Entity for Zone {
    const TABLE: &'static str = "zones";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let base_fare_cents: i64 =
            row.try_get("base_fare_cents").map_err(postgres::map_sqlx_error)?;
        let per_km_cents: i64 = row.try_get("per_km_cents").map_err(postgres::map_sqlx_error)?;
        let per_minute_cents: i64 =
            row.try_get("per_minute_cents").map_err(postgres::map_sqlx_error)?;
        let surge_multiplier: f64 =
            row.try_get("surge_multiplier").map_err(postgres::map_sqlx_error)?;

        let rates = ZoneRates { base_fare_cents, per_km_cents, per_minute_cents, surge_multiplier };
        Ok(Zone { id: ZoneId::new(id), name, rates: rates.validate()? })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let base_fare_cents: i64 =
            row.try_get("base_fare_cents").map_err(sqlite::map_sqlx_error)?;
        let per_km_cents: i64 = row.try_get("per_km_cents").map_err(sqlite::map_sqlx_error)?;
        let per_minute_cents: i64 =
            row.try_get("per_minute_cents").map_err(sqlite::map_sqlx_error)?;
        let surge_multiplier: f64 =
            row.try_get("surge_multiplier").map_err(sqlite::map_sqlx_error)?;

        let rates = ZoneRates { base_fare_cents, per_km_cents, per_minute_cents, surge_multiplier };
        Ok(Zone { id: ZoneId::new(id), name, rates: rates.validate()? })
    }
}

/// Creates a new zone called `name` that prices trips with `rates`.
pub(crate) async fn create_zone(
    ex: &mut Executor,
    name: String,
    rates: ZoneRates,
) -> DbResult<Zone> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO zones
                    (name, base_fare_cents, per_km_cents, per_minute_cents, surge_multiplier)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(rates.base_fare_cents)
                .bind(rates.per_km_cents)
                .bind(rates.per_minute_cents)
                .bind(rates.surge_multiplier)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO zones
                    (name, base_fare_cents, per_km_cents, per_minute_cents, surge_multiplier)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(rates.base_fare_cents)
                .bind(rates.per_km_cents)
                .bind(rates.per_minute_cents)
                .bind(rates.surge_multiplier)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Zone { id: ZoneId::new(id), name, rates })
}
