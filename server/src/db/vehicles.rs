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

//! Database operations on vehicles.

use crate::db::crud::Entity;
use crate::model::{DriverId, Plate, Vehicle, VehicleCategory, VehicleId, VehicleSpec};
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

impl Entity for Vehicle {
    const TABLE: &'static str = "vehicles";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let plate: String = row.try_get("plate").map_err(postgres::map_sqlx_error)?;
        let make: String = row.try_get("make").map_err(postgres::map_sqlx_error)?;
        let model: String = row.try_get("model").map_err(postgres::map_sqlx_error)?;
        let color: String = row.try_get("color").map_err(postgres::map_sqlx_error)?;
        let year: i32 = row.try_get("year").map_err(postgres::map_sqlx_error)?;
        let category: String = row.try_get("category").map_err(postgres::map_sqlx_error)?;

        Ok(Vehicle {
            id: VehicleId::new(id),
            driver_id: DriverId::new(driver_id),
            plate: Plate::new(plate)?,
            spec: VehicleSpec {
                make,
                model,
                color,
                year,
                category: VehicleCategory::parse(category)?,
            },
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let plate: String = row.try_get("plate").map_err(sqlite::map_sqlx_error)?;
        let make: String = row.try_get("make").map_err(sqlite::map_sqlx_error)?;
        let model: String = row.try_get("model").map_err(sqlite::map_sqlx_error)?;
        let color: String = row.try_get("color").map_err(sqlite::map_sqlx_error)?;
        let year: i32 = row.try_get("year").map_err(sqlite::map_sqlx_error)?;
        let category: String = row.try_get("category").map_err(sqlite::map_sqlx_error)?;

        Ok(Vehicle {
            id: VehicleId::new(id),
            driver_id: DriverId::new(driver_id),
            plate: Plate::new(plate)?,
            spec: VehicleSpec {
                make,
                model,
                color,
                year,
                category: VehicleCategory::parse(category)?,
            },
        })
    }
}

/// Registers a vehicle with `plate` and `spec` for driver `driver_id`.
pub(crate) async fn create_vehicle(
    ex: &mut Executor,
    driver_id: DriverId,
    plate: Plate,
    spec: VehicleSpec,
) -> DbResult<Vehicle> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO vehicles (driver_id, make, model, plate, color, year, category)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(driver_id.as_i64())
                .bind(spec.make.as_str())
                .bind(spec.model.as_str())
                .bind(plate.as_str())
                .bind(spec.color.as_str())
                .bind(spec.year)
                .bind(spec.category.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO vehicles (driver_id, make, model, plate, color, year, category)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(driver_id.as_i64())
                .bind(spec.make.as_str())
                .bind(spec.model.as_str())
                .bind(plate.as_str())
                .bind(spec.color.as_str())
                .bind(spec.year)
                .bind(spec.category.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Vehicle { id: VehicleId::new(id), driver_id, plate, spec })
}
