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

//! Database operations on drivers, their locations and their KYC documents.

use crate::db::crud::Entity;
use crate::db::ensure_one_row;
use crate::model::{
    DocumentId, DocumentKind, Driver, DriverId, DriverLocation, DriverStatus, KycDocument,
    KycStatus, LicenseNumber, LocationId, NearbyDriver, UserId,
};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbError, DbResult, Executor};
use anta_geo::Coordinates;
#[cfg(any(feature = "sqlite", test))]
use anta_geo::EARTH_RADIUS_METERS;
use futures::TryStreamExt;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

/// Checks that a last-known position read from the database is either complete or absent.
fn check_position(latitude: Option<f64>, longitude: Option<f64>) -> DbResult<()> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
            .map(|_| ())
            .map_err(|e| DbError::DataIntegrityError(e.to_string())),
        (None, None) => Ok(()),
        _ => Err(DbError::DataIntegrityError("Half-populated driver position".to_owned())),
    }
}

impl Entity for Driver {
    const TABLE: &'static str = "drivers";
    const SOFT_DELETE: bool = true;

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(postgres::map_sqlx_error)?;
        let license_number: String =
            row.try_get("license_number").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let kyc_status: String = row.try_get("kyc_status").map_err(postgres::map_sqlx_error)?;
        let rating: Option<f64> = row.try_get("rating").map_err(postgres::map_sqlx_error)?;
        let rating_count: i64 = row.try_get("rating_count").map_err(postgres::map_sqlx_error)?;
        let latitude: Option<f64> = row.try_get("latitude").map_err(postgres::map_sqlx_error)?;
        let longitude: Option<f64> = row.try_get("longitude").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        check_position(latitude, longitude)?;
        Ok(Driver {
            id: DriverId::new(id),
            user_id: UserId::new(user_id),
            license_number: LicenseNumber::new(license_number)?,
            status: DriverStatus::parse(status)?,
            kyc_status: KycStatus::parse(kyc_status)?,
            rating,
            rating_count,
            latitude,
            longitude,
            created_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(sqlite::map_sqlx_error)?;
        let license_number: String =
            row.try_get("license_number").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let kyc_status: String = row.try_get("kyc_status").map_err(sqlite::map_sqlx_error)?;
        let rating: Option<f64> = row.try_get("rating").map_err(sqlite::map_sqlx_error)?;
        let rating_count: i64 = row.try_get("rating_count").map_err(sqlite::map_sqlx_error)?;
        let latitude: Option<f64> = row.try_get("latitude").map_err(sqlite::map_sqlx_error)?;
        let longitude: Option<f64> = row.try_get("longitude").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;

        check_position(latitude, longitude)?;
        Ok(Driver {
            id: DriverId::new(id),
            user_id: UserId::new(user_id),
            license_number: LicenseNumber::new(license_number)?,
            status: DriverStatus::parse(status)?,
            kyc_status: KycStatus::parse(kyc_status)?,
            rating,
            rating_count,
            latitude,
            longitude,
            created_at,
        })
    }
}

impl Entity for DriverLocation {
    const TABLE: &'static str = "driver_locations";
    const ORDER_BY: &'static str = "id DESC";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(postgres::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(postgres::map_sqlx_error)?;
        let heading: Option<f64> = row.try_get("heading").map_err(postgres::map_sqlx_error)?;
        let speed_kmh: Option<f64> = row.try_get("speed_kmh").map_err(postgres::map_sqlx_error)?;
        let recorded_at: OffsetDateTime =
            row.try_get("recorded_at").map_err(postgres::map_sqlx_error)?;

        Ok(DriverLocation {
            id: LocationId::new(id),
            driver_id: DriverId::new(driver_id),
            latitude,
            longitude,
            heading,
            speed_kmh,
            recorded_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let latitude: f64 = row.try_get("latitude").map_err(sqlite::map_sqlx_error)?;
        let longitude: f64 = row.try_get("longitude").map_err(sqlite::map_sqlx_error)?;
        let heading: Option<f64> = row.try_get("heading").map_err(sqlite::map_sqlx_error)?;
        let speed_kmh: Option<f64> = row.try_get("speed_kmh").map_err(sqlite::map_sqlx_error)?;
        let recorded_at = sqlite::get_timestamp(&row, "recorded_at")?;

        Ok(DriverLocation {
            id: LocationId::new(id),
            driver_id: DriverId::new(driver_id),
            latitude,
            longitude,
            heading,
            speed_kmh,
            recorded_at,
        })
    }
}

impl Entity for KycDocument {
    const TABLE: &'static str = "kyc_documents";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let kind: String = row.try_get("kind").map_err(postgres::map_sqlx_error)?;
        let url: String = row.try_get("url").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;

        Ok(KycDocument {
            id: DocumentId::new(id),
            driver_id: DriverId::new(driver_id),
            kind: DocumentKind::parse(kind)?,
            url,
            created_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let kind: String = row.try_get("kind").map_err(sqlite::map_sqlx_error)?;
        let url: String = row.try_get("url").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;

        Ok(KycDocument {
            id: DocumentId::new(id),
            driver_id: DriverId::new(driver_id),
            kind: DocumentKind::parse(kind)?,
            url,
            created_at,
        })
    }
}

/// Creates a new driver profile for `user_id`.  Drivers start offline and without KYC.
pub(crate) async fn create_driver(
    ex: &mut Executor,
    user_id: UserId,
    license_number: LicenseNumber,
    now: OffsetDateTime,
) -> DbResult<Driver> {
    let status = DriverStatus::Offline;
    let kyc_status = KycStatus::Unsubmitted;
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO drivers (user_id, license_number, status, kyc_status, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i64())
                .bind(license_number.as_str())
                .bind(status.as_str())
                .bind(kyc_status.as_str())
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
                INSERT INTO drivers
                    (user_id, license_number, status, kyc_status, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(user_id.as_i64())
                .bind(license_number.as_str())
                .bind(status.as_str())
                .bind(kyc_status.as_str())
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

    Ok(Driver {
        id: DriverId::new(id),
        user_id,
        license_number,
        status,
        kyc_status,
        rating: None,
        rating_count: 0,
        latitude: None,
        longitude: None,
        created_at: now,
    })
}

/// Sets the availability `status` of the non-deleted driver `id`.
pub(crate) async fn set_driver_status(
    ex: &mut Executor,
    id: DriverId,
    status: DriverStatus,
) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE drivers SET status = $1 WHERE id = $2 AND deleted = FALSE")
                .bind(status.as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            sqlx::query("UPDATE drivers SET status = ? WHERE id = ? AND deleted = FALSE")
                .bind(status.as_str())
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

/// Sets the KYC review state of the non-deleted driver `id`.
pub(crate) async fn set_kyc_status(
    ex: &mut Executor,
    id: DriverId,
    kyc_status: KycStatus,
) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE drivers SET kyc_status = $1 WHERE id = $2 AND deleted = FALSE")
                .bind(kyc_status.as_str())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            sqlx::query("UPDATE drivers SET kyc_status = ? WHERE id = ? AND deleted = FALSE")
                .bind(kyc_status.as_str())
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

/// Moves the non-deleted driver `id` to `position` and appends the sample to its history.
pub(crate) async fn update_location(
    ex: &mut Executor,
    id: DriverId,
    position: Coordinates,
    heading: Option<f64>,
    speed_kmh: Option<f64>,
    now: OffsetDateTime,
) -> DbResult<DriverLocation> {
    let location_id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE drivers SET latitude = $1, longitude = $2
                WHERE id = $3 AND deleted = FALSE
            ";
            let affected = sqlx::query(query_str)
                .bind(position.latitude())
                .bind(position.longitude())
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected();
            ensure_one_row(affected)?;

            let query_str = "
                INSERT INTO driver_locations
                    (driver_id, latitude, longitude, heading, speed_kmh, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .bind(position.latitude())
                .bind(position.longitude())
                .bind(heading)
                .bind(speed_kmh)
                .bind(now)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let affected = sqlx::query(
                "UPDATE drivers SET latitude = ?, longitude = ? WHERE id = ? AND deleted = FALSE",
            )
            .bind(position.latitude())
            .bind(position.longitude())
            .bind(id.as_i64())
            .execute(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .rows_affected();
            ensure_one_row(affected)?;

            let (recorded_at_secs, recorded_at_nsecs) = sqlite::unpack_timestamp(now)?;
            let query_str = "
                INSERT INTO driver_locations
                    (driver_id, latitude, longitude, heading, speed_kmh,
                    recorded_at_secs, recorded_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .bind(position.latitude())
                .bind(position.longitude())
                .bind(heading)
                .bind(speed_kmh)
                .bind(recorded_at_secs)
                .bind(recorded_at_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(DriverLocation {
        id: LocationId::new(location_id),
        driver_id: id,
        latitude: position.latitude(),
        longitude: position.longitude(),
        heading,
        speed_kmh,
        recorded_at: now,
    })
}

/// Finds up to `limit` online drivers within `radius_meters` of `center`, nearest first.
///
/// Ties on distance are broken by identifier so that results are stable.
pub(crate) async fn nearby_drivers(
    ex: &mut Executor,
    center: &Coordinates,
    radius_meters: f64,
    limit: usize,
) -> DbResult<Vec<NearbyDriver>> {
    let online = DriverStatus::Online;
    let mut nearby = vec![];
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT * FROM (
                    SELECT *, 6371000.0 * acos(LEAST(1.0, GREATEST(-1.0,
                        cos(radians($1)) * cos(radians(latitude))
                            * cos(radians(longitude) - radians($2))
                        + sin(radians($1)) * sin(radians(latitude))))) AS distance_meters
                    FROM drivers
                    WHERE status = $3 AND deleted = FALSE
                        AND latitude IS NOT NULL AND longitude IS NOT NULL
                ) AS candidates
                WHERE distance_meters <= $4
                ORDER BY distance_meters, id
                LIMIT $5
            ";
            let limit = i64::try_from(limit)
                .map_err(|e| DbError::BackendError(format!("Invalid limit: {}", e)))?;
            let mut rows = sqlx::query(query_str)
                .bind(center.latitude())
                .bind(center.longitude())
                .bind(online.as_str())
                .bind(radius_meters)
                .bind(limit)
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let distance_meters: f64 =
                    row.try_get("distance_meters").map_err(postgres::map_sqlx_error)?;
                let driver = Driver::from_pg_row(row)?;
                nearby.push(NearbyDriver { driver, distance_meters });
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            // SQLite builds do not reliably ship trigonometric functions, so narrow the candidates
            // to a latitude band and compute exact distances here.
            let band_degrees = (radius_meters / EARTH_RADIUS_METERS).to_degrees() + 0.01;
            let query_str = "
                SELECT * FROM drivers
                WHERE status = ? AND deleted = FALSE
                    AND latitude IS NOT NULL AND longitude IS NOT NULL
                    AND latitude BETWEEN ? AND ?
            ";
            let mut rows = sqlx::query(query_str)
                .bind(online.as_str())
                .bind(center.latitude() - band_degrees)
                .bind(center.latitude() + band_degrees)
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let driver = Driver::from_sqlite_row(row)?;
                let (Some(latitude), Some(longitude)) = (driver.latitude, driver.longitude) else {
                    continue;
                };
                let position = Coordinates::new(latitude, longitude)
                    .map_err(|e| DbError::DataIntegrityError(e.to_string()))?;
                let distance_meters = anta_geo::distance_meters(center, &position);
                if distance_meters <= radius_meters {
                    nearby.push(NearbyDriver { driver, distance_meters });
                }
            }
            nearby.sort_by(|a, b| {
                a.distance_meters
                    .total_cmp(&b.distance_meters)
                    .then_with(|| a.driver.id.cmp(&b.driver.id))
            });
            nearby.truncate(limit);
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(nearby)
}

/// Recomputes the average rating and rating count of driver `id` from its ratings.
pub(crate) async fn recompute_rating(ex: &mut Executor, id: DriverId) -> DbResult<()> {
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE drivers SET
                    rating = (SELECT AVG(CAST(score AS DOUBLE PRECISION))
                        FROM ratings WHERE driver_id = $1),
                    rating_count = (SELECT COUNT(*) FROM ratings WHERE driver_id = $1)
                WHERE id = $1
            ";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE drivers SET
                    rating = (SELECT AVG(CAST(score AS REAL)) FROM ratings WHERE driver_id = ?),
                    rating_count = (SELECT COUNT(*) FROM ratings WHERE driver_id = ?)
                WHERE id = ?
            ";
            sqlx::query(query_str)
                .bind(id.as_i64())
                .bind(id.as_i64())
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

/// Records the metadata of a KYC document submitted by driver `driver_id`.
pub(crate) async fn create_document(
    ex: &mut Executor,
    driver_id: DriverId,
    kind: DocumentKind,
    url: String,
    now: OffsetDateTime,
) -> DbResult<KycDocument> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO kyc_documents (driver_id, kind, url, created_at)
                VALUES ($1, $2, $3, $4)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(driver_id.as_i64())
                .bind(kind.as_str())
                .bind(url.as_str())
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
                INSERT INTO kyc_documents (driver_id, kind, url, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(driver_id.as_i64())
                .bind(kind.as_str())
                .bind(url.as_str())
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

    Ok(KycDocument { id: DocumentId::new(id), driver_id, kind, url, created_at: now })
}
