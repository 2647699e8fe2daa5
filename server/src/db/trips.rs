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

//! Database operations on trips and their ratings.

use crate::db::crud::Entity;
use crate::model::{
    DriverId, PromoCodeName, Rating, RatingId, Score, Trip, TripId, TripStatus, UserId, ZoneId,
};
#[cfg(feature = "postgres")]
use anta_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use anta_core::db::sqlite;
use anta_core::db::{DbError, DbResult, Executor};
use anta_geo::Coordinates;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

/// Details of a trip to be created, already priced.
#[derive(Clone, Debug)]
pub(crate) struct NewTrip {
    /// The user requesting the trip.
    pub(crate) rider_id: UserId,

    /// The zone whose rates priced the trip.
    pub(crate) zone_id: ZoneId,

    /// Pickup point.
    pub(crate) origin: Coordinates,

    /// Drop-off point.
    pub(crate) destination: Coordinates,

    /// Expected route length.
    pub(crate) distance_meters: i64,

    /// Expected travel time.
    pub(crate) duration_seconds: i64,

    /// Price before discounts.
    pub(crate) fare_cents: i64,

    /// Discount granted by `promo_code`.
    pub(crate) discount_cents: i64,

    /// Promo code redeemed for this trip.
    pub(crate) promo_code: Option<PromoCodeName>,
}

/// Builds a point out of raw coordinates stored in the database.
fn stored_point(latitude: f64, longitude: f64) -> DbResult<Coordinates> {
    Coordinates::new(latitude, longitude).map_err(|e| DbError::DataIntegrityError(e.to_string()))
}

impl Entity for Trip {
    const TABLE: &'static str = "trips";
    const SOFT_DELETE: bool = true;

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let rider_id: i64 = row.try_get("rider_id").map_err(postgres::map_sqlx_error)?;
        let driver_id: Option<i64> = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let zone_id: i64 = row.try_get("zone_id").map_err(postgres::map_sqlx_error)?;
        let origin_lat: f64 = row.try_get("origin_lat").map_err(postgres::map_sqlx_error)?;
        let origin_lng: f64 = row.try_get("origin_lng").map_err(postgres::map_sqlx_error)?;
        let dest_lat: f64 = row.try_get("dest_lat").map_err(postgres::map_sqlx_error)?;
        let dest_lng: f64 = row.try_get("dest_lng").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let distance_meters: i64 =
            row.try_get("distance_meters").map_err(postgres::map_sqlx_error)?;
        let duration_seconds: i64 =
            row.try_get("duration_seconds").map_err(postgres::map_sqlx_error)?;
        let fare_cents: i64 = row.try_get("fare_cents").map_err(postgres::map_sqlx_error)?;
        let discount_cents: i64 = row.try_get("discount_cents").map_err(postgres::map_sqlx_error)?;
        let promo_code: Option<String> =
            row.try_get("promo_code").map_err(postgres::map_sqlx_error)?;
        let created_at: OffsetDateTime =
            row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
        let updated_at: OffsetDateTime =
            row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

        Ok(Trip {
            id: TripId::new(id),
            rider_id: UserId::new(rider_id),
            driver_id: driver_id.map(DriverId::new),
            zone_id: ZoneId::new(zone_id),
            origin: stored_point(origin_lat, origin_lng)?,
            destination: stored_point(dest_lat, dest_lng)?,
            status: TripStatus::parse(status)?,
            distance_meters,
            duration_seconds,
            fare_cents,
            discount_cents,
            promo_code: promo_code.map(PromoCodeName::new).transpose()?,
            created_at,
            updated_at,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let rider_id: i64 = row.try_get("rider_id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: Option<i64> = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let zone_id: i64 = row.try_get("zone_id").map_err(sqlite::map_sqlx_error)?;
        let origin_lat: f64 = row.try_get("origin_lat").map_err(sqlite::map_sqlx_error)?;
        let origin_lng: f64 = row.try_get("origin_lng").map_err(sqlite::map_sqlx_error)?;
        let dest_lat: f64 = row.try_get("dest_lat").map_err(sqlite::map_sqlx_error)?;
        let dest_lng: f64 = row.try_get("dest_lng").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let distance_meters: i64 =
            row.try_get("distance_meters").map_err(sqlite::map_sqlx_error)?;
        let duration_seconds: i64 =
            row.try_get("duration_seconds").map_err(sqlite::map_sqlx_error)?;
        let fare_cents: i64 = row.try_get("fare_cents").map_err(sqlite::map_sqlx_error)?;
        let discount_cents: i64 = row.try_get("discount_cents").map_err(sqlite::map_sqlx_error)?;
        let promo_code: Option<String> =
            row.try_get("promo_code").map_err(sqlite::map_sqlx_error)?;
        let created_at = sqlite::get_timestamp(&row, "created_at")?;
        let updated_at = sqlite::get_timestamp(&row, "updated_at")?;

        Ok(Trip {
            id: TripId::new(id),
            rider_id: UserId::new(rider_id),
            driver_id: driver_id.map(DriverId::new),
            zone_id: ZoneId::new(zone_id),
            origin: stored_point(origin_lat, origin_lng)?,
            destination: stored_point(dest_lat, dest_lng)?,
            status: TripStatus::parse(status)?,
            distance_meters,
            duration_seconds,
            fare_cents,
            discount_cents,
            promo_code: promo_code.map(PromoCodeName::new).transpose()?,
            created_at,
            updated_at,
        })
    }
}

impl Entity for Rating {
    const TABLE: &'static str = "ratings";

    #[cfg(feature = "postgres")]
    fn from_pg_row(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let trip_id: i64 = row.try_get("trip_id").map_err(postgres::map_sqlx_error)?;
        let rater_id: i64 = row.try_get("rater_id").map_err(postgres::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(postgres::map_sqlx_error)?;
        let score: i64 = row.try_get("score").map_err(postgres::map_sqlx_error)?;
        let comment: Option<String> = row.try_get("comment").map_err(postgres::map_sqlx_error)?;

        Ok(Rating {
            id: RatingId::new(id),
            trip_id: TripId::new(trip_id),
            rater_id: UserId::new(rater_id),
            driver_id: DriverId::new(driver_id),
            score: Score::new(score)?,
            comment,
        })
    }

    #[cfg(any(feature = "sqlite", test))]
    fn from_sqlite_row(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let trip_id: i64 = row.try_get("trip_id").map_err(sqlite::map_sqlx_error)?;
        let rater_id: i64 = row.try_get("rater_id").map_err(sqlite::map_sqlx_error)?;
        let driver_id: i64 = row.try_get("driver_id").map_err(sqlite::map_sqlx_error)?;
        let score: i64 = row.try_get("score").map_err(sqlite::map_sqlx_error)?;
        let comment: Option<String> = row.try_get("comment").map_err(sqlite::map_sqlx_error)?;

        Ok(Rating {
            id: RatingId::new(id),
            trip_id: TripId::new(trip_id),
            rater_id: UserId::new(rater_id),
            driver_id: DriverId::new(driver_id),
            score: Score::new(score)?,
            comment,
        })
    }
}

/// Creates a new trip in the requested state.
pub(crate) async fn create_trip(
    ex: &mut Executor,
    trip: NewTrip,
    now: OffsetDateTime,
) -> DbResult<Trip> {
    let status = TripStatus::Requested;
    let promo_code = trip.promo_code.as_ref().map(PromoCodeName::as_str);
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO trips
                    (rider_id, zone_id, origin_lat, origin_lng, dest_lat, dest_lng, status,
                    distance_meters, duration_seconds, fare_cents, discount_cents, promo_code,
                    created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip.rider_id.as_i64())
                .bind(trip.zone_id.as_i64())
                .bind(trip.origin.latitude())
                .bind(trip.origin.longitude())
                .bind(trip.destination.latitude())
                .bind(trip.destination.longitude())
                .bind(status.as_str())
                .bind(trip.distance_meters)
                .bind(trip.duration_seconds)
                .bind(trip.fare_cents)
                .bind(trip.discount_cents)
                .bind(promo_code)
                .bind(now)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = sqlite::unpack_timestamp(now)?;
            let query_str = "
                INSERT INTO trips
                    (rider_id, zone_id, origin_lat, origin_lng, dest_lat, dest_lng, status,
                    distance_meters, duration_seconds, fare_cents, discount_cents, promo_code,
                    created_at_secs, created_at_nsecs, updated_at_secs, updated_at_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip.rider_id.as_i64())
                .bind(trip.zone_id.as_i64())
                .bind(trip.origin.latitude())
                .bind(trip.origin.longitude())
                .bind(trip.destination.latitude())
                .bind(trip.destination.longitude())
                .bind(status.as_str())
                .bind(trip.distance_meters)
                .bind(trip.duration_seconds)
                .bind(trip.fare_cents)
                .bind(trip.discount_cents)
                .bind(promo_code)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(now_secs)
                .bind(now_nsecs)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Trip {
        id: TripId::new(id),
        rider_id: trip.rider_id,
        driver_id: None,
        zone_id: trip.zone_id,
        origin: trip.origin,
        destination: trip.destination,
        status,
        distance_meters: trip.distance_meters,
        duration_seconds: trip.duration_seconds,
        fare_cents: trip.fare_cents,
        discount_cents: trip.discount_cents,
        promo_code: trip.promo_code,
        created_at: now,
        updated_at: now,
    })
}

/// Moves the non-deleted trip `id` from status `from` to status `to`, assigning `driver_id` to it
/// if given.
///
/// The update only happens if the trip is still in `from`, which makes concurrent transitions
/// safe.  Returns false if the trip was not in `from` anymore.
pub(crate) async fn update_trip_status(
    ex: &mut Executor,
    id: TripId,
    from: TripStatus,
    to: TripStatus,
    driver_id: Option<DriverId>,
    now: OffsetDateTime,
) -> DbResult<bool> {
    let driver_id = driver_id.map(DriverId::as_i64);
    let affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE trips
                SET status = $1, driver_id = COALESCE($2, driver_id), updated_at = $3
                WHERE id = $4 AND status = $5 AND deleted = FALSE
            ";
            sqlx::query(query_str)
                .bind(to.as_str())
                .bind(driver_id)
                .bind(now)
                .bind(id.as_i64())
                .bind(from.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = sqlite::unpack_timestamp(now)?;
            let query_str = "
                UPDATE trips
                SET status = ?, driver_id = COALESCE(?, driver_id),
                    updated_at_secs = ?, updated_at_nsecs = ?
                WHERE id = ? AND status = ? AND deleted = FALSE
            ";
            sqlx::query(query_str)
                .bind(to.as_str())
                .bind(driver_id)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(id.as_i64())
                .bind(from.as_str())
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

/// Records the `score` that `rater_id` gave to `driver_id` for trip `trip_id`.
pub(crate) async fn create_rating(
    ex: &mut Executor,
    trip_id: TripId,
    rater_id: UserId,
    driver_id: DriverId,
    score: Score,
    comment: Option<String>,
) -> DbResult<Rating> {
    let id: i64 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO ratings (trip_id, rater_id, driver_id, score, comment)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip_id.as_i64())
                .bind(rater_id.as_i64())
                .bind(driver_id.as_i64())
                .bind(score.as_i64())
                .bind(comment.as_deref())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO ratings (trip_id, rater_id, driver_id, score, comment)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id
            ";
            let row = sqlx::query(query_str)
                .bind(trip_id.as_i64())
                .bind(rater_id.as_i64())
                .bind(driver_id.as_i64())
                .bind(score.as_i64())
                .bind(comment.as_deref())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    Ok(Rating { id: RatingId::new(id), trip_id, rater_id, driver_id, score, comment })
}
