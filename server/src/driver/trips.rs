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

//! Operations on trips and their ratings.

use crate::db::{self, NewTrip, crud, crud::Filter};
use crate::driver::{AntaDriver, not_found};
use crate::model::*;
use anta_core::db::{DbError, Executor};
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};
use anta_geo::{Coordinates, distance_meters};
use log::warn;

/// Filters to select trips in listings.
#[derive(Debug, Default)]
pub(crate) struct TripFilters {
    /// Only return trips in this status.
    pub(crate) status: Option<TripStatus>,

    /// Only return trips requested by this rider.
    pub(crate) rider_id: Option<UserId>,

    /// Only return trips served by this driver.
    pub(crate) driver_id: Option<DriverId>,
}

/// Moves a driver that was serving a trip back to `online`, tolerating drivers deleted since.
async fn release_driver(ex: &mut Executor, driver_id: DriverId) -> DriverResult<()> {
    match db::set_driver_status(ex, driver_id, DriverStatus::Online).await {
        Ok(()) => Ok(()),
        Err(DbError::NotFound) => {
            warn!("Driver {} vanished while serving a trip", driver_id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

impl AntaDriver {
    /// Computes the expected length in meters and duration in seconds of a trip.
    ///
    /// Uses the mapping service when possible and falls back to the straight-line distance at the
    /// configured average speed otherwise.
    async fn estimate_route(&self, origin: &Coordinates, destination: &Coordinates) -> (i64, i64) {
        match self.maps.directions(origin, destination).await {
            Ok(Some(route)) => {
                let distance = i64::try_from(route.distance_meters);
                let duration = i64::try_from(route.duration_seconds);
                match (distance, duration) {
                    (Ok(distance), Ok(duration)) => return (distance, duration),
                    _ => warn!("Ignoring out of range route from {} to {}", origin, destination),
                }
            }
            Ok(None) => warn!("No route from {} to {}; estimating", origin, destination),
            Err(e) => {
                warn!("Cannot get route from {} to {}; estimating: {}", origin, destination, e)
            }
        }

        let meters = distance_meters(origin, destination);
        let meters_per_second = self.opts.average_speed_kmh * 1000.0 / 3600.0;
        (meters.round() as i64, (meters / meters_per_second).round() as i64)
    }

    /// Requests a trip for `rider_id` from `origin` to `destination`, priced with the rates of
    /// `zone_id` and discounted with `promo_code` if given.
    ///
    /// The promo code is redeemed as part of the request.
    pub(crate) async fn request_trip(
        self,
        rider_id: UserId,
        zone_id: ZoneId,
        origin: Coordinates,
        destination: Coordinates,
        promo_code: Option<PromoCodeName>,
    ) -> DriverResult<Trip> {
        let (distance_meters, duration_seconds) = self.estimate_route(&origin, &destination).await;

        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let rider = crud::get::<User>(tx.ex(), rider_id.as_i64())
            .await
            .map_err(not_found(format!("User {} not found", rider_id)))?;
        if rider.status != UserStatus::Active {
            return Err(DriverError::Forbidden(format!("User {} is suspended", rider.id)));
        }
        let zone = crud::get::<Zone>(tx.ex(), zone_id.as_i64())
            .await
            .map_err(not_found(format!("Zone {} not found", zone_id)))?;

        let fare_cents = zone.rates.fare_cents(distance_meters, duration_seconds);
        if fare_cents > MAX_AMOUNT_CENTS {
            return Err(DriverError::InvalidInput(format!(
                "Fare {} exceeds the maximum of {}",
                fare_cents, MAX_AMOUNT_CENTS
            )));
        }
        let mut discount_cents = 0;
        if let Some(code) = promo_code.as_ref() {
            let promo = db::get_promo_by_code(tx.ex(), code)
                .await
                .map_err(not_found(format!("Promo code {} not found", code.as_str())))?;
            promo.check_redeemable(now)?;
            if !db::redeem_promo(tx.ex(), code, now).await? {
                return Err(DriverError::InvalidInput(format!(
                    "Promo code {} can no longer be redeemed",
                    code.as_str()
                )));
            }
            discount_cents = promo.discount_cents(fare_cents);
        }

        let trip = NewTrip {
            rider_id: rider.id,
            zone_id: zone.id,
            origin,
            destination,
            distance_meters,
            duration_seconds,
            fare_cents,
            discount_cents,
            promo_code,
        };
        let trip = db::create_trip(tx.ex(), trip, now).await?;

        tx.commit().await?;
        Ok(trip)
    }

    /// Gets the trip identified by `id`.
    pub(crate) async fn get_trip(self, id: TripId) -> DriverResult<Trip> {
        let mut ex = self.db.ex().await?;
        crud::get::<Trip>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", id)))
    }

    /// Lists trips that match `filters`.
    pub(crate) async fn list_trips(
        self,
        filters: TripFilters,
        page: PageRequest,
    ) -> DriverResult<Page<Trip>> {
        let mut db_filters = vec![];
        if let Some(status) = filters.status {
            db_filters.push(Filter::text("status", status.as_str()));
        }
        if let Some(rider_id) = filters.rider_id {
            db_filters.push(Filter::int("rider_id", rider_id.as_i64()));
        }
        if let Some(driver_id) = filters.driver_id {
            db_filters.push(Filter::int("driver_id", driver_id.as_i64()));
        }
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<Trip>(&mut ex, &db_filters, page).await?)
    }

    /// Soft-deletes the trip identified by `id`.
    ///
    /// Trips that hold a driver (accepted or in progress) must be completed or cancelled first.
    pub(crate) async fn delete_trip(self, id: TripId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        let trip = crud::get::<Trip>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", id)))?;
        if matches!(trip.status, TripStatus::Accepted | TripStatus::InProgress) {
            return Err(DriverError::InvalidState(format!(
                "Trip {} is {} and cannot be deleted",
                trip.id, trip.status
            )));
        }
        crud::soft_delete::<Trip>(tx.ex(), trip.id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", id)))?;

        tx.commit().await?;
        Ok(())
    }

    /// Moves the trip identified by `id` to the `next` status.
    ///
    /// Accepting a trip requires the `driver_id` of an online driver, who becomes busy until the
    /// trip completes or is cancelled.
    pub(crate) async fn update_trip_status(
        self,
        id: TripId,
        next: TripStatus,
        driver_id: Option<DriverId>,
    ) -> DriverResult<Trip> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let mut trip = crud::get::<Trip>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", id)))?;
        if !trip.status.can_become(next) {
            return Err(DriverError::InvalidState(format!(
                "Trip {} cannot go from {} to {}",
                trip.id, trip.status, next
            )));
        }

        let mut assigned = None;
        match next {
            TripStatus::Accepted => {
                let driver_id = driver_id.ok_or_else(|| {
                    DriverError::InvalidInput("A driver is required to accept a trip".to_owned())
                })?;
                let driver = crud::get::<Driver>(tx.ex(), driver_id.as_i64())
                    .await
                    .map_err(not_found(format!("Driver {} not found", driver_id)))?;
                if driver.status != DriverStatus::Online {
                    return Err(DriverError::InvalidState(format!(
                        "Driver {} is not available",
                        driver.id
                    )));
                }
                db::set_driver_status(tx.ex(), driver.id, DriverStatus::Busy).await?;
                assigned = Some(driver.id);
            }
            TripStatus::Completed | TripStatus::Cancelled => {
                if let Some(driver_id) = trip.driver_id {
                    release_driver(tx.ex(), driver_id).await?;
                }
            }
            TripStatus::Requested | TripStatus::InProgress => (),
        }

        if !db::update_trip_status(tx.ex(), trip.id, trip.status, next, assigned, now).await? {
            return Err(DriverError::InvalidState(format!(
                "Trip {} was modified concurrently",
                trip.id
            )));
        }
        trip.status = next;
        trip.driver_id = assigned.or(trip.driver_id);
        trip.updated_at = now;

        tx.commit().await?;
        Ok(trip)
    }

    /// Lets `rater_id` rate the driver of the completed trip identified by `trip_id`.
    pub(crate) async fn rate_trip(
        self,
        trip_id: TripId,
        rater_id: UserId,
        score: Score,
        comment: Option<String>,
    ) -> DriverResult<Rating> {
        let comment = Rating::clean_comment(comment)?;

        let mut tx = self.db.begin().await?;

        let trip = crud::get::<Trip>(tx.ex(), trip_id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", trip_id)))?;
        if trip.rider_id != rater_id {
            return Err(DriverError::Forbidden(format!(
                "Only the rider of trip {} can rate it",
                trip.id
            )));
        }
        if trip.status != TripStatus::Completed {
            return Err(DriverError::InvalidState(format!(
                "Trip {} has not been completed",
                trip.id
            )));
        }
        let driver_id = trip.driver_id.ok_or_else(|| {
            DriverError::BackendError(format!("Completed trip {} has no driver", trip.id))
        })?;

        let rating =
            match db::create_rating(tx.ex(), trip.id, rater_id, driver_id, score, comment).await {
                Ok(rating) => rating,
                Err(DbError::AlreadyExists) => {
                    return Err(DriverError::AlreadyExists(format!(
                        "Trip {} has already been rated",
                        trip.id
                    )));
                }
                Err(e) => return Err(e.into()),
            };
        db::recompute_rating(tx.ex(), driver_id).await?;

        tx.commit().await?;
        Ok(rating)
    }
}
