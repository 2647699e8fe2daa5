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

//! Operations on drivers, their location and their KYC documents.

use crate::db::{self, crud, crud::Filter};
use crate::driver::{AntaDriver, log_admin_action, not_found, require_admin};
use crate::model::*;
use anta_core::db::DbError;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};
use anta_geo::Coordinates;
use log::info;
use url::Url;

/// Default search radius for nearby drivers.
pub(crate) const DEFAULT_NEARBY_RADIUS_METERS: f64 = 5000.0;

/// Maximum search radius for nearby drivers.
const MAX_NEARBY_RADIUS_METERS: f64 = 50_000.0;

/// Default number of nearby drivers to return.
pub(crate) const DEFAULT_NEARBY_LIMIT: usize = 10;

/// Maximum number of nearby drivers to return.
const MAX_NEARBY_LIMIT: usize = 50;

/// Maximum speed accepted in location reports.
const MAX_SPEED_KMH: f64 = 400.0;

/// Checks that `url` points to a document reachable over HTTP.
fn validate_document_url(url: &str) -> DriverResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| DriverError::InvalidInput(format!("Invalid document URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(DriverError::InvalidInput(format!(
            "Document URL must use http or https, not {}",
            scheme
        ))),
    }
}

impl AntaDriver {
    /// Creates a driver profile for the existing user `user_id` and opens its wallet.
    pub(crate) async fn register_driver(
        self,
        user_id: UserId,
        license_number: LicenseNumber,
    ) -> DriverResult<Driver> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let driver = match db::create_driver(tx.ex(), user_id, license_number, now).await {
            Ok(driver) => driver,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!("User {} not found", user_id)));
            }
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(
                    "User already has a driver profile or license is already registered"
                        .to_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        db::create_wallet(tx.ex(), OwnerKind::Driver, driver.id.as_i64()).await?;

        tx.commit().await?;
        info!("Registered driver {} for user {}", driver.id, user_id);
        Ok(driver)
    }

    /// Gets the driver identified by `id`.
    pub(crate) async fn get_driver(self, id: DriverId) -> DriverResult<Driver> {
        let mut ex = self.db.ex().await?;
        crud::get::<Driver>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))
    }

    /// Lists drivers, optionally restricted to those with `status`.
    pub(crate) async fn list_drivers(
        self,
        status: Option<DriverStatus>,
        page: PageRequest,
    ) -> DriverResult<Page<Driver>> {
        let mut filters = vec![];
        if let Some(status) = status {
            filters.push(Filter::text("status", status.as_str()));
        }
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<Driver>(&mut ex, &filters, page).await?)
    }

    /// Soft-deletes the driver identified by `id` on behalf of `admin_id`.
    pub(crate) async fn delete_driver(self, id: DriverId, admin_id: UserId) -> DriverResult<()> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        crud::soft_delete::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        log_admin_action(tx.ex(), &admin, "driver_delete", "driver", Some(id.as_i64()), None, now)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Switches the availability of the driver identified by `id` to `status`.
    ///
    /// Drivers can only move themselves between `online` and `offline`; the other states are
    /// managed by trips and by admins.
    pub(crate) async fn set_driver_status(
        self,
        id: DriverId,
        status: DriverStatus,
    ) -> DriverResult<Driver> {
        if status != DriverStatus::Online && status != DriverStatus::Offline {
            return Err(DriverError::InvalidInput(
                "Drivers can only switch between online and offline".to_owned(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let mut driver = crud::get::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        match driver.status {
            DriverStatus::Busy => {
                return Err(DriverError::InvalidState(format!(
                    "Driver {} is on a trip",
                    driver.id
                )));
            }
            DriverStatus::Suspended => {
                return Err(DriverError::Forbidden(format!("Driver {} is suspended", driver.id)));
            }
            DriverStatus::Offline | DriverStatus::Online => (),
        }
        if status == DriverStatus::Online && driver.kyc_status != KycStatus::Approved {
            return Err(DriverError::Forbidden(format!(
                "Driver {} cannot go online until KYC is approved",
                driver.id
            )));
        }

        db::set_driver_status(tx.ex(), driver.id, status).await?;
        driver.status = status;

        tx.commit().await?;
        Ok(driver)
    }

    /// Records that the driver identified by `id` is at `position`.
    pub(crate) async fn update_driver_location(
        self,
        id: DriverId,
        position: Coordinates,
        heading: Option<f64>,
        speed_kmh: Option<f64>,
    ) -> DriverResult<DriverLocation> {
        if let Some(heading) = heading {
            if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
                return Err(DriverError::InvalidInput(format!(
                    "Heading {} must be in [0, 360)",
                    heading
                )));
            }
        }
        if let Some(speed_kmh) = speed_kmh {
            if !speed_kmh.is_finite() || !(0.0..=MAX_SPEED_KMH).contains(&speed_kmh) {
                return Err(DriverError::InvalidInput(format!(
                    "Speed {} must be between 0 and {}",
                    speed_kmh, MAX_SPEED_KMH
                )));
            }
        }

        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;
        let location = db::update_location(tx.ex(), id, position, heading, speed_kmh, now)
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        tx.commit().await?;
        Ok(location)
    }

    /// Lists the location history of the driver identified by `id`, most recent first.
    pub(crate) async fn list_driver_locations(
        self,
        id: DriverId,
        page: PageRequest,
    ) -> DriverResult<Page<DriverLocation>> {
        let mut tx = self.db.begin().await?;
        crud::get::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        let filters = [Filter::int("driver_id", id.as_i64())];
        let locations = crud::list::<DriverLocation>(tx.ex(), &filters, page).await?;
        tx.commit().await?;
        Ok(locations)
    }

    /// Finds online drivers within `radius_meters` of `center`, nearest first.
    pub(crate) async fn nearby_drivers(
        self,
        center: Coordinates,
        radius_meters: f64,
        limit: usize,
    ) -> DriverResult<Vec<NearbyDriver>> {
        if !radius_meters.is_finite()
            || radius_meters <= 0.0
            || radius_meters > MAX_NEARBY_RADIUS_METERS
        {
            return Err(DriverError::InvalidInput(format!(
                "Radius must be in (0, {}] meters",
                MAX_NEARBY_RADIUS_METERS
            )));
        }
        if !(1..=MAX_NEARBY_LIMIT).contains(&limit) {
            return Err(DriverError::InvalidInput(format!(
                "Limit must be between 1 and {}",
                MAX_NEARBY_LIMIT
            )));
        }

        let mut ex = self.db.ex().await?;
        Ok(db::nearby_drivers(&mut ex, &center, radius_meters, limit).await?)
    }

    /// Records the KYC document of `kind` stored at `url` for the driver identified by `id` and
    /// puts the driver's KYC up for review.
    pub(crate) async fn submit_document(
        self,
        id: DriverId,
        kind: DocumentKind,
        url: String,
    ) -> DriverResult<KycDocument> {
        let url = validate_document_url(&url)?;

        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let driver = crud::get::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        let document = db::create_document(tx.ex(), driver.id, kind, url.into(), now).await?;
        db::set_kyc_status(tx.ex(), driver.id, KycStatus::Pending).await?;

        tx.commit().await?;
        Ok(document)
    }

    /// Lists the KYC documents submitted by the driver identified by `id`.
    pub(crate) async fn list_documents(
        self,
        id: DriverId,
        page: PageRequest,
    ) -> DriverResult<Page<KycDocument>> {
        let mut tx = self.db.begin().await?;
        crud::get::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        let filters = [Filter::int("driver_id", id.as_i64())];
        let documents = crud::list::<KycDocument>(tx.ex(), &filters, page).await?;
        tx.commit().await?;
        Ok(documents)
    }

    /// Settles the pending KYC review of the driver identified by `id` with `decision` on behalf
    /// of `admin_id`.
    ///
    /// Rejected drivers that were online are taken offline.
    pub(crate) async fn review_kyc(
        self,
        id: DriverId,
        admin_id: UserId,
        decision: KycStatus,
    ) -> DriverResult<Driver> {
        if decision != KycStatus::Approved && decision != KycStatus::Rejected {
            return Err(DriverError::InvalidInput(
                "KYC review must either approve or reject".to_owned(),
            ));
        }

        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        let mut driver = crud::get::<Driver>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", id)))?;
        if driver.kyc_status != KycStatus::Pending {
            return Err(DriverError::InvalidState(format!(
                "Driver {} has no KYC submission pending review",
                driver.id
            )));
        }

        db::set_kyc_status(tx.ex(), driver.id, decision).await?;
        driver.kyc_status = decision;
        if decision == KycStatus::Rejected && driver.status == DriverStatus::Online {
            db::set_driver_status(tx.ex(), driver.id, DriverStatus::Offline).await?;
            driver.status = DriverStatus::Offline;
        }
        log_admin_action(
            tx.ex(),
            &admin,
            "kyc_review",
            "driver",
            Some(driver.id.as_i64()),
            Some(decision.to_string()),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(driver)
    }
}
