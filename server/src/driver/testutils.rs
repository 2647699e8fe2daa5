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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::{AntaDriver, AntaOptions};
use crate::model::*;
use anta_core::clocks::testutils::SettableClock;
use anta_core::db::{Db, Executor};
use anta_core::model::PhoneNumber;
use anta_geo::{Coordinates, MockMapsClient};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

/// Instant at which every test starts.
pub(crate) const START_TIME: OffsetDateTime = datetime!(2024-05-01 10:00:00 UTC);

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used by the driver, which tests can move at will.
    pub(crate) clock: Arc<SettableClock>,

    /// The mapping service used by the driver.
    pub(crate) maps: MockMapsClient,

    /// The driver under test.
    driver: AntaDriver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database, a settable clock and a mapping service
    /// that knows nothing.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(MockMapsClient::new(), AntaOptions::default()).await
    }

    /// Initializes the driver using the given mapping service and options.
    pub(crate) async fn setup_with(maps: MockMapsClient, opts: AntaOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(anta_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(START_TIME));
        let driver = AntaDriver::new(db.clone(), clock.clone(), Arc::new(maps.clone()), opts);
        Self { db, clock, maps, driver }
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver.
    pub(crate) fn driver(&self) -> AntaDriver {
        self.driver.clone()
    }

    /// Creates a user with `role` whose phone number is derived from `n`, plus its wallet.
    pub(crate) async fn put_user(&self, n: u32, role: Role) -> User {
        self.driver()
            .create_user(
                PhoneNumber::new(format!("+6281200{:05}", n)).unwrap(),
                FullName::new(format!("User {}", n)).unwrap(),
                None,
                role,
            )
            .await
            .unwrap()
    }

    /// Creates an admin user whose phone number is derived from `n`.
    pub(crate) async fn put_admin(&self, n: u32) -> UserId {
        self.put_user(n, Role::Admin).await.id
    }

    /// Creates a driver with approved KYC for a new user derived from `n`.
    ///
    /// The driver is left online at `position` if given, or offline otherwise.
    pub(crate) async fn put_driver(&self, n: u32, position: Option<Coordinates>) -> Driver {
        let user = self.put_user(n, Role::Driver).await;
        let license = LicenseNumber::new(format!("LIC-{}", n)).unwrap();
        let driver = self.driver().register_driver(user.id, license).await.unwrap();

        let mut ex = self.ex().await;
        db::set_kyc_status(&mut ex, driver.id, KycStatus::Approved).await.unwrap();
        if let Some(position) = position {
            db::update_location(&mut ex, driver.id, position, None, None, START_TIME)
                .await
                .unwrap();
            db::set_driver_status(&mut ex, driver.id, DriverStatus::Online).await.unwrap();
        }
        db::crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap()
    }

    /// Creates a zone named `name` with simple rates.
    pub(crate) async fn put_zone(&self, name: &str) -> Zone {
        let rates = ZoneRates {
            base_fare_cents: 500,
            per_km_cents: 300,
            per_minute_cents: 50,
            surge_multiplier: 1.0,
        };
        db::create_zone(&mut self.ex().await, name.to_owned(), rates).await.unwrap()
    }

    /// Requests a trip for `rider_id` in `zone_id` between two fixed points in Jakarta.
    pub(crate) async fn put_trip(&self, rider_id: UserId, zone_id: ZoneId) -> Trip {
        let origin = point(-6.1754, 106.8272);
        let destination = point(-6.1950, 106.8230);
        self.driver().request_trip(rider_id, zone_id, origin, destination, None).await.unwrap()
    }

    /// Takes `trip` to the completed state served by `driver_id`.
    pub(crate) async fn complete_trip(&self, trip: &Trip, driver_id: DriverId) -> Trip {
        self.driver()
            .update_trip_status(trip.id, TripStatus::Accepted, Some(driver_id))
            .await
            .unwrap();
        self.driver().update_trip_status(trip.id, TripStatus::InProgress, None).await.unwrap();
        self.driver().update_trip_status(trip.id, TripStatus::Completed, None).await.unwrap()
    }

    /// Fetches the latest pending one-time password for `phone` straight from the database.
    pub(crate) async fn latest_otp(&self, phone: &PhoneNumber) -> Option<Otp> {
        db::get_latest_unconsumed_otp(&mut self.ex().await, phone).await.unwrap()
    }

    /// Sets the balance of the wallet of `owner` to `balance_cents`, creating it if necessary.
    pub(crate) async fn set_balance(&self, owner: WalletOwner, balance_cents: i64) {
        let mut ex = self.ex().await;
        let wallet = db::top_up(&mut ex, owner.kind(), owner.id(), 0).await.unwrap();
        if wallet.balance_cents > balance_cents {
            let delta = wallet.balance_cents - balance_cents;
            let debited = db::debit_if_sufficient(&mut ex, owner.kind(), owner.id(), delta).await;
            assert!(debited.unwrap());
        } else if wallet.balance_cents < balance_cents {
            db::credit(&mut ex, owner.kind(), owner.id(), balance_cents - wallet.balance_cents)
                .await
                .unwrap();
        }
    }

    /// Gets the balance of the wallet of `owner`.
    pub(crate) async fn balance(&self, owner: WalletOwner) -> i64 {
        db::get_wallet(&mut self.ex().await, owner.kind(), owner.id()).await.unwrap().balance_cents
    }
}

/// Shorthand to build a point that is known to be valid.
pub(crate) fn point(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates::new(latitude, longitude).unwrap()
}

/// Shorthand to build the wallet owner of a user.
pub(crate) fn user_wallet(id: UserId) -> WalletOwner {
    WalletOwner::new(OwnerKind::User, id.as_i64()).unwrap()
}

/// Shorthand to build the wallet owner of a driver.
pub(crate) fn driver_wallet(id: DriverId) -> WalletOwner {
    WalletOwner::new(OwnerKind::Driver, id.as_i64()).unwrap()
}

/// Returns the attributes of a common family car.
pub(crate) fn avanza() -> VehicleSpec {
    VehicleSpec {
        make: "Toyota".to_owned(),
        model: "Avanza".to_owned(),
        color: "Silver".to_owned(),
        year: 2021,
        category: VehicleCategory::Economy,
    }
}
