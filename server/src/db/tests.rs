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

//! Common tests for any database implementation.

use crate::db::crud::{self, Filter};
use crate::db::testutils::{SOME_TIME, put_user, unknown_user_id};
use crate::db::*;
use crate::model::*;
use anta_core::db::{Db, DbError, Executor};
use anta_core::model::{EmailAddress, PageRequest, PhoneNumber};
use anta_geo::Coordinates;
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;

/// Shorthand for the database handle the tests receive.
type TestDb = Arc<dyn Db + Send + Sync>;

/// Creates a zone with simple rates named `name`.
async fn put_zone(ex: &mut Executor, name: &str) -> Zone {
    let rates = ZoneRates {
        base_fare_cents: 500,
        per_km_cents: 300,
        per_minute_cents: 50,
        surge_multiplier: 1.0,
    };
    create_zone(ex, name.to_owned(), rates).await.unwrap()
}

/// Creates an online driver for a new user derived from `n`, positioned at `position`.
async fn put_online_driver(ex: &mut Executor, n: u32, position: Option<Coordinates>) -> Driver {
    let user = put_user(ex, n, Role::Driver).await;
    let license = LicenseNumber::new(format!("LIC-{}", n)).unwrap();
    let mut driver = create_driver(ex, user.id, license, SOME_TIME).await.unwrap();
    set_driver_status(ex, driver.id, DriverStatus::Online).await.unwrap();
    driver.status = DriverStatus::Online;
    if let Some(position) = position {
        update_location(ex, driver.id, position, None, None, SOME_TIME).await.unwrap();
        driver.latitude = Some(position.latitude());
        driver.longitude = Some(position.longitude());
    }
    driver
}

/// Creates a trip for `rider_id` in `zone_id` with a fixed price.
async fn put_trip(ex: &mut Executor, rider_id: UserId, zone_id: ZoneId) -> Trip {
    let trip = NewTrip {
        rider_id,
        zone_id,
        origin: Coordinates::new(-6.1754, 106.8272).unwrap(),
        destination: Coordinates::new(-6.1950, 106.8230).unwrap(),
        distance_meters: 2500,
        duration_seconds: 600,
        fare_cents: 1750,
        discount_cents: 0,
        promo_code: None,
    };
    create_trip(ex, trip, SOME_TIME).await.unwrap()
}

pub(super) async fn test_users_create_get_update(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let mut user = create_user(
        &mut ex,
        PhoneNumber::new("+62 812-0000-1111").unwrap(),
        FullName::new("Siti Rahma").unwrap(),
        Some(EmailAddress::new("siti@example.com").unwrap()),
        Role::Rider,
        SOME_TIME,
    )
    .await
    .unwrap();
    assert_eq!(UserStatus::Active, user.status);
    assert!(!user.phone_verified);
    assert_eq!(user, crud::get::<User>(&mut ex, user.id.as_i64()).await.unwrap());

    user.full_name = FullName::new("Siti R.").unwrap();
    user.email = None;
    user.status = UserStatus::Suspended;
    update_user(&mut ex, &user).await.unwrap();
    assert_eq!(user, crud::get::<User>(&mut ex, user.id.as_i64()).await.unwrap());
}

pub(super) async fn test_users_phone_is_unique(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    put_user(&mut ex, 1, Role::Rider).await;
    let err = create_user(
        &mut ex,
        PhoneNumber::new("+628120000001").unwrap(),
        FullName::new("Someone Else").unwrap(),
        None,
        Role::Rider,
        SOME_TIME,
    )
    .await
    .unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);
}

pub(super) async fn test_users_set_phone_verified(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let user = put_user(&mut ex, 1, Role::Rider).await;
    assert!(set_phone_verified(&mut ex, &user.phone).await.unwrap());
    assert!(crud::get::<User>(&mut ex, user.id.as_i64()).await.unwrap().phone_verified);

    let unknown = PhoneNumber::new("+15550001234").unwrap();
    assert!(!set_phone_verified(&mut ex, &unknown).await.unwrap());
}

pub(super) async fn test_users_references_and_delete(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let lonely = put_user(&mut ex, 1, Role::Rider).await;
    let rider = put_user(&mut ex, 2, Role::Rider).await;
    let zone = put_zone(&mut ex, "Jakarta").await;
    put_trip(&mut ex, rider.id, zone.id).await;

    assert_eq!(0, count_user_references(&mut ex, lonely.id).await.unwrap());
    assert_eq!(1, count_user_references(&mut ex, rider.id).await.unwrap());

    crud::delete::<User>(&mut ex, lonely.id.as_i64()).await.unwrap();
    assert_eq!(
        DbError::NotFound,
        crud::get::<User>(&mut ex, lonely.id.as_i64()).await.unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        crud::delete::<User>(&mut ex, lonely.id.as_i64()).await.unwrap_err()
    );
}

pub(super) async fn test_crud_list_filters_and_pages(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    for i in 0..5 {
        put_user(&mut ex, i, if i % 2 == 0 { Role::Rider } else { Role::Admin }).await;
    }

    let page = crud::list::<User>(&mut ex, &[], PageRequest::new(Some(2), Some(2)).unwrap())
        .await
        .unwrap();
    assert_eq!(5, page.meta.total);
    assert_eq!(3, page.meta.total_pages);
    assert_eq!(2, page.items.len());
    assert_eq!("+628120000002", page.items[0].phone.as_str());
    assert_eq!("+628120000003", page.items[1].phone.as_str());

    let riders = [Filter::text("role", Role::Rider.as_str())];
    let page = crud::list::<User>(&mut ex, &riders, PageRequest::default()).await.unwrap();
    assert_eq!(3, page.meta.total);
    assert!(page.items.iter().all(|u| u.role == Role::Rider));

    let page = crud::list::<User>(&mut ex, &riders, PageRequest::new(Some(9), None).unwrap())
        .await
        .unwrap();
    assert_eq!(3, page.meta.total);
    assert!(page.items.is_empty());
}

pub(super) async fn test_drivers_lifecycle(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let user = put_user(&mut ex, 1, Role::Driver).await;
    let driver =
        create_driver(&mut ex, user.id, LicenseNumber::new("B-1234-XYZ").unwrap(), SOME_TIME)
            .await
            .unwrap();
    assert_eq!(DriverStatus::Offline, driver.status);
    assert_eq!(KycStatus::Unsubmitted, driver.kyc_status);
    assert_eq!(driver, crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap());

    set_kyc_status(&mut ex, driver.id, KycStatus::Approved).await.unwrap();
    set_driver_status(&mut ex, driver.id, DriverStatus::Online).await.unwrap();
    let fetched = crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap();
    assert_eq!(KycStatus::Approved, fetched.kyc_status);
    assert_eq!(DriverStatus::Online, fetched.status);

    // A second profile for the same user or the same license is rejected.
    assert_eq!(
        DbError::AlreadyExists,
        create_driver(&mut ex, user.id, LicenseNumber::new("OTHER-1").unwrap(), SOME_TIME)
            .await
            .unwrap_err()
    );

    crud::soft_delete::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap();
    assert_eq!(
        DbError::NotFound,
        crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        set_driver_status(&mut ex, driver.id, DriverStatus::Offline).await.unwrap_err()
    );
    assert_eq!(
        DbError::NotFound,
        crud::soft_delete::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap_err()
    );
    assert_eq!(0, crud::count::<Driver>(&mut ex, &[]).await.unwrap());
}

pub(super) async fn test_drivers_unknown_user(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let err =
        create_driver(&mut ex, unknown_user_id(), LicenseNumber::new("B-1").unwrap(), SOME_TIME)
            .await
            .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}

pub(super) async fn test_drivers_location_history(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let driver = put_online_driver(&mut ex, 1, None).await;
    let first = Coordinates::new(-6.2, 106.8).unwrap();
    let second = Coordinates::new(-6.21, 106.81).unwrap();
    update_location(&mut ex, driver.id, first, Some(90.0), Some(35.5), SOME_TIME).await.unwrap();
    let last = update_location(
        &mut ex,
        driver.id,
        second,
        None,
        None,
        SOME_TIME + Duration::from_secs(5),
    )
    .await
    .unwrap();

    let fetched = crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap();
    assert_eq!(Some(-6.21), fetched.latitude);
    assert_eq!(Some(106.81), fetched.longitude);

    let filters = [Filter::int("driver_id", driver.id.as_i64())];
    let history = crud::list::<DriverLocation>(&mut ex, &filters, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(2, history.meta.total);
    assert_eq!(last, history.items[0]);
    assert_eq!(Some(90.0), history.items[1].heading);
    assert_eq!(Some(35.5), history.items[1].speed_kmh);

    let err = update_location(&mut ex, DriverId::new(12345), first, None, None, SOME_TIME)
        .await
        .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}

pub(super) async fn test_drivers_nearby(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let rider = Coordinates::new(-6.1754, 106.8272).unwrap();
    let here = put_online_driver(&mut ex, 1, Some(rider)).await;
    let close = put_online_driver(&mut ex, 2, Some(Coordinates::new(-6.1950, 106.8230).unwrap()))
        .await;
    let far = put_online_driver(&mut ex, 3, Some(Coordinates::new(-6.9, 107.6).unwrap())).await;
    let offline =
        put_online_driver(&mut ex, 4, Some(Coordinates::new(-6.1760, 106.8272).unwrap())).await;
    set_driver_status(&mut ex, offline.id, DriverStatus::Offline).await.unwrap();
    let deleted =
        put_online_driver(&mut ex, 5, Some(Coordinates::new(-6.1760, 106.8272).unwrap())).await;
    crud::soft_delete::<Driver>(&mut ex, deleted.id.as_i64()).await.unwrap();
    put_online_driver(&mut ex, 6, None).await;

    let nearby = nearby_drivers(&mut ex, &rider, 5000.0, 10).await.unwrap();
    assert_eq!(
        vec![here.id, close.id],
        nearby.iter().map(|n| n.driver.id).collect::<Vec<DriverId>>()
    );
    assert!(nearby[0].distance_meters < 1.0);
    assert!((2200.0..2260.0).contains(&nearby[1].distance_meters));

    let nearby = nearby_drivers(&mut ex, &rider, 5000.0, 1).await.unwrap();
    assert_eq!(1, nearby.len());
    assert_eq!(here.id, nearby[0].driver.id);

    let nearby = nearby_drivers(&mut ex, &rider, 1000.0, 10).await.unwrap();
    assert_eq!(1, nearby.len());

    let nearby = nearby_drivers(&mut ex, &rider, 200_000.0, 10).await.unwrap();
    assert_eq!(3, nearby.len());
    assert_eq!(far.id, nearby[2].driver.id);

    let nowhere = Coordinates::new(40.0, -3.7).unwrap();
    assert!(nearby_drivers(&mut ex, &nowhere, 50_000.0, 10).await.unwrap().is_empty());
}

pub(super) async fn test_drivers_documents(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let driver = put_online_driver(&mut ex, 1, None).await;
    let doc = create_document(
        &mut ex,
        driver.id,
        DocumentKind::IdCard,
        "https://files.example.com/ktp.jpg".to_owned(),
        SOME_TIME,
    )
    .await
    .unwrap();
    assert_eq!(doc, crud::get::<KycDocument>(&mut ex, doc.id.as_i64()).await.unwrap());

    let err = create_document(
        &mut ex,
        DriverId::new(5555),
        DocumentKind::License,
        "https://files.example.com/sim.jpg".to_owned(),
        SOME_TIME,
    )
    .await
    .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}

pub(super) async fn test_vehicles_plate_is_unique(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let driver = put_online_driver(&mut ex, 1, None).await;
    let spec = VehicleSpec {
        make: "Toyota".to_owned(),
        model: "Avanza".to_owned(),
        color: "Silver".to_owned(),
        year: 2021,
        category: VehicleCategory::Economy,
    };
    let vehicle =
        create_vehicle(&mut ex, driver.id, Plate::new("b 1234 xyz").unwrap(), spec.clone())
            .await
            .unwrap();
    assert_eq!(vehicle, crud::get::<Vehicle>(&mut ex, vehicle.id.as_i64()).await.unwrap());
    assert_eq!("B 1234 XYZ", vehicle.plate.as_str());

    let err = create_vehicle(&mut ex, driver.id, Plate::new("B 1234 XYZ").unwrap(), spec)
        .await
        .unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);

    crud::delete::<Vehicle>(&mut ex, vehicle.id.as_i64()).await.unwrap();
    assert_eq!(0, crud::count::<Vehicle>(&mut ex, &[]).await.unwrap());
}

pub(super) async fn test_zones_name_is_unique(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let zone = put_zone(&mut ex, "Jakarta").await;
    assert_eq!(zone, crud::get::<Zone>(&mut ex, zone.id.as_i64()).await.unwrap());

    let err = create_zone(&mut ex, "Jakarta".to_owned(), zone.rates).await.unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);
}

pub(super) async fn test_promos_redeem(db: TestDb) {
    let mut ex = db.ex().await.unwrap();
    let now = datetime!(2024-05-01 10:00:00 UTC);

    let limited = PromoCodeName::new("TWICE").unwrap();
    create_promo(&mut ex, limited.clone(), PromoKind::Percent, 10, Some(2), None).await.unwrap();
    assert!(redeem_promo(&mut ex, &limited, now).await.unwrap());
    assert!(redeem_promo(&mut ex, &limited, now).await.unwrap());
    assert!(!redeem_promo(&mut ex, &limited, now).await.unwrap());
    assert_eq!(2, get_promo_by_code(&mut ex, &limited).await.unwrap().uses);

    let expiring = PromoCodeName::new("SOON").unwrap();
    let expires_at = now + Duration::from_secs(60);
    let promo =
        create_promo(&mut ex, expiring.clone(), PromoKind::Flat, 200, None, Some(expires_at))
            .await
            .unwrap();
    assert_eq!(promo, get_promo_by_code(&mut ex, &expiring).await.unwrap());
    assert!(redeem_promo(&mut ex, &expiring, now).await.unwrap());
    assert!(!redeem_promo(&mut ex, &expiring, expires_at).await.unwrap());

    let disabled = PromoCodeName::new("OFF").unwrap();
    create_promo(&mut ex, disabled.clone(), PromoKind::Flat, 100, None, None).await.unwrap();
    deactivate_promo(&mut ex, &disabled).await.unwrap();
    assert!(!get_promo_by_code(&mut ex, &disabled).await.unwrap().active);
    assert!(!redeem_promo(&mut ex, &disabled, now).await.unwrap());

    let unknown = PromoCodeName::new("NOPE").unwrap();
    assert_eq!(DbError::NotFound, get_promo_by_code(&mut ex, &unknown).await.unwrap_err());
    assert_eq!(DbError::NotFound, deactivate_promo(&mut ex, &unknown).await.unwrap_err());
    assert!(!redeem_promo(&mut ex, &unknown, now).await.unwrap());

    let err = create_promo(&mut ex, limited, PromoKind::Flat, 1, None, None).await.unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);
}

pub(super) async fn test_trips_status_transitions(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let rider = put_user(&mut ex, 1, Role::Rider).await;
    let zone = put_zone(&mut ex, "Jakarta").await;
    let driver = put_online_driver(&mut ex, 2, None).await;
    let trip = put_trip(&mut ex, rider.id, zone.id).await;
    assert_eq!(trip, crud::get::<Trip>(&mut ex, trip.id.as_i64()).await.unwrap());

    let later = SOME_TIME + Duration::from_secs(30);
    assert!(
        update_trip_status(
            &mut ex,
            trip.id,
            TripStatus::Requested,
            TripStatus::Accepted,
            Some(driver.id),
            later
        )
        .await
        .unwrap()
    );
    assert!(
        !update_trip_status(
            &mut ex,
            trip.id,
            TripStatus::Requested,
            TripStatus::Cancelled,
            None,
            later
        )
        .await
        .unwrap()
    );
    assert!(
        update_trip_status(
            &mut ex,
            trip.id,
            TripStatus::Accepted,
            TripStatus::InProgress,
            None,
            later
        )
        .await
        .unwrap()
    );

    let fetched = crud::get::<Trip>(&mut ex, trip.id.as_i64()).await.unwrap();
    assert_eq!(TripStatus::InProgress, fetched.status);
    assert_eq!(Some(driver.id), fetched.driver_id);
    assert_eq!(SOME_TIME, fetched.created_at);
    assert_eq!(later, fetched.updated_at);

    let filters = [Filter::int("rider_id", rider.id.as_i64())];
    assert_eq!(1, crud::count::<Trip>(&mut ex, &filters).await.unwrap());
    crud::soft_delete::<Trip>(&mut ex, trip.id.as_i64()).await.unwrap();
    assert_eq!(0, crud::count::<Trip>(&mut ex, &filters).await.unwrap());
}

pub(super) async fn test_ratings_one_per_trip(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let rider = put_user(&mut ex, 1, Role::Rider).await;
    let zone = put_zone(&mut ex, "Jakarta").await;
    let driver = put_online_driver(&mut ex, 2, None).await;
    let trip1 = put_trip(&mut ex, rider.id, zone.id).await;
    let trip2 = put_trip(&mut ex, rider.id, zone.id).await;

    let score = Score::new(5).unwrap();
    create_rating(&mut ex, trip1.id, rider.id, driver.id, score, Some("Great".to_owned()))
        .await
        .unwrap();
    let err = create_rating(&mut ex, trip1.id, rider.id, driver.id, score, None).await.unwrap_err();
    assert_eq!(DbError::AlreadyExists, err);

    create_rating(&mut ex, trip2.id, rider.id, driver.id, Score::new(2).unwrap(), None)
        .await
        .unwrap();
    recompute_rating(&mut ex, driver.id).await.unwrap();
    let fetched = crud::get::<Driver>(&mut ex, driver.id.as_i64()).await.unwrap();
    assert_eq!(Some(3.5), fetched.rating);
    assert_eq!(2, fetched.rating_count);
}

pub(super) async fn test_payments_completed_check(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let rider = put_user(&mut ex, 1, Role::Rider).await;
    let zone = put_zone(&mut ex, "Jakarta").await;
    let trip = put_trip(&mut ex, rider.id, zone.id).await;

    let failed = create_payment(
        &mut ex,
        trip.id,
        1750,
        PaymentMethod::Wallet,
        PaymentStatus::Failed,
        SOME_TIME,
    )
    .await
    .unwrap();
    assert_eq!(failed, crud::get::<Payment>(&mut ex, failed.id.as_i64()).await.unwrap());
    assert!(!has_completed_payment(&mut ex, trip.id).await.unwrap());

    create_payment(&mut ex, trip.id, 1750, PaymentMethod::Cash, PaymentStatus::Completed, SOME_TIME)
        .await
        .unwrap();
    assert!(has_completed_payment(&mut ex, trip.id).await.unwrap());

    let err = create_payment(
        &mut ex,
        TripId::new(4444),
        1,
        PaymentMethod::Cash,
        PaymentStatus::Completed,
        SOME_TIME,
    )
    .await
    .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}

pub(super) async fn test_wallets_balance_operations(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    let wallet = create_wallet(&mut ex, OwnerKind::User, 7).await.unwrap();
    assert_eq!(0, wallet.balance_cents);
    assert_eq!(wallet, get_wallet(&mut ex, OwnerKind::User, 7).await.unwrap());
    assert_eq!(
        DbError::AlreadyExists,
        create_wallet(&mut ex, OwnerKind::User, 7).await.unwrap_err()
    );

    assert_eq!(1000, top_up(&mut ex, OwnerKind::User, 7, 1000).await.unwrap().balance_cents);
    assert_eq!(1500, top_up(&mut ex, OwnerKind::User, 7, 500).await.unwrap().balance_cents);

    // Topping up an unknown owner creates its wallet.
    let created = top_up(&mut ex, OwnerKind::Driver, 7, 300).await.unwrap();
    assert_eq!(300, created.balance_cents);
    assert_ne!(wallet.id, created.id);

    assert!(!debit_if_sufficient(&mut ex, OwnerKind::User, 7, 1501).await.unwrap());
    assert!(debit_if_sufficient(&mut ex, OwnerKind::User, 7, 1500).await.unwrap());
    assert_eq!(0, get_wallet(&mut ex, OwnerKind::User, 7).await.unwrap().balance_cents);
    assert!(!debit_if_sufficient(&mut ex, OwnerKind::Platform, 0, 1).await.unwrap());

    credit(&mut ex, OwnerKind::User, 7, 25).await.unwrap();
    assert_eq!(25, get_wallet(&mut ex, OwnerKind::User, 7).await.unwrap().balance_cents);
    assert_eq!(DbError::NotFound, credit(&mut ex, OwnerKind::Platform, 0, 1).await.unwrap_err());
    assert_eq!(
        DbError::NotFound,
        get_wallet(&mut ex, OwnerKind::Platform, 0).await.unwrap_err()
    );
}

pub(super) async fn test_otps_lifecycle(db: TestDb) {
    let mut ex = db.ex().await.unwrap();
    let phone = PhoneNumber::new("+628120000001").unwrap();
    let other = PhoneNumber::new("+628120000002").unwrap();
    let t0 = datetime!(2024-05-01 10:00:00 UTC);
    let ttl = Duration::from_secs(300);

    assert_eq!(None, get_latest_unconsumed_otp(&mut ex, &phone).await.unwrap());

    let first = create_otp(&mut ex, phone.clone(), OtpCode::new("111111").unwrap(), t0, t0 + ttl)
        .await
        .unwrap();
    let t1 = t0 + Duration::from_secs(10);
    let second =
        create_otp(&mut ex, phone.clone(), OtpCode::new("222222").unwrap(), t1, t1 + ttl)
            .await
            .unwrap();
    create_otp(&mut ex, other.clone(), OtpCode::new("333333").unwrap(), t1, t1 + ttl)
        .await
        .unwrap();

    assert_eq!(2, count_otps_since(&mut ex, &phone, t0).await.unwrap());
    assert_eq!(1, count_otps_since(&mut ex, &phone, t0 + Duration::from_secs(1)).await.unwrap());
    assert_eq!(0, count_otps_since(&mut ex, &phone, t1 + Duration::from_secs(1)).await.unwrap());

    assert_eq!(Some(second.clone()), get_latest_unconsumed_otp(&mut ex, &phone).await.unwrap());

    increment_otp_attempts(&mut ex, second.id).await.unwrap();
    increment_otp_attempts(&mut ex, second.id).await.unwrap();
    let latest = get_latest_unconsumed_otp(&mut ex, &phone).await.unwrap().unwrap();
    assert_eq!(2, latest.attempts);

    consume_otp(&mut ex, second.id).await.unwrap();
    assert_eq!(DbError::NotFound, consume_otp(&mut ex, second.id).await.unwrap_err());
    assert_eq!(Some(first), get_latest_unconsumed_otp(&mut ex, &phone).await.unwrap());
}

pub(super) async fn test_admin_logs_and_stats(db: TestDb) {
    let mut ex = db.ex().await.unwrap();

    assert_eq!(Stats::default(), get_stats(&mut ex).await.unwrap());

    let admin = put_user(&mut ex, 1, Role::Admin).await;
    let rider = put_user(&mut ex, 2, Role::Rider).await;
    let zone = put_zone(&mut ex, "Jakarta").await;
    let driver = put_online_driver(&mut ex, 3, None).await;
    put_online_driver(&mut ex, 4, None).await;
    set_driver_status(&mut ex, driver.id, DriverStatus::Offline).await.unwrap();
    let done = put_trip(&mut ex, rider.id, zone.id).await;
    for (from, to) in [
        (TripStatus::Requested, TripStatus::Accepted),
        (TripStatus::Accepted, TripStatus::InProgress),
        (TripStatus::InProgress, TripStatus::Completed),
    ] {
        assert!(update_trip_status(&mut ex, done.id, from, to, None, SOME_TIME).await.unwrap());
    }
    let cancelled = put_trip(&mut ex, rider.id, zone.id).await;
    update_trip_status(
        &mut ex,
        cancelled.id,
        TripStatus::Requested,
        TripStatus::Cancelled,
        None,
        SOME_TIME,
    )
    .await
    .unwrap();
    put_trip(&mut ex, rider.id, zone.id).await;
    create_payment(&mut ex, done.id, 1750, PaymentMethod::Cash, PaymentStatus::Completed, SOME_TIME)
        .await
        .unwrap();
    create_payment(&mut ex, done.id, 999, PaymentMethod::Card, PaymentStatus::Pending, SOME_TIME)
        .await
        .unwrap();

    let exp_stats = Stats {
        users: 4,
        drivers: 2,
        online_drivers: 1,
        trips: 3,
        completed_trips: 1,
        cancelled_trips: 1,
        revenue_cents: 1750,
    };
    assert_eq!(exp_stats, get_stats(&mut ex).await.unwrap());

    let log1 = create_admin_log(&mut ex, admin.id, "zone_create", "zone", Some(1), None, SOME_TIME)
        .await
        .unwrap();
    let log2 = create_admin_log(
        &mut ex,
        admin.id,
        "kyc_review",
        "driver",
        Some(driver.id.as_i64()),
        Some("approved".to_owned()),
        SOME_TIME,
    )
    .await
    .unwrap();
    let logs = crud::list::<AdminLog>(&mut ex, &[], PageRequest::default()).await.unwrap();
    assert_eq!(vec![log2, log1], logs.items);

    let err = create_admin_log(&mut ex, unknown_user_id(), "x", "y", None, None, SOME_TIME)
        .await
        .unwrap_err();
    assert_eq!(DbError::NotFound, err);
}

macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta] )? ) => {
        anta_core::db::testutils::generate_tests!(
            $(#[$extra],)?
            $setup,
            $crate::db::tests,
            test_users_create_get_update,
            test_users_phone_is_unique,
            test_users_set_phone_verified,
            test_users_references_and_delete,
            test_crud_list_filters_and_pages,
            test_drivers_lifecycle,
            test_drivers_unknown_user,
            test_drivers_location_history,
            test_drivers_nearby,
            test_drivers_documents,
            test_vehicles_plate_is_unique,
            test_zones_name_is_unique,
            test_promos_redeem,
            test_trips_status_transitions,
            test_ratings_one_per_trip,
            test_payments_completed_check,
            test_wallets_balance_operations,
            test_otps_lifecycle,
            test_admin_logs_and_stats
        );
    }
];

use generate_db_tests;

mod sqlite {
    use super::*;
    use crate::db::testutils::setup_sqlite;

    generate_db_tests!(setup_sqlite().await);
}

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use crate::db::testutils::setup_postgres;

    generate_db_tests!(
        setup_postgres().await,
        #[ignore = "Requires environment configuration and is expensive"]
    );
}
