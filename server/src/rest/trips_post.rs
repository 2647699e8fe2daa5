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

//! API to request a trip.

use crate::driver::AntaDriver;
use crate::model::{PromoCodeName, Trip, UserId, ZoneId};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use anta_geo::Coordinates;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to request a trip.
#[derive(Deserialize, Serialize)]
pub(crate) struct TripRequest {
    /// The user asking for the ride.
    pub(crate) rider_id: UserId,

    /// The zone whose rates price the trip.
    pub(crate) zone_id: ZoneId,

    /// Pickup point.
    pub(crate) origin: Coordinates,

    /// Drop-off point.
    pub(crate) destination: Coordinates,

    /// Promo code to redeem on the fare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) promo_code: Option<PromoCodeName>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<TripRequest>,
) -> RestResult<ApiResponse<Trip>> {
    let trip = driver
        .request_trip(
            request.rider_id,
            request.zone_id,
            request.origin,
            request.destination,
            request.promo_code,
        )
        .await?;
    Ok(ApiResponse::created(trip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::model::{PromoKind, Role, TripStatus};
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use anta_geo::{MockMapsClient, Route};
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/trips".to_owned())
    }

    fn monas() -> Coordinates {
        point(-6.1754, 106.8272)
    }

    fn bundaran_hi() -> Coordinates {
        point(-6.1950, 106.8230)
    }

    /// Sets up a context whose mapping service knows a 2.5 km, 7 minute route between the test
    /// points.
    async fn setup() -> TestContext {
        let route = Route {
            distance_meters: 2500,
            duration_seconds: 420,
            polyline: "abc".to_owned(),
            summary: "Jl. M.H. Thamrin".to_owned(),
            start_address: "Monas".to_owned(),
            end_address: "Bundaran HI".to_owned(),
        };
        TestContext::setup_with(MockMapsClient::new().with_route(monas(), bundaran_hi(), route))
            .await
    }

    #[tokio::test]
    async fn test_ok() {
        let context = setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;

        let request = TripRequest {
            rider_id: rider.id,
            zone_id: zone.id,
            origin: monas(),
            destination: bundaran_hi(),
            promo_code: None,
        };
        let trip = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Trip>()
            .await;
        assert_eq!(rider.id, trip.rider_id);
        assert_eq!(TripStatus::Requested, trip.status);
        assert_eq!(2500, trip.distance_meters);
        assert_eq!(1600, trip.fare_cents);
        assert_eq!(0, trip.discount_cents);
    }

    #[tokio::test]
    async fn test_with_promo() {
        let context = setup().await;
        let admin_id = context.backend.put_admin(1).await;
        let rider = context.backend.put_user(2, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let code = PromoCodeName::new("HEMAT").unwrap();
        context
            .backend
            .driver()
            .create_promo(admin_id, code.clone(), PromoKind::Flat, 1000, Some(1), None)
            .await
            .unwrap();

        let request = TripRequest {
            rider_id: rider.id,
            zone_id: zone.id,
            origin: monas(),
            destination: bundaran_hi(),
            promo_code: Some(code.clone()),
        };
        let trip = OneShotBuilder::new(context.app(), route())
            .send_json(&request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Trip>()
            .await;
        assert_eq!(1000, trip.discount_cents);
        assert_eq!(Some(code), trip.promo_code);

        OneShotBuilder::new(context.app(), route())
            .send_json(&request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "HEMAT")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let context = setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;

        let request = TripRequest {
            rider_id: rider.id,
            zone_id: zone.id,
            origin: monas(),
            destination: bundaran_hi(),
            promo_code: Some(PromoCodeName::new("NOPE").unwrap()),
        };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "Promo code NOPE not found")
            .await;

        let request = TripRequest {
            rider_id: rider.id,
            zone_id: ZoneId::new(55),
            origin: monas(),
            destination: bundaran_hi(),
            promo_code: None,
        };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "Zone 55 not found")
            .await;
    }

    #[tokio::test]
    async fn test_bad_coordinates() {
        let context = setup().await;

        let request = serde_json::json!({
            "rider_id": 1,
            "zone_id": 1,
            "origin": {"latitude": -100.0, "longitude": 106.8},
            "destination": {"latitude": -6.2, "longitude": 106.8}
        });
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Latitude -100 must be between")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
