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

//! API to move a trip through its lifecycle.

use crate::driver::AntaDriver;
use crate::model::{DriverId, Trip, TripId, TripStatus};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to change the status of a trip.
#[derive(Deserialize, Serialize)]
pub(crate) struct TripStatusRequest {
    /// The new status.
    pub(crate) status: TripStatus,

    /// The driver taking the trip.  Required when accepting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) driver_id: Option<DriverId>,
}

/// PATCH handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<TripId>,
    JsonBody(request): JsonBody<TripStatusRequest>,
) -> RestResult<ApiResponse<Trip>> {
    let trip = driver.update_trip_status(id, request.status, request.driver_id).await?;
    Ok(ApiResponse::ok(trip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::model::{Driver, DriverStatus, Role};
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route(id: TripId) -> (http::Method, String) {
        (http::Method::PATCH, format!("/api/trips/{}/status", id))
    }

    async fn driver_status(context: &TestContext, id: DriverId) -> DriverStatus {
        OneShotBuilder::new(context.app(), (http::Method::GET, format!("/api/drivers/{}", id)))
            .send_empty()
            .await
            .expect_data::<Driver>()
            .await
            .status
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let profile = context.backend.put_driver(2, Some(point(-6.2, 106.8))).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        let request =
            TripStatusRequest { status: TripStatus::Accepted, driver_id: Some(profile.id) };
        let response = OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(request)
            .await
            .expect_data::<Trip>()
            .await;
        assert_eq!(TripStatus::Accepted, response.status);
        assert_eq!(Some(profile.id), response.driver_id);
        assert_eq!(DriverStatus::Busy, driver_status(&context, profile.id).await);

        for status in [TripStatus::InProgress, TripStatus::Completed] {
            let response = OneShotBuilder::new(context.app(), route(trip.id))
                .send_json(TripStatusRequest { status, driver_id: None })
                .await
                .expect_data::<Trip>()
                .await;
            assert_eq!(status, response.status);
            assert_eq!(Some(profile.id), response.driver_id);
        }
        assert_eq!(DriverStatus::Online, driver_status(&context, profile.id).await);
    }

    #[tokio::test]
    async fn test_invalid_transition() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(TripStatusRequest { status: TripStatus::Completed, driver_id: None })
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "cannot go from requested to completed")
            .await;
    }

    #[tokio::test]
    async fn test_accept_requirements() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let offline = context.backend.put_driver(2, None).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(TripStatusRequest { status: TripStatus::Accepted, driver_id: None })
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "driver is required")
            .await;

        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(TripStatusRequest {
                status: TripStatus::Accepted,
                driver_id: Some(offline.id),
            })
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "is not available")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(TripId::new(1)));
}
