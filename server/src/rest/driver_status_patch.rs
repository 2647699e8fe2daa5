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

//! API to switch a driver between online and offline.

use crate::driver::AntaDriver;
use crate::model::{Driver, DriverId, DriverStatus};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to change the availability of a driver.
#[derive(Deserialize, Serialize)]
pub(crate) struct DriverStatusRequest {
    /// The new availability.
    pub(crate) status: DriverStatus,
}

/// PATCH handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    JsonBody(request): JsonBody<DriverStatusRequest>,
) -> RestResult<ApiResponse<Driver>> {
    let profile = driver.set_driver_status(id, request.status).await?;
    Ok(ApiResponse::ok(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::KycStatus;
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route(id: DriverId) -> (http::Method, String) {
        (http::Method::PATCH, format!("/api/drivers/{}/status", id))
    }

    #[tokio::test]
    async fn test_online_and_back() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        for status in [DriverStatus::Online, DriverStatus::Offline] {
            let response = OneShotBuilder::new(context.app(), route(profile.id))
                .send_json(DriverStatusRequest { status })
                .await
                .expect_data::<Driver>()
                .await;
            assert_eq!(status, response.status);
        }
    }

    #[tokio::test]
    async fn test_kyc_not_approved() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;
        db::set_kyc_status(&mut context.backend.ex().await, profile.id, KycStatus::Pending)
            .await
            .unwrap();

        OneShotBuilder::new(context.app(), route(profile.id))
            .send_json(DriverStatusRequest { status: DriverStatus::Online })
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("FORBIDDEN", "until KYC is approved")
            .await;
    }

    #[tokio::test]
    async fn test_reserved_statuses() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        for status in [DriverStatus::Busy, DriverStatus::Suspended] {
            OneShotBuilder::new(context.app(), route(profile.id))
                .send_json(DriverStatusRequest { status })
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_error("BAD_REQUEST", "only switch between online and offline")
                .await;
        }
    }

    #[tokio::test]
    async fn test_busy() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;
        db::set_driver_status(&mut context.backend.ex().await, profile.id, DriverStatus::Busy)
            .await
            .unwrap();

        OneShotBuilder::new(context.app(), route(profile.id))
            .send_json(DriverStatusRequest { status: DriverStatus::Offline })
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "is on a trip")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_status() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        OneShotBuilder::new(context.app(), route(profile.id))
            .send_json(serde_json::json!({"status": "sleeping"}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Invalid driver status 'sleeping'")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(DriverId::new(1)));
}
