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

//! API to pay for a completed trip.

use crate::driver::AntaDriver;
use crate::model::{Payment, PaymentMethod, TripId};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to pay for a trip.
#[derive(Deserialize, Serialize)]
pub(crate) struct PaymentRequest {
    /// The trip to pay for.
    pub(crate) trip_id: TripId,

    /// How the rider pays.
    pub(crate) method: PaymentMethod,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<PaymentRequest>,
) -> RestResult<ApiResponse<Payment>> {
    let payment = driver.create_payment(request.trip_id, request.method).await?;
    Ok(ApiResponse::created(payment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::{driver_wallet, point, user_wallet};
    use crate::model::{PaymentStatus, Role, Trip};
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/payments".to_owned())
    }

    /// Creates a trip completed by a new driver and returns it.
    async fn put_completed_trip(context: &TestContext) -> Trip {
        let rider = context.backend.put_user(1, Role::Rider).await;
        let profile = context.backend.put_driver(2, Some(point(-6.2, 106.8))).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;
        context.backend.complete_trip(&trip, profile.id).await
    }

    #[tokio::test]
    async fn test_cash() {
        let context = TestContext::setup().await;
        let trip = put_completed_trip(&context).await;

        let request = PaymentRequest { trip_id: trip.id, method: PaymentMethod::Cash };
        let payment = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Payment>()
            .await;
        assert_eq!(trip.id, payment.trip_id);
        assert_eq!(trip.amount_due_cents(), payment.amount_cents);
        assert_eq!(PaymentStatus::Completed, payment.status);

        let request = PaymentRequest { trip_id: trip.id, method: PaymentMethod::Card };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "already been paid")
            .await;
    }

    #[tokio::test]
    async fn test_wallet() {
        let context = TestContext::setup().await;
        let trip = put_completed_trip(&context).await;
        let amount = trip.amount_due_cents();
        let driver_id = trip.driver_id.unwrap();

        let request = PaymentRequest { trip_id: trip.id, method: PaymentMethod::Wallet };
        let payment = OneShotBuilder::new(context.app(), route())
            .send_json(&request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Payment>()
            .await;
        assert_eq!(PaymentStatus::Failed, payment.status);

        context.backend.set_balance(user_wallet(trip.rider_id), amount + 10).await;
        let payment = OneShotBuilder::new(context.app(), route())
            .send_json(&request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Payment>()
            .await;
        assert_eq!(PaymentStatus::Completed, payment.status);
        assert_eq!(10, context.backend.balance(user_wallet(trip.rider_id)).await);
        assert_eq!(amount, context.backend.balance(driver_wallet(driver_id)).await);
    }

    #[tokio::test]
    async fn test_trip_not_completed() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        let request = PaymentRequest { trip_id: trip.id, method: PaymentMethod::Cash };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "has not been completed")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
