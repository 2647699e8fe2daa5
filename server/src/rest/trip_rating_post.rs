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

//! API to rate the driver of a completed trip.

use crate::driver::AntaDriver;
use crate::model::{Rating, Score, TripId, UserId};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to rate a trip.
#[derive(Deserialize, Serialize)]
pub(crate) struct RatingRequest {
    /// The user giving the rating, who must be the trip's rider.
    pub(crate) rater_id: UserId,

    /// Score from 1 to 5.
    pub(crate) score: Score,

    /// Free-form remarks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) comment: Option<String>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<TripId>,
    JsonBody(request): JsonBody<RatingRequest>,
) -> RestResult<ApiResponse<Rating>> {
    let rating = driver.rate_trip(id, request.rater_id, request.score, request.comment).await?;
    Ok(ApiResponse::created(rating))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::model::{Driver, Role, Trip};
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route(id: TripId) -> (http::Method, String) {
        (http::Method::POST, format!("/api/trips/{}/rating", id))
    }

    /// Creates a trip completed by a new driver and returns it.
    async fn put_completed_trip(context: &TestContext, rider_id: UserId) -> Trip {
        let profile = context.backend.put_driver(2, Some(point(-6.2, 106.8))).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider_id, zone.id).await;
        context.backend.complete_trip(&trip, profile.id).await
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let trip = put_completed_trip(&context, rider.id).await;

        let request = RatingRequest {
            rater_id: rider.id,
            score: Score::new(4).unwrap(),
            comment: Some("  Smooth ride ".to_owned()),
        };
        let rating = OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_data::<Rating>()
            .await;
        assert_eq!(trip.id, rating.trip_id);
        assert_eq!(Some("Smooth ride"), rating.comment.as_deref());

        let driver_id = trip.driver_id.unwrap();
        let profile = OneShotBuilder::new(
            context.app(),
            (http::Method::GET, format!("/api/drivers/{}", driver_id)),
        )
        .send_empty()
        .await
        .expect_data::<Driver>()
        .await;
        assert_eq!(Some(4.0), profile.rating);
        assert_eq!(1, profile.rating_count);
    }

    #[tokio::test]
    async fn test_only_once_and_only_rider() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let other = context.backend.put_user(3, Role::Rider).await;
        let trip = put_completed_trip(&context, rider.id).await;

        let score = Score::new(1).unwrap();
        let request = RatingRequest { rater_id: other.id, score, comment: None };
        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(request)
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("FORBIDDEN", "Only the rider")
            .await;

        for exp_status in [http::StatusCode::CREATED, http::StatusCode::CONFLICT] {
            let request =
                RatingRequest { rater_id: rider.id, score: Score::new(5).unwrap(), comment: None };
            let checker = OneShotBuilder::new(context.app(), route(trip.id))
                .send_json(request)
                .await
                .expect_status(exp_status);
            if exp_status == http::StatusCode::CREATED {
                checker.expect_data::<Rating>().await;
            } else {
                checker.expect_error("CONFLICT", "already been rated").await;
            }
        }
    }

    #[tokio::test]
    async fn test_bad_score() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let trip = put_completed_trip(&context, rider.id).await;

        let request = serde_json::json!({"rater_id": rider.id, "score": 6});
        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Score 6 must be between 1 and 5")
            .await;
    }

    #[tokio::test]
    async fn test_not_completed() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        let score = Score::new(5).unwrap();
        let request = RatingRequest { rater_id: rider.id, score, comment: None };
        OneShotBuilder::new(context.app(), route(trip.id))
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("CONFLICT", "has not been completed")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(TripId::new(1)));
}
