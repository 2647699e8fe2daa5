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

//! API to get a trip.

use crate::driver::AntaDriver;
use crate::model::{Trip, TripId};
use anta_core::rest::{ApiResponse, EmptyBody, PathParams, RestResult};
use axum::extract::State;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<TripId>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Trip>> {
    let trip = driver.get_trip(id).await?;
    Ok(ApiResponse::ok(trip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use axum::http;

    fn route(id: TripId) -> (http::Method, String) {
        (http::Method::GET, format!("/api/trips/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip = context.backend.put_trip(rider.id, zone.id).await;

        let response = OneShotBuilder::new(context.app(), route(trip.id))
            .send_empty()
            .await
            .expect_data::<Trip>()
            .await;
        assert_eq!(trip, response);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(TripId::new(12)))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "Trip 12 not found")
            .await;
    }
}
