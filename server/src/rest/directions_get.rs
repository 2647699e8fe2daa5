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

//! API to compute a driving route between two points.

use crate::driver::AntaDriver;
use crate::rest::httputils::coordinates;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use anta_geo::Route;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Deserialize, Serialize)]
pub(crate) struct DirectionsQuery {
    /// Latitude of the starting point.
    pub(crate) origin_lat: f64,

    /// Longitude of the starting point.
    pub(crate) origin_lng: f64,

    /// Latitude of the end point.
    pub(crate) dest_lat: f64,

    /// Longitude of the end point.
    pub(crate) dest_lng: f64,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<DirectionsQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Route>> {
    let origin = coordinates(query.origin_lat, query.origin_lng)?;
    let destination = coordinates(query.dest_lat, query.dest_lng)?;
    let route = driver.directions(origin, destination).await?;
    Ok(ApiResponse::ok(route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_empty};
    use anta_geo::MockMapsClient;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/directions".to_owned())
    }

    fn query() -> DirectionsQuery {
        DirectionsQuery {
            origin_lat: -6.1754,
            origin_lng: 106.8272,
            dest_lat: -6.1950,
            dest_lng: 106.8230,
        }
    }

    #[tokio::test]
    async fn test_ok() {
        let exp_route = Route {
            distance_meters: 2500,
            duration_seconds: 420,
            polyline: "abc".to_owned(),
            summary: "Jl. M.H. Thamrin".to_owned(),
            start_address: "Monas".to_owned(),
            end_address: "Bundaran HI".to_owned(),
        };
        let maps = MockMapsClient::new().with_route(
            point(-6.1754, 106.8272),
            point(-6.1950, 106.8230),
            exp_route.clone(),
        );
        let context = TestContext::setup_with(maps).await;

        let route = OneShotBuilder::new(context.app(), route())
            .with_query(query())
            .send_empty()
            .await
            .expect_data::<Route>()
            .await;
        assert_eq!(exp_route, route);
    }

    #[tokio::test]
    async fn test_no_route() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query(query())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "No route found")
            .await;
    }

    #[tokio::test]
    async fn test_service_down() {
        let context = TestContext::setup_with(MockMapsClient::new().unavailable()).await;

        OneShotBuilder::new(context.app(), route())
            .with_query(query())
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("INTERNAL_ERROR", "Mapping service failure")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(), query());
}
