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

//! API to resolve coordinates into addresses.

use crate::driver::AntaDriver;
use crate::rest::httputils::coordinates;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use anta_geo::GeocodedPlace;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Deserialize, Serialize)]
pub(crate) struct ReverseGeocodeQuery {
    /// Latitude of the point to look up.
    pub(crate) lat: f64,

    /// Longitude of the point to look up.
    pub(crate) lng: f64,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<ReverseGeocodeQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<GeocodedPlace>>> {
    let location = coordinates(query.lat, query.lng)?;
    let places = driver.reverse_geocode(location).await?;
    Ok(ApiResponse::ok(places))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use anta_geo::MockMapsClient;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/geocoding/reverse".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let location = point(-6.1754, 106.8272);
        let place = GeocodedPlace {
            formatted_address: "Monumen Nasional, Jakarta".to_owned(),
            place_id: "monas".to_owned(),
            location,
        };
        let maps = MockMapsClient::new().with_addresses(location, vec![place.clone()]);
        let context = TestContext::setup_with(maps).await;

        let places = OneShotBuilder::new(context.app(), route())
            .with_query(ReverseGeocodeQuery { lat: -6.1754, lng: 106.8272 })
            .send_empty()
            .await
            .expect_data::<Vec<GeocodedPlace>>()
            .await;
        assert_eq!(vec![place], places);
    }

    #[tokio::test]
    async fn test_bad_coordinates() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query(ReverseGeocodeQuery { lat: 0.0, lng: -200.0 })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Longitude -200 must be between")
            .await;
    }
}
