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

//! API to resolve an address into places.

use crate::driver::AntaDriver;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use anta_geo::GeocodedPlace;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Deserialize, Serialize)]
pub(crate) struct GeocodeQuery {
    /// Free-form address to look up.
    pub(crate) address: String,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<GeocodeQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<GeocodedPlace>>> {
    let places = driver.geocode(query.address).await?;
    Ok(ApiResponse::ok(places))
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
        (http::Method::GET, "/api/geocoding".to_owned())
    }

    fn query(address: &str) -> GeocodeQuery {
        GeocodeQuery { address: address.to_owned() }
    }

    #[tokio::test]
    async fn test_ok() {
        let place = GeocodedPlace {
            formatted_address: "Jl. M.H. Thamrin No.1, Jakarta".to_owned(),
            place_id: "thamrin-1".to_owned(),
            location: point(-6.1950, 106.8230),
        };
        let maps = MockMapsClient::new().with_places("thamrin 1", vec![place.clone()]);
        let context = TestContext::setup_with(maps).await;

        let places = OneShotBuilder::new(context.app(), route())
            .with_query(query("thamrin 1"))
            .send_empty()
            .await
            .expect_data::<Vec<GeocodedPlace>>()
            .await;
        assert_eq!(vec![place], places);

        let places = OneShotBuilder::new(context.app(), route())
            .with_query(query("atlantis"))
            .send_empty()
            .await
            .expect_data::<Vec<GeocodedPlace>>()
            .await;
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_errors() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query(query(" "))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Address cannot be empty")
            .await;

        OneShotBuilder::new(context.app(), route())
            .with_query(query(MockMapsClient::RETURN_ERROR))
            .send_empty()
            .await
            .expect_status(http::StatusCode::INTERNAL_SERVER_ERROR)
            .expect_error("INTERNAL_ERROR", "Mapping service failure")
            .await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "address")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(), query("x"));
}
