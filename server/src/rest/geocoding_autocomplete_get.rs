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

//! API to suggest places while typing an address.

use crate::driver::AntaDriver;
use crate::rest::httputils::coordinates;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestError, RestResult};
use anta_geo::PlaceSuggestion;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct AutocompleteQuery {
    /// Partial text typed by the user.
    pub(crate) input: String,

    /// Latitude of the point to bias results towards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lat: Option<f64>,

    /// Longitude of the point to bias results towards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lng: Option<f64>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<AutocompleteQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<PlaceSuggestion>>> {
    let near = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => Some(coordinates(lat, lng)?),
        (None, None) => None,
        _ => {
            return Err(RestError::InvalidRequest(
                "lat and lng must be given together".to_owned(),
            ));
        }
    };
    let suggestions = driver.autocomplete(query.input, near).await?;
    Ok(ApiResponse::ok(suggestions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use anta_geo::MockMapsClient;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/geocoding/autocomplete".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let suggestion = PlaceSuggestion {
            description: "Monas, Jakarta".to_owned(),
            place_id: "monas".to_owned(),
        };
        let maps = MockMapsClient::new().with_suggestions("mon", vec![suggestion.clone()]);
        let context = TestContext::setup_with(maps).await;

        for (lat, lng) in [(None, None), (Some(-6.2), Some(106.8))] {
            let suggestions = OneShotBuilder::new(context.app(), route())
                .with_query(AutocompleteQuery { input: "mon".to_owned(), lat, lng })
                .send_empty()
                .await
                .expect_data::<Vec<PlaceSuggestion>>()
                .await;
            assert_eq!(vec![suggestion.clone()], suggestions);
        }
    }

    #[tokio::test]
    async fn test_bad_input() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query(AutocompleteQuery { input: "mon".to_owned(), lat: Some(1.0), lng: None })
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "lat and lng must be given together")
            .await;

        OneShotBuilder::new(context.app(), route())
            .with_query(AutocompleteQuery::default())
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Input cannot be empty")
            .await;
    }
}
