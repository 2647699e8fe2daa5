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

//! API to find online drivers close to a point.

use crate::driver::{AntaDriver, DEFAULT_NEARBY_LIMIT, DEFAULT_NEARBY_RADIUS_METERS};
use crate::model::NearbyDriver;
use crate::rest::httputils::coordinates;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Deserialize, Serialize)]
pub(crate) struct NearbyQuery {
    /// Latitude of the search center.
    pub(crate) lat: f64,

    /// Longitude of the search center.
    pub(crate) lng: f64,

    /// Search radius in meters.
    pub(crate) radius: Option<f64>,

    /// Maximum number of drivers to return.
    pub(crate) limit: Option<usize>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<NearbyQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<NearbyDriver>>> {
    let center = coordinates(query.lat, query.lng)?;
    let drivers = driver
        .nearby_drivers(
            center,
            query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_METERS),
            query.limit.unwrap_or(DEFAULT_NEARBY_LIMIT),
        )
        .await?;
    Ok(ApiResponse::ok(drivers))
}
