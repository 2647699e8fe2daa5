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

//! API to report the current position of a driver.

use crate::driver::AntaDriver;
use crate::model::{DriverId, DriverLocation};
use crate::rest::httputils::coordinates;
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to report a position.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct LocationRequest {
    /// Latitude in degrees.
    pub(crate) latitude: f64,

    /// Longitude in degrees.
    pub(crate) longitude: f64,

    /// Direction of travel in degrees from north.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) heading: Option<f64>,

    /// Speed in km/h.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) speed_kmh: Option<f64>,
}

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    JsonBody(request): JsonBody<LocationRequest>,
) -> RestResult<ApiResponse<DriverLocation>> {
    let position = coordinates(request.latitude, request.longitude)?;
    let location =
        driver.update_driver_location(id, position, request.heading, request.speed_kmh).await?;
    Ok(ApiResponse::ok(location))
}
