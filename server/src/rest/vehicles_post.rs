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

//! API to register a vehicle.

use crate::driver::AntaDriver;
use crate::model::{DriverId, Plate, Vehicle, VehicleSpec};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to register a vehicle.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreateVehicleRequest {
    /// The driver that operates the vehicle.
    pub(crate) driver_id: DriverId,

    /// License plate.
    pub(crate) plate: Plate,

    /// Descriptive attributes.
    #[serde(flatten)]
    pub(crate) spec: VehicleSpec,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<CreateVehicleRequest>,
) -> RestResult<ApiResponse<Vehicle>> {
    let vehicle = driver.create_vehicle(request.driver_id, request.plate, request.spec).await?;
    Ok(ApiResponse::created(vehicle))
}
