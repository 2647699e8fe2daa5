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

//! API to register the driver profile of a user.

use crate::driver::AntaDriver;
use crate::model::{Driver, LicenseNumber, UserId};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to register a driver.
#[derive(Deserialize, Serialize)]
pub(crate) struct RegisterDriverRequest {
    /// The user that will drive.
    pub(crate) user_id: UserId,

    /// Driving license number.
    pub(crate) license_number: LicenseNumber,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<RegisterDriverRequest>,
) -> RestResult<ApiResponse<Driver>> {
    let profile = driver.register_driver(request.user_id, request.license_number).await?;
    Ok(ApiResponse::created(profile))
}
