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

//! API to create a pricing zone.

use crate::driver::AntaDriver;
use crate::model::{UserId, Zone, ZoneRates};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to create a zone.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreateZoneRequest {
    /// The admin creating the zone.
    pub(crate) admin_id: UserId,

    /// Name of the zone.
    pub(crate) name: String,

    /// Pricing configuration.
    #[serde(flatten)]
    pub(crate) rates: ZoneRates,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<CreateZoneRequest>,
) -> RestResult<ApiResponse<Zone>> {
    let zone = driver.create_zone(request.admin_id, request.name, request.rates).await?;
    Ok(ApiResponse::created(zone))
}
