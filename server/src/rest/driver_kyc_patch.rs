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

//! API to approve or reject the KYC submission of a driver.

use crate::driver::AntaDriver;
use crate::model::{Driver, DriverId, KycStatus, UserId};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to settle a KYC review.
#[derive(Deserialize, Serialize)]
pub(crate) struct KycReviewRequest {
    /// The admin performing the review.
    pub(crate) admin_id: UserId,

    /// Either `approved` or `rejected`.
    pub(crate) decision: KycStatus,
}

/// PATCH handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    JsonBody(request): JsonBody<KycReviewRequest>,
) -> RestResult<ApiResponse<Driver>> {
    let profile = driver.review_kyc(id, request.admin_id, request.decision).await?;
    Ok(ApiResponse::ok(profile))
}
