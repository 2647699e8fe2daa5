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

//! API to deactivate a promo code.

use crate::driver::AntaDriver;
use crate::model::{PromoCode, PromoCodeName, UserId};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to deactivate a promo code.
#[derive(Deserialize, Serialize)]
pub(crate) struct DeactivateRequest {
    /// The admin deactivating the code.
    pub(crate) admin_id: UserId,
}

/// PATCH handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(code): PathParams<PromoCodeName>,
    JsonBody(request): JsonBody<DeactivateRequest>,
) -> RestResult<ApiResponse<PromoCode>> {
    let promo = driver.deactivate_promo(code, request.admin_id).await?;
    Ok(ApiResponse::ok(promo))
}
