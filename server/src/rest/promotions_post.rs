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

//! API to create a promo code.

use crate::driver::AntaDriver;
use crate::model::{PromoCode, PromoCodeName, PromoKind, UserId};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message sent to the server to create a promo code.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreatePromoRequest {
    /// The admin creating the code.
    pub(crate) admin_id: UserId,

    /// The code riders will type in.
    pub(crate) code: PromoCodeName,

    /// How the discount is computed.
    pub(crate) kind: PromoKind,

    /// Percentage or amount in cents, depending on `kind`.
    pub(crate) value: i64,

    /// Maximum number of redemptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) max_uses: Option<i64>,

    /// When the code stops being redeemable.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub(crate) expires_at: Option<OffsetDateTime>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<CreatePromoRequest>,
) -> RestResult<ApiResponse<PromoCode>> {
    let promo = driver
        .create_promo(
            request.admin_id,
            request.code,
            request.kind,
            request.value,
            request.max_uses,
            request.expires_at,
        )
        .await?;
    Ok(ApiResponse::created(promo))
}
