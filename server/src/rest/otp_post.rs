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

//! API to request a one-time password for a phone.

use crate::driver::AntaDriver;
use anta_core::model::PhoneNumber;
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message sent to the server to request a code.
#[derive(Deserialize, Serialize)]
pub(crate) struct OtpRequest {
    /// Phone that should receive the code.
    pub(crate) phone: PhoneNumber,
}

/// Message returned by the server after issuing a code.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct OtpResponse {
    /// When the issued code stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) expires_at: OffsetDateTime,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<OtpRequest>,
) -> RestResult<ApiResponse<OtpResponse>> {
    let expires_at = driver.issue_otp(request.phone).await?;
    Ok(ApiResponse::created(OtpResponse { expires_at }))
}
