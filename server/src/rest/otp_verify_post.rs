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

//! API to verify a phone with a one-time password.

use crate::driver::AntaDriver;
use crate::model::OtpCode;
use anta_core::model::PhoneNumber;
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to verify a code.
#[derive(Deserialize, Serialize)]
pub(crate) struct VerifyOtpRequest {
    /// Phone that received the code.
    pub(crate) phone: PhoneNumber,

    /// The code as typed by the user.
    pub(crate) code: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<VerifyOtpRequest>,
) -> RestResult<ApiResponse<()>> {
    let code = OtpCode::new(request.code)?;
    driver.verify_otp(request.phone, code).await?;
    Ok(ApiResponse::empty())
}
