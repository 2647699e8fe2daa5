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

//! API to register a new user.

use crate::driver::AntaDriver;
use crate::model::{FullName, Role, User};
use anta_core::model::{EmailAddress, PhoneNumber};
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to register a user.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreateUserRequest {
    /// Phone number of the user, in international format.
    pub(crate) phone: PhoneNumber,

    /// Name of the user.
    pub(crate) full_name: FullName,

    /// Optional contact email address.
    #[serde(default)]
    pub(crate) email: Option<EmailAddress>,

    /// What the user does on the platform.  Defaults to `rider`.
    #[serde(default)]
    pub(crate) role: Option<Role>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> RestResult<ApiResponse<User>> {
    let role = request.role.unwrap_or(Role::Rider);
    let user = driver.create_user(request.phone, request.full_name, request.email, role).await?;
    Ok(ApiResponse::created(user))
}
