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

//! API to update a user.

use crate::driver::{AntaDriver, UserUpdate};
use crate::model::{FullName, Role, User, UserId, UserStatus};
use anta_core::model::EmailAddress;
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to update a user.  Missing fields are left untouched.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct UpdateUserRequest {
    /// New name of the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) full_name: Option<FullName>,

    /// New contact email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<EmailAddress>,

    /// New role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) role: Option<Role>,

    /// New account status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<UserStatus>,
}

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<UserId>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> RestResult<ApiResponse<User>> {
    let update = UserUpdate {
        full_name: request.full_name,
        email: request.email,
        role: request.role,
        status: request.status,
    };
    let user = driver.update_user(id, update).await?;
    Ok(ApiResponse::ok(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route(id: UserId) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/users/{}", id))
    }

    #[tokio::test]
    async fn test_partial_update() {
        let context = TestContext::setup().await;
        let user = context.backend.put_user(1, Role::Rider).await;

        let request = UpdateUserRequest {
            full_name: Some(FullName::new("Budi Santoso").unwrap()),
            status: Some(UserStatus::Suspended),
            ..Default::default()
        };
        let response = OneShotBuilder::new(context.app(), route(user.id))
            .send_json(request)
            .await
            .expect_data::<User>()
            .await;
        assert_eq!("Budi Santoso", response.full_name.as_str());
        assert_eq!(UserStatus::Suspended, response.status);
        assert_eq!(user.phone, response.phone);
        assert_eq!(user.role, response.role);

        assert_eq!(response, context.backend.driver().get_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(UserId::new(7)))
            .send_json(UpdateUserRequest::default())
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "User 7 not found")
            .await;
    }

    #[tokio::test]
    async fn test_bad_status() {
        let context = TestContext::setup().await;
        let user = context.backend.put_user(1, Role::Rider).await;

        OneShotBuilder::new(context.app(), route(user.id))
            .send_json(serde_json::json!({"status": "sleeping"}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Invalid user status")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route(UserId::new(1)));
}
