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

//! API to get a driver.

use crate::driver::AntaDriver;
use crate::model::{Driver, DriverId};
use anta_core::rest::{ApiResponse, EmptyBody, PathParams, RestResult};
use axum::extract::State;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Driver>> {
    let profile = driver.get_driver(id).await?;
    Ok(ApiResponse::ok(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use axum::http;

    fn route(id: DriverId) -> (http::Method, String) {
        (http::Method::GET, format!("/api/drivers/{}", id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        let response = OneShotBuilder::new(context.app(), route(profile.id))
            .send_empty()
            .await
            .expect_data::<Driver>()
            .await;
        assert_eq!(profile, response);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route(DriverId::new(3)))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "Driver 3 not found")
            .await;
    }
}
