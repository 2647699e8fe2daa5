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

//! API to delete a driver.

use crate::driver::AntaDriver;
use crate::model::DriverId;
use crate::rest::httputils::AdminQuery;
use anta_core::rest::{ApiResponse, EmptyBody, PathParams, QueryParams, RestResult};
use axum::extract::State;

/// DELETE handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    QueryParams(query): QueryParams<AdminQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<()>> {
    driver.delete_driver(id, query.admin_id).await?;
    Ok(ApiResponse::empty())
}
