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

//! API to list drivers.

use crate::driver::AntaDriver;
use crate::model::{Driver, DriverStatus};
use crate::rest::httputils::page_request;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct DriversQuery {
    /// Only return drivers in this status.
    pub(crate) status: Option<DriverStatus>,

    /// 1-based page number.
    pub(crate) page: Option<u32>,

    /// Maximum number of drivers per page.
    pub(crate) limit: Option<u32>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<DriversQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<Driver>>> {
    let page = page_request(query.page, query.limit)?;
    let drivers = driver.list_drivers(query.status, page).await?;
    Ok(ApiResponse::page(drivers))
}
