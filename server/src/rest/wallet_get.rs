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

//! API to get the wallet of a user, a driver or the platform.

use crate::driver::AntaDriver;
use crate::model::{OwnerKind, Wallet};
use crate::rest::httputils::wallet_owner;
use anta_core::rest::{ApiResponse, EmptyBody, PathParams, RestResult};
use axum::extract::State;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams((kind, id)): PathParams<(OwnerKind, i64)>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Wallet>> {
    let wallet = driver.get_wallet(wallet_owner(kind, id)?).await?;
    Ok(ApiResponse::ok(wallet))
}
