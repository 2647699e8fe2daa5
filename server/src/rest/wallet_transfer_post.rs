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

//! API to move funds between two wallets.

use crate::driver::AntaDriver;
use crate::model::OwnerKind;
use crate::rest::httputils::wallet_owner;
use anta_core::rest::{ApiResponse, JsonBody, RestError, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to transfer funds.
#[derive(Deserialize, Serialize)]
pub(crate) struct TransferRequest {
    /// Kind of the owner of the source wallet.
    pub(crate) from_kind: OwnerKind,

    /// Identifier of the owner of the source wallet.
    pub(crate) from_id: i64,

    /// Kind of the owner of the destination wallet.
    pub(crate) to_kind: OwnerKind,

    /// Identifier of the owner of the destination wallet.
    pub(crate) to_id: i64,

    /// Amount to move.
    pub(crate) amount_cents: i64,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<TransferRequest>,
) -> RestResult<ApiResponse<()>> {
    let from = wallet_owner(request.from_kind, request.from_id)?;
    let to = wallet_owner(request.to_kind, request.to_id)?;
    if !driver.transfer(from, to, request.amount_cents).await? {
        return Err(RestError::Conflict(format!("Insufficient funds in the wallet of {}", from)));
    }
    Ok(ApiResponse::empty())
}
