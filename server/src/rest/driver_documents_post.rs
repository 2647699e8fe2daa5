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

//! API to submit a KYC document for a driver.

use crate::driver::AntaDriver;
use crate::model::{DocumentKind, DriverId, KycDocument};
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to submit a document.
#[derive(Deserialize, Serialize)]
pub(crate) struct DocumentRequest {
    /// What the document proves.
    pub(crate) kind: DocumentKind,

    /// Where the document's file is stored.
    pub(crate) url: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams(id): PathParams<DriverId>,
    JsonBody(request): JsonBody<DocumentRequest>,
) -> RestResult<ApiResponse<KycDocument>> {
    let document = driver.submit_document(id, request.kind, request.url).await?;
    Ok(ApiResponse::created(document))
}
