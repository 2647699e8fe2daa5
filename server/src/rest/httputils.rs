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

//! Helpers shared by the REST handlers.

use crate::model::{OwnerKind, UserId, WalletOwner};
use anta_core::model::PageRequest;
use anta_core::rest::{RestError, RestResult};
use anta_geo::Coordinates;
use serde::{Deserialize, Serialize};

/// Query parameters of APIs that only take pagination.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct PageQuery {
    /// 1-based page number.
    pub(crate) page: Option<u32>,

    /// Maximum number of items per page.
    pub(crate) limit: Option<u32>,
}

impl PageQuery {
    /// Validates the pagination parameters.
    pub(crate) fn into_request(self) -> RestResult<PageRequest> {
        page_request(self.page, self.limit)
    }
}

/// Query parameters of APIs that act on behalf of an admin and have no body.
#[derive(Deserialize, Serialize)]
pub(crate) struct AdminQuery {
    /// The admin performing the operation.
    pub(crate) admin_id: UserId,
}

/// Validates the pagination parameters of a request.
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>) -> RestResult<PageRequest> {
    Ok(PageRequest::new(page, limit)?)
}

/// Builds coordinates out of query parameters.
pub(crate) fn coordinates(latitude: f64, longitude: f64) -> RestResult<Coordinates> {
    Coordinates::new(latitude, longitude).map_err(|e| RestError::InvalidRequest(e.to_string()))
}

/// Builds a wallet owner out of path parameters.
pub(crate) fn wallet_owner(kind: OwnerKind, id: i64) -> RestResult<WalletOwner> {
    Ok(WalletOwner::new(kind, id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request() {
        assert_eq!(PageRequest::default(), PageQuery::default().into_request().unwrap());
        assert_eq!(3, page_request(Some(3), Some(5)).unwrap().page());
        match page_request(Some(1), Some(101)) {
            Err(RestError::InvalidRequest(msg)) => assert!(msg.contains("limit")),
            e => panic!("{:?}", e.err()),
        }
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(Coordinates::new(1.0, 2.0).unwrap(), coordinates(1.0, 2.0).unwrap());
        match coordinates(91.0, 0.0) {
            Err(RestError::InvalidRequest(msg)) => assert!(msg.contains("Latitude")),
            e => panic!("{:?}", e.err()),
        }
    }

    #[test]
    fn test_wallet_owner() {
        assert_eq!(WalletOwner::platform(), wallet_owner(OwnerKind::Platform, 0).unwrap());
        assert!(wallet_owner(OwnerKind::User, 0).is_err());
    }
}
