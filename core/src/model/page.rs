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

//! Pagination of list queries.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page size a client may ask for.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated request for one page of results.  Pages are 1-based.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRequest {
    /// Number of the page to return, starting at 1.
    page: u32,

    /// Maximum number of items in the page.
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_LIMIT }
    }
}

impl PageRequest {
    /// Creates a page request from optional client-supplied values, applying defaults.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> ModelResult<Self> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ModelError("page must be 1 or greater".to_owned()));
        }
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ModelError(format!("limit must be between 1 and {}", MAX_PAGE_LIMIT)));
        }
        Ok(Self { page, limit })
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the maximum number of items in the page.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of rows to skip, ready to bind to an `OFFSET` clause.
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct PageMeta {
    /// 1-based page number.
    pub page: u32,

    /// Requested page size.
    pub limit: u32,

    /// Total number of items across all pages.
    pub total: u64,

    /// Total number of pages.
    pub total_pages: u64,
}

impl PageMeta {
    /// Computes the metadata for `request` given the `total` number of matching items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

/// One page of items plus its metadata.
#[derive(Debug, PartialEq)]
pub struct Page<T> {
    /// Items in this page.
    pub items: Vec<T>,

    /// Pagination metadata.
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Builds a page out of the `items` returned for `request` and the `total` count of items.
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self { items, meta: PageMeta::new(request, total) }
    }
}
