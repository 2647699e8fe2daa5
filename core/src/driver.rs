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

//! Error types for the business logic layer.
//!
//! Every service implements its own driver type, which typically looks like this:
//!
//! ```rust
//! use anta_core::db::Db;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! pub(crate) struct Driver {
//!     /// The database that the driver uses for persistence.
//!     db: Arc<dyn Db + Send + Sync>,
//!
//!     // ... other fields here ...
//! }
//! ```
//!
//! Operations on the driver consume `self`.  Each operation coordinates its database accesses,
//! usually inside a single transaction, and forcing a clone per call makes it obvious when a caller
//! tries to chain several operations that should have been one.

use crate::db::DbError;
use crate::model::ModelError;

/// Business logic errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// A request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all for unexpected backend errors.
    #[error("{0}")]
    BackendError(String),

    /// The caller is known but is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The input data is malformed or violates a business rule.
    #[error("{0}")]
    InvalidInput(String),

    /// The operation does not apply to the current state of the entity.
    #[error("{0}")]
    InvalidState(String),

    /// A requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller failed to prove its identity.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
