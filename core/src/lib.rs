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

//! Shared building blocks for the ANTA ride-hailing services.
//!
//! Services built on top of this crate follow a layered architecture and mirror these modules:
//!
//! 1.  `model`: Domain types.  Values are validated at construction time so that the upper layers
//!     never see malformed data.  Newtypes and string-backed enums are the norm.
//!
//! 1.  `db`: Persistence.  Services write free functions that take an `Executor` and issue one
//!     query per supported backend.  PostgreSQL is the production backend and SQLite backs the
//!     unit tests.
//!
//! 1.  `driver`: Business logic.  Services provide a cloneable driver type that holds the shared
//!     state of the app (database, clock, external clients) and coordinates transactions.
//!
//! 1.  `rest`: HTTP layer.  Services build an `axum::Router` whose handlers call into the driver
//!     and answer with the uniform JSON envelope defined here.
//!
//! 1.  `main`: Launcher.  Reads configuration from environment variables and starts serving.
//!
//! Every layer has its own result and error types, like `DbResult` and `DbError`, and errors
//! convert into the ones of the layer above so that `?` carries them up to the REST layer, where
//! they become HTTP status codes and error envelopes.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
