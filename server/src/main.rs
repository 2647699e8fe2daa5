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

//! Entry point to the ANTA service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use anta_core::db::postgres::PostgresOptions;
use anta_core::env::get_optional_var;
use anta_geo::{CachingMapsClientOptions, GoogleMapsClientOptions};
use anta_server::{AntaOptions, serve};
use std::error::Error;
use std::net::Ipv4Addr;

/// Port to listen on when `ANTA_PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port = get_optional_var::<u16>("ANTA", "PORT")?.unwrap_or(DEFAULT_PORT);
    let addr = (Ipv4Addr::UNSPECIFIED, port);

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let maps_opts = GoogleMapsClientOptions::from_env("GOOGLE_MAPS")?;
    let cache_opts = CachingMapsClientOptions::from_env("MAPS_CACHE")?;
    let opts = AntaOptions::from_env("ANTA")?;

    serve(addr, db_opts, maps_opts, cache_opts, opts).await
}
