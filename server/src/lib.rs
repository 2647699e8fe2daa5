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

//! ANTA: REST backend for a ride-hailing service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use anta_core::clocks::SystemClock;
use anta_core::db::Db;
use anta_core::db::postgres::{PostgresDb, PostgresOptions};
use anta_geo::{
    CachingMapsClient, CachingMapsClientOptions, GoogleMapsClient, GoogleMapsClientOptions,
};
use log::{error, info};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub(crate) mod db;
mod driver;
pub use driver::{AntaDriver, AntaOptions};
pub(crate) mod model;
mod rest;
use rest::app;

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db_opts: PostgresOptions,
    maps_opts: GoogleMapsClientOptions,
    cache_opts: CachingMapsClientOptions,
    opts: AntaOptions,
) -> Result<(), Box<dyn Error>> {
    let db = Arc::new(PostgresDb::connect(db_opts));
    crate::db::init_schema(&mut db.ex().await?).await?;

    let maps = CachingMapsClient::new(cache_opts, GoogleMapsClient::new(maps_opts)?);
    let clock = Arc::new(SystemClock::default());
    let driver = AntaDriver::new(db.clone(), clock, Arc::new(maps), opts);
    let app = app(driver);

    let bind_addr = bind_addr.into();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot wait for the shutdown signal: {}", e);
            }
        })
        .await?;

    db.close().await;
    Ok(())
}
