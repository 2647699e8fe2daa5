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

//! Test utilities for the REST API.

use crate::driver::AntaOptions;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::rest::app;
use anta_geo::MockMapsClient;
use axum::Router;

/// State of a running test.
pub(crate) struct TestContext {
    /// Direct access to the business layer to prepare and inspect state.
    pub(crate) backend: DriverTestContext,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app with a mapping service that knows nothing.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(MockMapsClient::new()).await
    }

    /// Initializes the app with the given mapping service.
    pub(crate) async fn setup_with(maps: MockMapsClient) -> Self {
        let backend = DriverTestContext::setup_with(maps, AntaOptions::default()).await;
        let app = app(backend.driver());
        Self { backend, app }
    }

    /// Gets a clone of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and transforms it into the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }
}
