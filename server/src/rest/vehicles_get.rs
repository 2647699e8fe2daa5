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

//! API to list vehicles.

use crate::driver::AntaDriver;
use crate::model::{DriverId, Vehicle};
use crate::rest::httputils::page_request;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct VehiclesQuery {
    /// Only return vehicles of this driver.
    pub(crate) driver_id: Option<DriverId>,

    /// 1-based page number.
    pub(crate) page: Option<u32>,

    /// Maximum number of vehicles per page.
    pub(crate) limit: Option<u32>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<VehiclesQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<Vehicle>>> {
    let page = page_request(query.page, query.limit)?;
    let vehicles = driver.list_vehicles(query.driver_id, page).await?;
    Ok(ApiResponse::page(vehicles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::avanza;
    use crate::model::Plate;
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/vehicles".to_owned())
    }

    #[tokio::test]
    async fn test_filter_by_driver() {
        let context = TestContext::setup().await;
        let profile1 = context.backend.put_driver(1, None).await;
        let profile2 = context.backend.put_driver(2, None).await;
        for (id, plate) in [(profile1.id, "B 1"), (profile2.id, "B 2"), (profile1.id, "B 3")] {
            context
                .backend
                .driver()
                .create_vehicle(id, Plate::new(plate).unwrap(), avanza())
                .await
                .unwrap();
        }

        let (vehicles, meta) = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_page::<Vehicle>()
            .await;
        assert_eq!(3, meta.total);
        assert_eq!(3, vehicles.len());

        let (vehicles, meta) = OneShotBuilder::new(context.app(), route())
            .with_query(VehiclesQuery { driver_id: Some(profile1.id), ..Default::default() })
            .send_empty()
            .await
            .expect_page::<Vehicle>()
            .await;
        assert_eq!(2, meta.total);
        assert_eq!(
            vec!["B 1", "B 3"],
            vehicles.iter().map(|v| v.plate.as_str()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_bad_driver_id() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .with_query([("driver_id", "abc")])
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "query string")
            .await;
    }
}
