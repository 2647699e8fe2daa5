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

//! API to list payments.

use crate::driver::AntaDriver;
use crate::model::{Payment, TripId};
use crate::rest::httputils::page_request;
use anta_core::rest::{ApiResponse, EmptyBody, QueryParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Query parameters for this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct PaymentsQuery {
    /// Only return payments of this trip.
    pub(crate) trip_id: Option<TripId>,

    /// 1-based page number.
    pub(crate) page: Option<u32>,

    /// Maximum number of payments per page.
    pub(crate) limit: Option<u32>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    QueryParams(query): QueryParams<PaymentsQuery>,
    _: EmptyBody,
) -> RestResult<ApiResponse<Vec<Payment>>> {
    let page = page_request(query.page, query.limit)?;
    let payments = driver.list_payments(query.trip_id, page).await?;
    Ok(ApiResponse::page(payments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::point;
    use crate::model::{PaymentMethod, PaymentStatus, Role};
    use crate::rest::testutils::*;
    use anta_core::rest::testutils::OneShotBuilder;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/payments".to_owned())
    }

    #[tokio::test]
    async fn test_filter_by_trip() {
        let context = TestContext::setup().await;
        let rider = context.backend.put_user(1, Role::Rider).await;
        let profile = context.backend.put_driver(2, Some(point(-6.2, 106.8))).await;
        let zone = context.backend.put_zone("Jakarta").await;
        let trip1 = context.backend.put_trip(rider.id, zone.id).await;
        let trip1 = context.backend.complete_trip(&trip1, profile.id).await;
        let trip2 = context.backend.put_trip(rider.id, zone.id).await;
        let trip2 = context.backend.complete_trip(&trip2, profile.id).await;

        let driver = context.backend.driver();
        let failed = driver.clone().create_payment(trip1.id, PaymentMethod::Wallet).await.unwrap();
        assert_eq!(PaymentStatus::Failed, failed.status);
        driver.clone().create_payment(trip1.id, PaymentMethod::Cash).await.unwrap();
        driver.create_payment(trip2.id, PaymentMethod::Card).await.unwrap();

        let (payments, meta) = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_page::<Payment>()
            .await;
        assert_eq!(3, meta.total);
        assert_eq!(3, payments.len());

        let (payments, meta) = OneShotBuilder::new(context.app(), route())
            .with_query(PaymentsQuery { trip_id: Some(trip1.id), ..Default::default() })
            .send_empty()
            .await
            .expect_page::<Payment>()
            .await;
        assert_eq!(2, meta.total);
        assert_eq!(
            vec![PaymentStatus::Failed, PaymentStatus::Completed],
            payments.into_iter().map(|p| p.status).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let (payments, meta) = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_page::<Payment>()
            .await;
        assert!(payments.is_empty());
        assert_eq!(0, meta.total);
    }
}
