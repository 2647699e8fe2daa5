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

//! API to add funds to a wallet.

use crate::driver::AntaDriver;
use crate::model::{OwnerKind, Wallet};
use crate::rest::httputils::wallet_owner;
use anta_core::rest::{ApiResponse, JsonBody, PathParams, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to top up a wallet.
#[derive(Deserialize, Serialize)]
pub(crate) struct TopUpRequest {
    /// Amount to add.
    pub(crate) amount_cents: i64,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    PathParams((kind, id)): PathParams<(OwnerKind, i64)>,
    JsonBody(request): JsonBody<TopUpRequest>,
) -> RestResult<ApiResponse<Wallet>> {
    let wallet = driver.top_up_wallet(wallet_owner(kind, id)?, request.amount_cents).await?;
    Ok(ApiResponse::ok(wallet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::driver_wallet;
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route(kind: &str, id: i64) -> (http::Method, String) {
        (http::Method::POST, format!("/api/payments/wallets/{}/{}/topup", kind, id))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        for (amount, exp_balance) in [(1000, 1000), (250, 1250)] {
            let wallet = OneShotBuilder::new(context.app(), route("driver", profile.id.as_i64()))
                .send_json(TopUpRequest { amount_cents: amount })
                .await
                .expect_data::<Wallet>()
                .await;
            assert_eq!(exp_balance, wallet.balance_cents);
        }
        assert_eq!(1250, context.backend.balance(driver_wallet(profile.id)).await);
    }

    #[tokio::test]
    async fn test_bad_amount() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;

        for amount in [0, -5] {
            OneShotBuilder::new(context.app(), route("driver", profile.id.as_i64()))
                .send_json(TopUpRequest { amount_cents: amount })
                .await
                .expect_status(http::StatusCode::BAD_REQUEST)
                .expect_error("BAD_REQUEST", "Amount must be positive")
                .await;
        }
    }

    #[tokio::test]
    async fn test_amount_too_large() {
        let context = TestContext::setup().await;
        let profile = context.backend.put_driver(1, None).await;
        context.backend.set_balance(driver_wallet(profile.id), 1).await;

        OneShotBuilder::new(context.app(), route("driver", profile.id.as_i64()))
            .send_json(TopUpRequest { amount_cents: i64::MAX })
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Amount must not exceed")
            .await;
        assert_eq!(1, context.backend.balance(driver_wallet(profile.id)).await);
    }

    #[tokio::test]
    async fn test_unknown_owner() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route("user", 42))
            .send_json(TopUpRequest { amount_cents: 100 })
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "User 42 not found")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route("user", 1));
}
