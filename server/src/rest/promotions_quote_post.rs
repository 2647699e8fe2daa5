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

//! API to preview the discount a promo code grants on an amount.

use crate::driver::AntaDriver;
use crate::model::PromoCodeName;
use anta_core::rest::{ApiResponse, JsonBody, RestResult};
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Message sent to the server to quote a promo code.
#[derive(Deserialize, Serialize)]
pub(crate) struct QuoteRequest {
    /// The code to evaluate.
    pub(crate) code: PromoCodeName,

    /// Amount the code would apply to.
    pub(crate) amount_cents: i64,
}

/// Message returned by the server after quoting a promo code.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct QuoteResponse {
    /// The evaluated code.
    pub(crate) code: PromoCodeName,

    /// Amount the code was applied to.
    pub(crate) amount_cents: i64,

    /// Discount the code grants.
    pub(crate) discount_cents: i64,

    /// Amount left to pay after the discount.
    pub(crate) final_cents: i64,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AntaDriver>,
    JsonBody(request): JsonBody<QuoteRequest>,
) -> RestResult<ApiResponse<QuoteResponse>> {
    let (promo, discount_cents) = driver.quote_promo(request.code, request.amount_cents).await?;
    let response = QuoteResponse {
        code: promo.code,
        amount_cents: request.amount_cents,
        discount_cents,
        final_cents: request.amount_cents - discount_cents,
    };
    Ok(ApiResponse::ok(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PromoKind;
    use crate::rest::testutils::*;
    use anta_core::{rest::testutils::OneShotBuilder, test_payload_must_be_json};
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/promotions/quote".to_owned())
    }

    async fn put_promo(context: &TestContext, code: &str, kind: PromoKind, value: i64) {
        let admin_id = context.backend.put_admin(1).await;
        context
            .backend
            .driver()
            .create_promo(admin_id, PromoCodeName::new(code).unwrap(), kind, value, None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_percent() {
        let context = TestContext::setup().await;
        put_promo(&context, "HEMAT", PromoKind::Percent, 15).await;

        let code = PromoCodeName::new("hemat").unwrap();
        let request = QuoteRequest { code, amount_cents: 1999 };
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_data::<QuoteResponse>()
            .await;
        let exp_response = QuoteResponse {
            code: PromoCodeName::new("HEMAT").unwrap(),
            amount_cents: 1999,
            discount_cents: 299,
            final_cents: 1700,
        };
        assert_eq!(exp_response, response);
    }

    #[tokio::test]
    async fn test_flat_is_capped() {
        let context = TestContext::setup().await;
        put_promo(&context, "GRATIS", PromoKind::Flat, 5000).await;

        let code = PromoCodeName::new("GRATIS").unwrap();
        let request = QuoteRequest { code, amount_cents: 3000 };
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_data::<QuoteResponse>()
            .await;
        assert_eq!(3000, response.discount_cents);
        assert_eq!(0, response.final_cents);
    }

    #[tokio::test]
    async fn test_errors() {
        let context = TestContext::setup().await;
        put_promo(&context, "HEMAT", PromoKind::Percent, 15).await;

        let request = QuoteRequest { code: PromoCodeName::new("HEMAT").unwrap(), amount_cents: 0 };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Amount must be positive")
            .await;

        let code = PromoCodeName::new("HEMAT").unwrap();
        let request = QuoteRequest { code, amount_cents: i64::MAX / 5 };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("BAD_REQUEST", "Amount must not exceed")
            .await;

        let request = QuoteRequest { code: PromoCodeName::new("OTHER").unwrap(), amount_cents: 10 };
        OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("NOT_FOUND", "Promo code OTHER not found")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
