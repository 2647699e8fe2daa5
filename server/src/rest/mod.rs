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

//! Entry point to the REST server.

use crate::driver::AntaDriver;
use axum::Router;
use tower_http::cors::CorsLayer;

mod admin_logs_get;
mod directions_get;
mod driver_delete;
mod driver_documents_get;
mod driver_documents_post;
mod driver_get;
mod driver_kyc_patch;
mod driver_location_put;
mod driver_locations_get;
mod driver_status_patch;
mod drivers_get;
mod drivers_nearby_get;
mod drivers_post;
mod geocoding_autocomplete_get;
mod geocoding_get;
mod geocoding_reverse_get;
mod httputils;
mod otp_post;
mod otp_verify_post;
mod payment_get;
mod payments_get;
mod payments_post;
mod promotion_deactivate_patch;
mod promotion_get;
mod promotions_get;
mod promotions_post;
mod promotions_quote_post;
mod stats_get;
#[cfg(test)]
mod testutils;
mod trip_delete;
mod trip_get;
mod trip_rating_post;
mod trip_status_patch;
mod trips_get;
mod trips_post;
mod user_delete;
mod user_get;
mod user_put;
mod users_get;
mod users_post;
mod vehicle_delete;
mod vehicle_get;
mod vehicles_get;
mod vehicles_post;
mod wallet_get;
mod wallet_topup_post;
mod wallet_transfer_post;
mod zone_get;
mod zones_get;
mod zones_post;

/// Creates the router for the application.
///
/// Cross-origin requests are allowed from any origin.
pub(crate) fn app(driver: AntaDriver) -> Router {
    use axum::routing::{get, patch, post, put};

    Router::new()
        .route("/api/users", get(users_get::handler).post(users_post::handler))
        .route("/api/users/otp", post(otp_post::handler))
        .route("/api/users/otp/verify", post(otp_verify_post::handler))
        .route(
            "/api/users/:id",
            get(user_get::handler).put(user_put::handler).delete(user_delete::handler),
        )
        .route("/api/drivers", get(drivers_get::handler).post(drivers_post::handler))
        .route("/api/drivers/nearby", get(drivers_nearby_get::handler))
        .route("/api/drivers/:id", get(driver_get::handler).delete(driver_delete::handler))
        .route("/api/drivers/:id/status", patch(driver_status_patch::handler))
        .route("/api/drivers/:id/location", put(driver_location_put::handler))
        .route("/api/drivers/:id/locations", get(driver_locations_get::handler))
        .route("/api/drivers/:id/kyc", patch(driver_kyc_patch::handler))
        .route(
            "/api/drivers/:id/documents",
            get(driver_documents_get::handler).post(driver_documents_post::handler),
        )
        .route("/api/vehicles", get(vehicles_get::handler).post(vehicles_post::handler))
        .route("/api/vehicles/:id", get(vehicle_get::handler).delete(vehicle_delete::handler))
        .route("/api/trips", get(trips_get::handler).post(trips_post::handler))
        .route("/api/trips/:id", get(trip_get::handler).delete(trip_delete::handler))
        .route("/api/trips/:id/status", patch(trip_status_patch::handler))
        .route("/api/trips/:id/rating", post(trip_rating_post::handler))
        .route("/api/payments", get(payments_get::handler).post(payments_post::handler))
        .route("/api/payments/:id", get(payment_get::handler))
        .route("/api/payments/wallets/transfer", post(wallet_transfer_post::handler))
        .route("/api/payments/wallets/:owner_kind/:owner_id", get(wallet_get::handler))
        .route(
            "/api/payments/wallets/:owner_kind/:owner_id/topup",
            post(wallet_topup_post::handler),
        )
        .route("/api/promotions", get(promotions_get::handler).post(promotions_post::handler))
        .route("/api/promotions/quote", post(promotions_quote_post::handler))
        .route("/api/promotions/:code", get(promotion_get::handler))
        .route("/api/promotions/:code/deactivate", patch(promotion_deactivate_patch::handler))
        .route("/api/zones", get(zones_get::handler).post(zones_post::handler))
        .route("/api/zones/:id", get(zone_get::handler))
        .route("/api/stats", get(stats_get::handler))
        .route("/api/admin-logs", get(admin_logs_get::handler))
        .route("/api/geocoding", get(geocoding_get::handler))
        .route("/api/geocoding/reverse", get(geocoding_reverse_get::handler))
        .route("/api/geocoding/autocomplete", get(geocoding_autocomplete_get::handler))
        .route("/api/directions", get(directions_get::handler))
        .layer(CorsLayer::permissive())
        .with_state(driver)
}
