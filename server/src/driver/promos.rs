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

//! Operations on promo codes.

use crate::db::{self, crud};
use crate::driver::{AntaDriver, log_admin_action, not_found, require_admin};
use crate::model::*;
use anta_core::db::DbError;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};
use time::OffsetDateTime;

impl AntaDriver {
    /// Creates a new promo code on behalf of `admin_id`.
    pub(crate) async fn create_promo(
        self,
        admin_id: UserId,
        code: PromoCodeName,
        kind: PromoKind,
        value: i64,
        max_uses: Option<i64>,
        expires_at: Option<OffsetDateTime>,
    ) -> DriverResult<PromoCode> {
        PromoCode::validate_terms(kind, value, max_uses)?;

        let now = self.clock.now_utc();
        if let Some(expires_at) = expires_at {
            if expires_at <= now {
                return Err(DriverError::InvalidInput(
                    "Promo code expiration must be in the future".to_owned(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        let promo = match db::create_promo(tx.ex(), code, kind, value, max_uses, expires_at).await
        {
            Ok(promo) => promo,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists("Promo code already exists".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        log_admin_action(
            tx.ex(),
            &admin,
            "promo_create",
            "promo_code",
            Some(promo.id.as_i64()),
            Some(promo.code.as_str().to_owned()),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(promo)
    }

    /// Gets the promo code `code`.
    pub(crate) async fn get_promo(self, code: PromoCodeName) -> DriverResult<PromoCode> {
        let mut ex = self.db.ex().await?;
        db::get_promo_by_code(&mut ex, &code)
            .await
            .map_err(not_found(format!("Promo code {} not found", code.as_str())))
    }

    /// Lists all promo codes.
    pub(crate) async fn list_promos(self, page: PageRequest) -> DriverResult<Page<PromoCode>> {
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<PromoCode>(&mut ex, &[], page).await?)
    }

    /// Computes the discount that `code` would grant on `amount_cents` without redeeming it.
    ///
    /// Returns the promo code along with the discount.
    pub(crate) async fn quote_promo(
        self,
        code: PromoCodeName,
        amount_cents: i64,
    ) -> DriverResult<(PromoCode, i64)> {
        let amount_cents = validate_amount(amount_cents)?;

        let now = self.clock.now_utc();
        let mut ex = self.db.ex().await?;
        let promo = db::get_promo_by_code(&mut ex, &code)
            .await
            .map_err(not_found(format!("Promo code {} not found", code.as_str())))?;
        promo.check_redeemable(now)?;
        let discount = promo.discount_cents(amount_cents);
        Ok((promo, discount))
    }

    /// Deactivates the promo code `code` on behalf of `admin_id`.
    pub(crate) async fn deactivate_promo(
        self,
        code: PromoCodeName,
        admin_id: UserId,
    ) -> DriverResult<PromoCode> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        let mut promo = db::get_promo_by_code(tx.ex(), &code)
            .await
            .map_err(not_found(format!("Promo code {} not found", code.as_str())))?;
        if !promo.active {
            return Err(DriverError::InvalidState(format!(
                "Promo code {} is already inactive",
                code.as_str()
            )));
        }
        db::deactivate_promo(tx.ex(), &code).await?;
        promo.active = false;
        log_admin_action(
            tx.ex(),
            &admin,
            "promo_deactivate",
            "promo_code",
            Some(promo.id.as_i64()),
            Some(promo.code.as_str().to_owned()),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(promo)
    }
}
