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

//! Promotional discount codes.

use crate::model::{PromoId, PromoKind};
use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Minimum length of a promo code.
const MIN_CODE_LENGTH: usize = 3;

/// Maximum length of a promo code.
const MAX_CODE_LENGTH: usize = 20;

/// The text of a promo code: uppercase letters and digits.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct PromoCodeName(String);

impl PromoCodeName {
    /// Creates a new code from an untrusted string `s`, uppercasing it.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().trim().to_uppercase();
        if s.len() < MIN_CODE_LENGTH || s.len() > MAX_CODE_LENGTH {
            return Err(ModelError(format!(
                "Promo code must have between {} and {} characters",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH
            )));
        }
        if !s.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ModelError(format!(
                "Promo code '{}' can only contain letters and digits",
                s
            )));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the code.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PromoCodeName {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<PromoCodeName> for String {
    fn from(value: PromoCodeName) -> Self {
        value.0
    }
}

/// A promotional code that grants discounts on trips.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct PromoCode {
    /// Identifier of the promo code.
    pub(crate) id: PromoId,

    /// The code riders type in, unique across promo codes.
    pub(crate) code: PromoCodeName,

    /// How the discount is computed.
    pub(crate) kind: PromoKind,

    /// Percentage (1 to 100) or amount in cents, depending on `kind`.
    pub(crate) value: i64,

    /// Maximum number of redemptions, if limited.
    pub(crate) max_uses: Option<i64>,

    /// Number of redemptions so far.
    pub(crate) uses: i64,

    /// Whether the code can still be redeemed.
    pub(crate) active: bool,

    /// When the code stops being redeemable, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub(crate) expires_at: Option<OffsetDateTime>,
}

impl PromoCode {
    /// Checks that `value` makes sense for a code of `kind` and that `max_uses` is positive.
    pub(crate) fn validate_terms(
        kind: PromoKind,
        value: i64,
        max_uses: Option<i64>,
    ) -> ModelResult<()> {
        match kind {
            PromoKind::Percent if !(1..=100).contains(&value) => {
                return Err(ModelError(format!(
                    "Percent discount {} must be between 1 and 100",
                    value
                )));
            }
            PromoKind::Flat if value <= 0 => {
                return Err(ModelError(format!("Flat discount {} must be positive", value)));
            }
            _ => (),
        }
        if let Some(max_uses) = max_uses {
            if max_uses <= 0 {
                return Err(ModelError(format!("Maximum uses {} must be positive", max_uses)));
            }
        }
        Ok(())
    }

    /// Computes the discount this code grants on `amount_cents`.
    ///
    /// Percentages round down and no discount ever exceeds the amount.
    pub(crate) fn discount_cents(&self, amount_cents: i64) -> i64 {
        let discount = match self.kind {
            PromoKind::Percent => {
                let discount = i128::from(amount_cents) * i128::from(self.value) / 100;
                i64::try_from(discount).unwrap_or(amount_cents)
            }
            PromoKind::Flat => self.value,
        };
        discount.min(amount_cents)
    }

    /// Checks that the code can be redeemed at time `now`.
    pub(crate) fn check_redeemable(&self, now: OffsetDateTime) -> ModelResult<()> {
        if !self.active {
            return Err(ModelError(format!("Promo code {} is not active", self.code.as_str())));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(ModelError(format!("Promo code {} has expired", self.code.as_str())));
            }
        }
        if let Some(max_uses) = self.max_uses {
            if self.uses >= max_uses {
                return Err(ModelError(format!(
                    "Promo code {} has been fully redeemed",
                    self.code.as_str()
                )));
            }
        }
        Ok(())
    }
}
