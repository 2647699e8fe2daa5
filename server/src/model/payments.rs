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

//! Payments and wallets.

use crate::model::{OwnerKind, PaymentId, PaymentMethod, PaymentStatus, TripId, WalletId};
use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Settlement of a trip's fare.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Payment {
    /// Identifier of the payment.
    pub(crate) id: PaymentId,

    /// The trip being paid for.
    pub(crate) trip_id: TripId,

    /// Amount charged.
    pub(crate) amount_cents: i64,

    /// How the rider pays.
    pub(crate) method: PaymentMethod,

    /// Settlement state.
    pub(crate) status: PaymentStatus,

    /// When the payment was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

/// Stored balance of a user, a driver or the platform.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Wallet {
    /// Identifier of the wallet.
    pub(crate) id: WalletId,

    /// Kind of the owner.
    pub(crate) owner_kind: OwnerKind,

    /// Identifier of the owner within its kind.  The platform wallet uses 0.
    pub(crate) owner_id: i64,

    /// Available balance.  Never negative.
    pub(crate) balance_cents: i64,
}

/// Identifier of the platform's own wallet owner.
const PLATFORM_OWNER_ID: i64 = 0;

/// Largest amount accepted by a single top-up, transfer, quote or fare.
pub(crate) const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Largest balance a wallet may hold.
pub(crate) const MAX_BALANCE_CENTS: i64 = 1_000_000_000_000;

/// Checks that `amount_cents` is a positive amount no larger than `MAX_AMOUNT_CENTS`.
pub(crate) fn validate_amount(amount_cents: i64) -> ModelResult<i64> {
    if amount_cents <= 0 {
        return Err(ModelError("Amount must be positive".to_owned()));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(ModelError(format!("Amount must not exceed {}", MAX_AMOUNT_CENTS)));
    }
    Ok(amount_cents)
}

/// Checks that adding `amount_cents` to `balance_cents` stays within `MAX_BALANCE_CENTS`.
pub(crate) fn validate_credit(balance_cents: i64, amount_cents: i64) -> ModelResult<()> {
    match balance_cents.checked_add(amount_cents) {
        Some(total) if total <= MAX_BALANCE_CENTS => Ok(()),
        _ => Err(ModelError(format!("Wallet balance cannot exceed {}", MAX_BALANCE_CENTS))),
    }
}

/// The owner of a wallet: a user, a driver, or the platform itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct WalletOwner {
    /// Kind of the owner.
    kind: OwnerKind,

    /// Identifier of the owner within its kind.
    id: i64,
}

impl WalletOwner {
    /// Creates an owner after checking that `id` makes sense for `kind`.
    pub(crate) fn new(kind: OwnerKind, id: i64) -> ModelResult<Self> {
        match kind {
            OwnerKind::Platform if id != PLATFORM_OWNER_ID => Err(ModelError(format!(
                "Platform wallet owner must be {}",
                PLATFORM_OWNER_ID
            ))),
            OwnerKind::User | OwnerKind::Driver if id <= 0 => {
                Err(ModelError(format!("Invalid {} wallet owner {}", kind, id)))
            }
            _ => Ok(Self { kind, id }),
        }
    }

    /// Returns the owner of the platform wallet.
    pub(crate) fn platform() -> Self {
        Self { kind: OwnerKind::Platform, id: PLATFORM_OWNER_ID }
    }

    /// Returns the kind of the owner.
    pub(crate) fn kind(self) -> OwnerKind {
        self.kind
    }

    /// Returns the identifier of the owner.
    pub(crate) fn id(self) -> i64 {
        self.id
    }
}

impl fmt::Display for WalletOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
