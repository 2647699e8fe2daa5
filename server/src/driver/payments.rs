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

//! Operations on payments and wallets.

use crate::db::{self, crud, crud::Filter};
use crate::driver::{AntaDriver, not_found};
use crate::model::*;
use anta_core::db::{DbError, Executor};
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};
use log::info;

/// Moves `amount_cents` from the wallet of `from` to the wallet of `to`.
///
/// Returns false without touching any balance if `from` cannot cover the amount.  The caller is
/// responsible for committing or rolling back the transaction that `ex` belongs to.
async fn move_funds(
    ex: &mut Executor,
    from: WalletOwner,
    to: WalletOwner,
    amount_cents: i64,
) -> DriverResult<bool> {
    let target = db::get_wallet(ex, to.kind(), to.id())
        .await
        .map_err(not_found(format!("Wallet of {} not found", to)))?;
    validate_credit(target.balance_cents, amount_cents)?;

    if !db::debit_if_sufficient(ex, from.kind(), from.id(), amount_cents).await? {
        // Tell apart a poor wallet from a missing one.
        db::get_wallet(ex, from.kind(), from.id())
            .await
            .map_err(not_found(format!("Wallet of {} not found", from)))?;
        return Ok(false);
    }

    match db::credit(ex, to.kind(), to.id(), amount_cents).await {
        Ok(()) => Ok(true),
        Err(DbError::NotFound) => Err(DriverError::NotFound(format!("Wallet of {} not found", to))),
        Err(e) => Err(e.into()),
    }
}

impl AntaDriver {
    /// Settles the completed trip `trip_id` with `method`.
    ///
    /// Wallet payments move the amount due from the rider to the driver right away and are
    /// recorded as failed, with no balance changes, if the rider cannot afford them.
    pub(crate) async fn create_payment(
        self,
        trip_id: TripId,
        method: PaymentMethod,
    ) -> DriverResult<Payment> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let trip = crud::get::<Trip>(tx.ex(), trip_id.as_i64())
            .await
            .map_err(not_found(format!("Trip {} not found", trip_id)))?;
        if trip.status != TripStatus::Completed {
            return Err(DriverError::InvalidState(format!(
                "Trip {} has not been completed",
                trip.id
            )));
        }
        if db::has_completed_payment(tx.ex(), trip.id).await? {
            let msg = format!("Trip {} has already been paid", trip.id);
            return Err(DriverError::AlreadyExists(msg));
        }

        let amount_cents = trip.amount_due_cents();
        let status = match method {
            PaymentMethod::Cash => PaymentStatus::Completed,
            PaymentMethod::Card => PaymentStatus::Pending,
            PaymentMethod::Wallet if amount_cents == 0 => PaymentStatus::Completed,
            PaymentMethod::Wallet => {
                let driver_id = trip.driver_id.ok_or_else(|| {
                    DriverError::BackendError(format!("Completed trip {} has no driver", trip.id))
                })?;
                let from = WalletOwner::new(OwnerKind::User, trip.rider_id.as_i64())?;
                let to = WalletOwner::new(OwnerKind::Driver, driver_id.as_i64())?;
                if move_funds(tx.ex(), from, to, amount_cents).await? {
                    PaymentStatus::Completed
                } else {
                    info!("Rider {} cannot afford trip {}", trip.rider_id, trip.id);
                    PaymentStatus::Failed
                }
            }
        };

        let payment =
            db::create_payment(tx.ex(), trip.id, amount_cents, method, status, now).await?;

        tx.commit().await?;
        Ok(payment)
    }

    /// Gets the payment identified by `id`.
    pub(crate) async fn get_payment(self, id: PaymentId) -> DriverResult<Payment> {
        let mut ex = self.db.ex().await?;
        crud::get::<Payment>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Payment {} not found", id)))
    }

    /// Lists payments, optionally only those for `trip_id`.
    pub(crate) async fn list_payments(
        self,
        trip_id: Option<TripId>,
        page: PageRequest,
    ) -> DriverResult<Page<Payment>> {
        let filters = match trip_id {
            Some(trip_id) => vec![Filter::int("trip_id", trip_id.as_i64())],
            None => vec![],
        };
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<Payment>(&mut ex, &filters, page).await?)
    }

    /// Gets the wallet of `owner`.
    pub(crate) async fn get_wallet(self, owner: WalletOwner) -> DriverResult<Wallet> {
        let mut ex = self.db.ex().await?;
        db::get_wallet(&mut ex, owner.kind(), owner.id())
            .await
            .map_err(not_found(format!("Wallet of {} not found", owner)))
    }

    /// Adds `amount_cents` to the wallet of `owner`, creating the wallet if it does not exist yet.
    pub(crate) async fn top_up_wallet(
        self,
        owner: WalletOwner,
        amount_cents: i64,
    ) -> DriverResult<Wallet> {
        let amount_cents = validate_amount(amount_cents)?;

        let mut tx = self.db.begin().await?;

        match owner.kind() {
            OwnerKind::User => {
                crud::get::<User>(tx.ex(), owner.id())
                    .await
                    .map_err(not_found(format!("User {} not found", owner.id())))?;
            }
            OwnerKind::Driver => {
                crud::get::<Driver>(tx.ex(), owner.id())
                    .await
                    .map_err(not_found(format!("Driver {} not found", owner.id())))?;
            }
            OwnerKind::Platform => (),
        }
        match db::get_wallet(tx.ex(), owner.kind(), owner.id()).await {
            Ok(wallet) => validate_credit(wallet.balance_cents, amount_cents)?,
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }
        let wallet = db::top_up(tx.ex(), owner.kind(), owner.id(), amount_cents).await?;

        tx.commit().await?;
        Ok(wallet)
    }

    /// Moves `amount_cents` from the wallet of `from` to the wallet of `to`.
    ///
    /// Returns false, leaving both balances untouched, if `from` cannot cover the amount.
    pub(crate) async fn transfer(
        self,
        from: WalletOwner,
        to: WalletOwner,
        amount_cents: i64,
    ) -> DriverResult<bool> {
        let amount_cents = validate_amount(amount_cents)?;
        if from == to {
            return Err(DriverError::InvalidInput(
                "Cannot transfer funds to the same wallet".to_owned(),
            ));
        }

        let mut tx = self.db.begin().await?;
        if !move_funds(tx.ex(), from, to, amount_cents).await? {
            return Ok(false);
        }
        tx.commit().await?;
        Ok(true)
    }
}
