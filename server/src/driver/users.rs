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

//! Operations on users.

use crate::db::{self, crud, crud::Filter};
use crate::driver::{AntaDriver, log_admin_action, not_found, require_admin};
use crate::model::*;
use anta_core::db::DbError;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{EmailAddress, Page, PageRequest, PhoneNumber};
use log::info;

/// Changes to apply to a user.  Fields set to `None` are left untouched.
#[derive(Debug, Default)]
pub(crate) struct UserUpdate {
    /// New full name.
    pub(crate) full_name: Option<FullName>,

    /// New email address.
    pub(crate) email: Option<EmailAddress>,

    /// New role.
    pub(crate) role: Option<Role>,

    /// New account status.
    pub(crate) status: Option<UserStatus>,
}

impl AntaDriver {
    /// Registers a new user and opens its wallet.
    pub(crate) async fn create_user(
        self,
        phone: PhoneNumber,
        full_name: FullName,
        email: Option<EmailAddress>,
        role: Role,
    ) -> DriverResult<User> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let user = match db::create_user(tx.ex(), phone, full_name, email, role, now).await {
            Ok(user) => user,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists(
                    "Phone number is already registered".to_owned(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        db::create_wallet(tx.ex(), OwnerKind::User, user.id.as_i64()).await?;

        tx.commit().await?;
        info!("Registered user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Gets the user identified by `id`.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<User> {
        let mut ex = self.db.ex().await?;
        crud::get::<User>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("User {} not found", id)))
    }

    /// Lists users, optionally restricted to those with `role`.
    pub(crate) async fn list_users(
        self,
        role: Option<Role>,
        page: PageRequest,
    ) -> DriverResult<Page<User>> {
        let mut filters = vec![];
        if let Some(role) = role {
            filters.push(Filter::text("role", role.as_str()));
        }
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<User>(&mut ex, &filters, page).await?)
    }

    /// Applies `update` to the user identified by `id` and returns the updated user.
    pub(crate) async fn update_user(self, id: UserId, update: UserUpdate) -> DriverResult<User> {
        let mut tx = self.db.begin().await?;

        let mut user = crud::get::<User>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("User {} not found", id)))?;
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = update.email {
            user.email = Some(email);
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(status) = update.status {
            user.status = status;
        }
        db::update_user(tx.ex(), &user).await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Deletes the user identified by `id` on behalf of `admin_id`.
    ///
    /// Users that are still referenced by drivers, trips, ratings or audit logs cannot be deleted,
    /// and neither can users whose wallet holds money.
    pub(crate) async fn delete_user(self, id: UserId, admin_id: UserId) -> DriverResult<()> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        if admin.id == id {
            return Err(DriverError::InvalidState(format!("Admin {} cannot delete itself", id)));
        }
        let user = crud::get::<User>(tx.ex(), id.as_i64())
            .await
            .map_err(not_found(format!("User {} not found", id)))?;

        let references = db::count_user_references(tx.ex(), user.id).await?;
        if references > 0 {
            return Err(DriverError::InvalidState(format!(
                "User {} is still referenced by {} records",
                user.id, references
            )));
        }

        match db::get_wallet(tx.ex(), OwnerKind::User, user.id.as_i64()).await {
            Ok(wallet) if wallet.balance_cents > 0 => {
                return Err(DriverError::InvalidState(format!(
                    "User {} still has {} cents in their wallet",
                    user.id, wallet.balance_cents
                )));
            }
            Ok(wallet) => crud::delete::<Wallet>(tx.ex(), wallet.id.as_i64()).await?,
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }

        crud::delete::<User>(tx.ex(), user.id.as_i64()).await?;
        log_admin_action(tx.ex(), &admin, "user_delete", "user", Some(user.id.as_i64()), None, now)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_create_user_ok() {
        let context = TestContext::setup().await;

        let user = context
            .driver()
            .create_user(
                PhoneNumber::new("+62 812 3456 7890").unwrap(),
                FullName::new("Budi Santoso").unwrap(),
                Some(EmailAddress::new("budi@example.com").unwrap()),
                Role::Rider,
            )
            .await
            .unwrap();
        assert_eq!("+6281234567890", user.phone.as_str());
        assert_eq!(UserStatus::Active, user.status);
        assert!(!user.phone_verified);
        assert_eq!(START_TIME, user.created_at);

        let stored = crud::get::<User>(&mut context.ex().await, user.id.as_i64()).await.unwrap();
        assert_eq!(user, stored);
        assert_eq!(0, context.balance(user_wallet(user.id)).await);
    }

    #[tokio::test]
    async fn test_create_user_duplicate_phone() {
        let context = TestContext::setup().await;

        context.put_user(1, Role::Rider).await;
        let err = context
            .driver()
            .create_user(
                PhoneNumber::new("+628120000001").unwrap(),
                FullName::new("Impostor").unwrap(),
                None,
                Role::Driver,
            )
            .await
            .unwrap_err();
        let msg = "Phone number is already registered".to_owned();
        assert_eq!(DriverError::AlreadyExists(msg), err);
        assert_eq!(1, crud::count::<User>(&mut context.ex().await, &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("User 5 not found".to_owned()),
            context.driver().get_user(UserId::new(5)).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_list_users_by_role() {
        let context = TestContext::setup().await;

        context.put_user(1, Role::Rider).await;
        let driver = context.put_user(2, Role::Driver).await;
        context.put_user(3, Role::Rider).await;

        let page = context
            .driver()
            .list_users(Some(Role::Driver), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(vec![driver], page.items);
        assert_eq!(1, page.meta.total);

        let page = context.driver().list_users(None, PageRequest::default()).await.unwrap();
        assert_eq!(3, page.meta.total);
    }

    #[tokio::test]
    async fn test_update_user_partial() {
        let context = TestContext::setup().await;

        let user = context.put_user(1, Role::Rider).await;
        let update = UserUpdate {
            email: Some(EmailAddress::new("new@example.com").unwrap()),
            status: Some(UserStatus::Suspended),
            ..Default::default()
        };
        let updated = context.driver().update_user(user.id, update).await.unwrap();
        assert_eq!(user.full_name, updated.full_name);
        assert_eq!(Some("new@example.com"), updated.email.as_ref().map(EmailAddress::as_str));
        assert_eq!(UserStatus::Suspended, updated.status);
        assert_eq!(updated, context.driver().get_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let context = TestContext::setup().await;

        let err = context.driver().update_user(UserId::new(9), UserUpdate::default()).await;
        assert_eq!(DriverError::NotFound("User 9 not found".to_owned()), err.unwrap_err());
    }

    #[tokio::test]
    async fn test_delete_user_ok() {
        let context = TestContext::setup().await;

        let admin = context.put_admin(1).await;
        let user = context.put_user(2, Role::Rider).await;
        context.driver().delete_user(user.id, admin).await.unwrap();

        let mut ex = context.ex().await;
        assert_eq!(
            DbError::NotFound,
            crud::get::<User>(&mut ex, user.id.as_i64()).await.unwrap_err()
        );
        assert_eq!(
            DbError::NotFound,
            db::get_wallet(&mut ex, OwnerKind::User, user.id.as_i64()).await.unwrap_err()
        );
        let logs = crud::list::<AdminLog>(&mut ex, &[], PageRequest::default()).await.unwrap();
        assert_eq!(1, logs.items.len());
        assert_eq!("user_delete", logs.items[0].action);
        assert_eq!(Some(user.id.as_i64()), logs.items[0].entity_id);
    }

    #[tokio::test]
    async fn test_delete_user_requires_admin() {
        let context = TestContext::setup().await;

        let rider = context.put_user(1, Role::Rider).await;
        let user = context.put_user(2, Role::Rider).await;
        for admin_id in [rider.id, UserId::new(1000)] {
            let err = context.driver().delete_user(user.id, admin_id).await.unwrap_err();
            assert_eq!(
                DriverError::Forbidden(format!("User {} is not an admin", admin_id)),
                err
            );
        }
        context.driver().get_user(user.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_user_self() {
        let context = TestContext::setup().await;

        let admin = context.put_admin(1).await;
        let err = context.driver().delete_user(admin, admin).await.unwrap_err();
        assert_eq!(
            DriverError::InvalidState(format!("Admin {} cannot delete itself", admin)),
            err
        );
        context.driver().get_user(admin).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_user_still_referenced() {
        let context = TestContext::setup().await;

        let admin = context.put_admin(1).await;
        let driver = context.put_driver(2, None).await;
        let err = context.driver().delete_user(driver.user_id, admin).await.unwrap_err();
        assert!(matches!(err, DriverError::InvalidState(msg) if msg.contains("1 records")));
    }

    #[tokio::test]
    async fn test_delete_user_with_money() {
        let context = TestContext::setup().await;

        let admin = context.put_admin(1).await;
        let user = context.put_user(2, Role::Rider).await;
        context.set_balance(user_wallet(user.id), 1).await;
        let err = context.driver().delete_user(user.id, admin).await.unwrap_err();
        assert!(matches!(err, DriverError::InvalidState(msg) if msg.contains("1 cents")));
        context.driver().get_user(user.id).await.unwrap();
    }
}
