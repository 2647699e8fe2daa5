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

//! Operations on pricing zones.

use crate::db::{self, crud};
use crate::driver::{AntaDriver, log_admin_action, not_found, require_admin};
use crate::model::*;
use anta_core::db::DbError;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};

/// Maximum length of a zone name.
const MAX_ZONE_NAME_CHARS: usize = 64;

impl AntaDriver {
    /// Creates a zone named `name` with `rates` on behalf of `admin_id`.
    pub(crate) async fn create_zone(
        self,
        admin_id: UserId,
        name: String,
        rates: ZoneRates,
    ) -> DriverResult<Zone> {
        let name = name.trim().to_owned();
        if name.is_empty() || name.chars().count() > MAX_ZONE_NAME_CHARS {
            return Err(DriverError::InvalidInput(format!(
                "Zone name must have between 1 and {} characters",
                MAX_ZONE_NAME_CHARS
            )));
        }
        let rates = rates.validate()?;

        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let admin = require_admin(tx.ex(), admin_id).await?;
        let zone = match db::create_zone(tx.ex(), name, rates).await {
            Ok(zone) => zone,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists("Zone already exists".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        log_admin_action(
            tx.ex(),
            &admin,
            "zone_create",
            "zone",
            Some(zone.id.as_i64()),
            Some(zone.name.clone()),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(zone)
    }

    /// Gets the zone identified by `id`.
    pub(crate) async fn get_zone(self, id: ZoneId) -> DriverResult<Zone> {
        let mut ex = self.db.ex().await?;
        crud::get::<Zone>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Zone {} not found", id)))
    }

    /// Lists all zones.
    pub(crate) async fn list_zones(self, page: PageRequest) -> DriverResult<Page<Zone>> {
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<Zone>(&mut ex, &[], page).await?)
    }
}
