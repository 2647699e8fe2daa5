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

//! Operations on vehicles.

use crate::db::{self, crud, crud::Filter};
use crate::driver::{AntaDriver, not_found};
use crate::model::*;
use anta_core::db::DbError;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::{Page, PageRequest};

impl AntaDriver {
    /// Registers a vehicle with `plate` and `spec` for the driver identified by `driver_id`.
    pub(crate) async fn create_vehicle(
        self,
        driver_id: DriverId,
        plate: Plate,
        spec: VehicleSpec,
    ) -> DriverResult<Vehicle> {
        let spec = spec.validate()?;

        let mut tx = self.db.begin().await?;

        crud::get::<Driver>(tx.ex(), driver_id.as_i64())
            .await
            .map_err(not_found(format!("Driver {} not found", driver_id)))?;
        let vehicle = match db::create_vehicle(tx.ex(), driver_id, plate, spec).await {
            Ok(vehicle) => vehicle,
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists("Plate is already registered".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(vehicle)
    }

    /// Gets the vehicle identified by `id`.
    pub(crate) async fn get_vehicle(self, id: VehicleId) -> DriverResult<Vehicle> {
        let mut ex = self.db.ex().await?;
        crud::get::<Vehicle>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Vehicle {} not found", id)))
    }

    /// Lists vehicles, optionally restricted to those of `driver_id`.
    pub(crate) async fn list_vehicles(
        self,
        driver_id: Option<DriverId>,
        page: PageRequest,
    ) -> DriverResult<Page<Vehicle>> {
        let mut filters = vec![];
        if let Some(driver_id) = driver_id {
            filters.push(Filter::int("driver_id", driver_id.as_i64()));
        }
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<Vehicle>(&mut ex, &filters, page).await?)
    }

    /// Deletes the vehicle identified by `id`.
    pub(crate) async fn delete_vehicle(self, id: VehicleId) -> DriverResult<()> {
        let mut ex = self.db.ex().await?;
        crud::delete::<Vehicle>(&mut ex, id.as_i64())
            .await
            .map_err(not_found(format!("Vehicle {} not found", id)))
    }
}
