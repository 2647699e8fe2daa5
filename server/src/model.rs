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

//! Domain types of the ride-hailing service.

mod admin;
pub(crate) use admin::{AdminLog, Stats};
mod drivers;
pub(crate) use drivers::{Driver, DriverLocation, KycDocument, LicenseNumber, NearbyDriver};
mod enums;
pub(crate) use enums::*;
mod ids;
pub(crate) use ids::*;
mod otp;
pub(crate) use otp::{Otp, OtpCode};
mod payments;
pub(crate) use payments::{
    MAX_AMOUNT_CENTS, Payment, Wallet, WalletOwner, validate_amount, validate_credit,
};
#[cfg(test)]
pub(crate) use payments::MAX_BALANCE_CENTS;
mod promos;
pub(crate) use promos::{PromoCode, PromoCodeName};
mod trips;
pub(crate) use trips::{Rating, Score, Trip};
mod users;
pub(crate) use users::{FullName, User};
mod vehicles;
pub(crate) use vehicles::{Plate, Vehicle, VehicleSpec};
mod zones;
pub(crate) use zones::{Zone, ZoneRates};
