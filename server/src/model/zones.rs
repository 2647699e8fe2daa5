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

//! Pricing zones.

use crate::model::ZoneId;
use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Largest surge multiplier an operator may configure.
const MAX_SURGE_MULTIPLIER: f64 = 10.0;

/// Pricing configuration of a zone.  All amounts are in cents.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct ZoneRates {
    /// Flat amount charged for every trip.
    pub(crate) base_fare_cents: i64,

    /// Amount charged per kilometer.
    pub(crate) per_km_cents: i64,

    /// Amount charged per minute.
    pub(crate) per_minute_cents: i64,

    /// Multiplier applied to the whole fare during high demand.
    pub(crate) surge_multiplier: f64,
}

impl ZoneRates {
    /// Checks that the rates can be used to price trips.
    pub(crate) fn validate(self) -> ModelResult<Self> {
        if self.base_fare_cents < 0 || self.per_km_cents < 0 || self.per_minute_cents < 0 {
            return Err(ModelError("Zone rates cannot be negative".to_owned()));
        }
        if !self.surge_multiplier.is_finite()
            || !(1.0..=MAX_SURGE_MULTIPLIER).contains(&self.surge_multiplier)
        {
            return Err(ModelError(format!(
                "Surge multiplier must be between 1.0 and {}",
                MAX_SURGE_MULTIPLIER
            )));
        }
        Ok(self)
    }

    /// Prices a trip of `distance_meters` that takes `duration_seconds`.
    ///
    /// `fare = round((base + per_km * km + per_minute * minutes) * surge)`.
    pub(crate) fn fare_cents(&self, distance_meters: i64, duration_seconds: i64) -> i64 {
        let km = distance_meters as f64 / 1000.0;
        let minutes = duration_seconds as f64 / 60.0;
        let fare = self.base_fare_cents as f64
            + self.per_km_cents as f64 * km
            + self.per_minute_cents as f64 * minutes;
        (fare * self.surge_multiplier).round() as i64
    }
}

/// A geographic area with its own pricing.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Zone {
    /// Identifier of the zone.
    pub(crate) id: ZoneId,

    /// Name of the zone, unique across zones.
    pub(crate) name: String,

    /// Pricing configuration.
    #[serde(flatten)]
    pub(crate) rates: ZoneRates,
}
