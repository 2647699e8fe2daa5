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

//! Vehicles registered by drivers.

use crate::model::{DriverId, VehicleCategory, VehicleId};
use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Maximum number of characters in a plate, ignoring separators.
const MAX_PLATE_LENGTH: usize = 12;

/// Maximum number of characters in free-form vehicle attributes.
const MAX_ATTRIBUTE_CHARS: usize = 64;

/// Oldest model year accepted on the platform.
const MIN_YEAR: i32 = 1980;

/// Newest model year accepted on the platform.
const MAX_YEAR: i32 = 2100;

/// A license plate, uppercased with runs of whitespace collapsed to one space.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct Plate(String);

impl Plate {
    /// Creates a new plate from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().split_whitespace().collect::<Vec<&str>>().join(" ").to_uppercase();
        let significant = s.chars().filter(|ch| *ch != ' ' && *ch != '-').count();
        if significant == 0 || significant > MAX_PLATE_LENGTH {
            return Err(ModelError(format!(
                "Plate must have between 1 and {} letters or digits",
                MAX_PLATE_LENGTH
            )));
        }
        if !s.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == ' ' || ch == '-') {
            return Err(ModelError(format!("Plate '{}' contains invalid characters", s)));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the plate.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Plate {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<Plate> for String {
    fn from(value: Plate) -> Self {
        value.0
    }
}

/// Descriptive attributes of a vehicle.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct VehicleSpec {
    /// Manufacturer, like "Toyota".
    pub(crate) make: String,

    /// Model name, like "Avanza".
    pub(crate) model: String,

    /// Body color.
    pub(crate) color: String,

    /// Model year.
    pub(crate) year: i32,

    /// Service class.
    pub(crate) category: VehicleCategory,
}

impl VehicleSpec {
    /// Checks that the free-form attributes are reasonable and trims them.
    pub(crate) fn validate(self) -> ModelResult<Self> {
        /// Trims `value` and checks that it is not empty nor too long.
        fn attribute(name: &str, value: String) -> ModelResult<String> {
            let value = value.trim();
            if value.is_empty() || value.chars().count() > MAX_ATTRIBUTE_CHARS {
                return Err(ModelError(format!(
                    "Vehicle {} must have between 1 and {} characters",
                    name, MAX_ATTRIBUTE_CHARS
                )));
            }
            Ok(value.to_owned())
        }

        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(ModelError(format!(
                "Vehicle year {} must be between {} and {}",
                self.year, MIN_YEAR, MAX_YEAR
            )));
        }
        Ok(Self {
            make: attribute("make", self.make)?,
            model: attribute("model", self.model)?,
            color: attribute("color", self.color)?,
            year: self.year,
            category: self.category,
        })
    }
}

/// A vehicle driven by a driver.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Vehicle {
    /// Identifier of the vehicle.
    pub(crate) id: VehicleId,

    /// The driver that operates the vehicle.
    pub(crate) driver_id: DriverId,

    /// License plate, unique across vehicles.
    pub(crate) plate: Plate,

    /// Descriptive attributes.
    #[serde(flatten)]
    pub(crate) spec: VehicleSpec,
}
