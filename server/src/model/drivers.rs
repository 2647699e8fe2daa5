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

//! Driver profiles and their satellite records.

use crate::model::{
    DocumentId, DocumentKind, DriverId, DriverStatus, KycStatus, LocationId, UserId,
};
use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Minimum length of a license number.
const MIN_LICENSE_LENGTH: usize = 4;

/// Maximum length of a license number.
const MAX_LICENSE_LENGTH: usize = 32;

/// A driving license number, uppercased.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct LicenseNumber(String);

impl LicenseNumber {
    /// Creates a new license number from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().trim().to_uppercase();
        if s.len() < MIN_LICENSE_LENGTH || s.len() > MAX_LICENSE_LENGTH {
            return Err(ModelError(format!(
                "License number must have between {} and {} characters",
                MIN_LICENSE_LENGTH, MAX_LICENSE_LENGTH
            )));
        }
        if !s.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
            return Err(ModelError(format!(
                "License number '{}' can only contain letters, digits and dashes",
                s
            )));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the license number.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LicenseNumber {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<LicenseNumber> for String {
    fn from(value: LicenseNumber) -> Self {
        value.0
    }
}

/// The driver profile attached to a user.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Driver {
    /// Identifier of the driver profile.
    pub(crate) id: DriverId,

    /// The user that owns this profile.
    pub(crate) user_id: UserId,

    /// Driving license number, unique across drivers.
    pub(crate) license_number: LicenseNumber,

    /// Current availability.
    pub(crate) status: DriverStatus,

    /// Progress of the identity verification.
    pub(crate) kyc_status: KycStatus,

    /// Average score across all ratings, if rated at least once.
    pub(crate) rating: Option<f64>,

    /// Number of ratings received.
    pub(crate) rating_count: i64,

    /// Last reported latitude.
    pub(crate) latitude: Option<f64>,

    /// Last reported longitude.
    pub(crate) longitude: Option<f64>,

    /// When the profile was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

/// A driver found by a proximity query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct NearbyDriver {
    /// The driver.
    #[serde(flatten)]
    pub(crate) driver: Driver,

    /// Great-circle distance from the query point.
    pub(crate) distance_meters: f64,
}

/// A location sample reported by a driver.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct DriverLocation {
    /// Identifier of the sample.
    pub(crate) id: LocationId,

    /// The driver that reported the sample.
    pub(crate) driver_id: DriverId,

    /// Latitude in degrees.
    pub(crate) latitude: f64,

    /// Longitude in degrees.
    pub(crate) longitude: f64,

    /// Direction of travel in degrees from north, if known.
    pub(crate) heading: Option<f64>,

    /// Speed in km/h, if known.
    pub(crate) speed_kmh: Option<f64>,

    /// When the sample was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) recorded_at: OffsetDateTime,
}

/// Metadata of a document submitted for identity verification.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct KycDocument {
    /// Identifier of the document.
    pub(crate) id: DocumentId,

    /// The driver that submitted the document.
    pub(crate) driver_id: DriverId,

    /// What the document proves.
    pub(crate) kind: DocumentKind,

    /// Where the document's file is stored.
    pub(crate) url: String,

    /// When the document was submitted.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_number_normalization() {
        assert_eq!("B-1234-XYZ", LicenseNumber::new(" b-1234-xyz ").unwrap().as_str());
    }

    #[test]
    fn test_license_number_errors() {
        assert!(LicenseNumber::new("abc").unwrap_err().0.contains("between"));
        assert!(LicenseNumber::new("x".repeat(MAX_LICENSE_LENGTH + 1)).is_err());
        assert!(LicenseNumber::new("AB 1234").unwrap_err().0.contains("letters, digits"));
    }

    #[test]
    fn test_nearby_driver_is_flat() {
        let nearby = NearbyDriver {
            driver: Driver {
                id: DriverId::new(3),
                user_id: UserId::new(8),
                license_number: LicenseNumber::new("SIM-0001").unwrap(),
                status: DriverStatus::Online,
                kyc_status: KycStatus::Approved,
                rating: None,
                rating_count: 0,
                latitude: Some(-6.2),
                longitude: Some(106.8),
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
            distance_meters: 12.5,
        };
        let json = serde_json::to_value(&nearby).unwrap();
        assert_eq!(3, json["id"]);
        assert_eq!("online", json["status"]);
        assert_eq!(12.5, json["distance_meters"]);
        assert_eq!(nearby, serde_json::from_value(json).unwrap());
    }
}
