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

//! Geographic coordinates, great-circle distances and access to mapping services.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

mod caching;
pub use caching::{CachingMapsClient, CachingMapsClientOptions};
mod google;
pub use google::{GoogleMapsClient, GoogleMapsClientOptions};
#[cfg(any(test, feature = "testutils"))]
mod mock;
#[cfg(any(test, feature = "testutils"))]
pub use mock::MockMapsClient;

/// Result type for this module.
pub type GeoResult<T> = io::Result<T>;

/// Mean radius of the Earth used for great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Raw representation of `Coordinates` before validation.
#[derive(Deserialize)]
struct RawCoordinates {
    /// Latitude in degrees.
    latitude: f64,

    /// Longitude in degrees.
    longitude: f64,
}

/// A validated point on the Earth's surface, in degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    /// Latitude in degrees, within [-90, 90].
    latitude: f64,

    /// Longitude in degrees, within [-180, 180].
    longitude: f64,
}

impl Coordinates {
    /// Creates a new point after checking that both components are finite and within range.
    pub fn new(latitude: f64, longitude: f64) -> GeoResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Latitude {} must be between -90 and 90", latitude),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Longitude {} must be between -180 and 180", longitude),
            ));
        }
        Ok(Self { latitude, longitude })
    }

    /// Returns the latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = io::Error;

    fn try_from(raw: RawCoordinates) -> GeoResult<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

/// Formats the point as `lat,lng`, which is what mapping services expect in query strings.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Computes the great-circle distance in meters between `a` and `b` using the spherical law of
/// cosines.
///
/// The argument to `acos` is clamped to [-1, 1] so that rounding errors on identical or
/// antipodal points cannot produce NaN.
pub fn distance_meters(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let cos_angle = lat1.cos() * lat2.cos() * delta_lng.cos() + lat1.sin() * lat2.sin();
    EARTH_RADIUS_METERS * cos_angle.clamp(-1.0, 1.0).acos()
}

/// A driving route between two points.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Route {
    /// Length of the route in meters.
    pub distance_meters: u64,

    /// Expected travel time in seconds.
    pub duration_seconds: u64,

    /// Encoded polyline of the route's overview.
    pub polyline: String,

    /// Short description of the route, typically the main road.
    pub summary: String,

    /// Address of the starting point.
    pub start_address: String,

    /// Address of the end point.
    pub end_address: String,
}

/// A place resolved from an address or from coordinates.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeocodedPlace {
    /// Human-readable address.
    pub formatted_address: String,

    /// Provider identifier of the place.
    pub place_id: String,

    /// Location of the place.
    pub location: Coordinates,
}

/// A place suggested while the user types an address.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlaceSuggestion {
    /// Human-readable description of the place.
    pub description: String,

    /// Provider identifier of the place.
    pub place_id: String,
}

/// Interface to a mapping service.
#[async_trait]
pub trait MapsClient {
    /// Computes a driving route from `origin` to `destination`, if one exists.
    async fn directions(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> GeoResult<Option<Route>>;

    /// Resolves a free-form `address` into candidate places.
    async fn geocode(&self, address: &str) -> GeoResult<Vec<GeocodedPlace>>;

    /// Resolves a `location` into the addresses found there.
    async fn reverse_geocode(&self, location: &Coordinates) -> GeoResult<Vec<GeocodedPlace>>;

    /// Suggests places matching the partial `input`, optionally biased towards `near`.
    async fn autocomplete(
        &self,
        input: &str,
        near: Option<&Coordinates>,
    ) -> GeoResult<Vec<PlaceSuggestion>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_ser_tokens};

    #[test]
    fn test_coordinates_ok() {
        let point = Coordinates::new(-6.1754, 106.8272).unwrap();
        assert_eq!(-6.1754, point.latitude());
        assert_eq!(106.8272, point.longitude());
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_coordinates_out_of_range() {
        for (lat, lng) in [
            (90.1, 0.0),
            (-90.1, 0.0),
            (0.0, 180.1),
            (0.0, -180.1),
            (f64::NAN, 0.0),
            (0.0, f64::INFINITY),
        ] {
            let err = Coordinates::new(lat, lng).unwrap_err();
            assert_eq!(io::ErrorKind::InvalidInput, err.kind());
        }
    }

    #[test]
    fn test_coordinates_display() {
        let monas = Coordinates::new(-6.1754, 106.8272).unwrap();
        assert_eq!("-6.175400,106.827200", monas.to_string());
    }

    #[test]
    fn test_coordinates_ser() {
        let point = Coordinates::new(1.5, -2.25).unwrap();
        assert_ser_tokens(
            &point,
            &[
                Token::Struct { name: "Coordinates", len: 2 },
                Token::Str("latitude"),
                Token::F64(1.5),
                Token::Str("longitude"),
                Token::F64(-2.25),
                Token::StructEnd,
            ],
        );
    }

    #[test]
    fn test_coordinates_de() {
        let point: Coordinates =
            serde_json::from_str(r#"{"latitude": 1.5, "longitude": -2.25}"#).unwrap();
        assert_eq!(Coordinates::new(1.5, -2.25).unwrap(), point);

        let err = serde_json::from_str::<Coordinates>(r#"{"latitude": 91, "longitude": 0}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Latitude 91 must be between -90 and 90"));
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let point = Coordinates::new(-6.1754, 106.8272).unwrap();
        assert!(distance_meters(&point, &point) < 0.5);
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let a = Coordinates::new(0.0, 20.0).unwrap();
        let b = Coordinates::new(1.0, 20.0).unwrap();
        let expected = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;
        assert!((distance_meters(&a, &b) - expected).abs() < 1.0);
    }

    #[test]
    fn test_distance_is_symmetric_and_realistic() {
        let monas = Coordinates::new(-6.1754, 106.8272).unwrap();
        let bundaran_hi = Coordinates::new(-6.1950, 106.8230).unwrap();
        let d1 = distance_meters(&monas, &bundaran_hi);
        let d2 = distance_meters(&bundaran_hi, &monas);
        assert!((d1 - d2).abs() < 0.001);
        assert!((2200.0..2260.0).contains(&d1), "Unexpected distance {}", d1);
    }

    #[test]
    fn test_distance_antipodes() {
        let a = Coordinates::new(0.0, 0.0).unwrap();
        let b = Coordinates::new(0.0, 180.0).unwrap();
        let expected = EARTH_RADIUS_METERS * std::f64::consts::PI;
        assert!((distance_meters(&a, &b) - expected).abs() < 1.0);
    }
}
