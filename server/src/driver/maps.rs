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

//! Proxies to the mapping service.

use crate::driver::{AntaDriver, map_geo_error};
use anta_core::driver::{DriverError, DriverResult};
use anta_geo::{Coordinates, GeocodedPlace, PlaceSuggestion, Route};

impl AntaDriver {
    /// Finds the places that match `address`.
    pub(crate) async fn geocode(self, address: String) -> DriverResult<Vec<GeocodedPlace>> {
        let address = address.trim();
        if address.is_empty() {
            return Err(DriverError::InvalidInput("Address cannot be empty".to_owned()));
        }
        self.maps.geocode(address).await.map_err(map_geo_error)
    }

    /// Finds the addresses at `location`.
    pub(crate) async fn reverse_geocode(
        self,
        location: Coordinates,
    ) -> DriverResult<Vec<GeocodedPlace>> {
        self.maps.reverse_geocode(&location).await.map_err(map_geo_error)
    }

    /// Suggests places that complete `input`, preferring those close to `near` if given.
    pub(crate) async fn autocomplete(
        self,
        input: String,
        near: Option<Coordinates>,
    ) -> DriverResult<Vec<PlaceSuggestion>> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DriverError::InvalidInput("Input cannot be empty".to_owned()));
        }
        self.maps.autocomplete(input, near.as_ref()).await.map_err(map_geo_error)
    }

    /// Computes the driving route from `origin` to `destination`.
    pub(crate) async fn directions(
        self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> DriverResult<Route> {
        match self.maps.directions(&origin, &destination).await.map_err(map_geo_error)? {
            Some(route) => Ok(route),
            None => Err(DriverError::NotFound("No route found".to_owned())),
        }
    }
}
