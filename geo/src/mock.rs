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

//! Mapping service backed by in-memory tables for testing purposes.

use crate::{Coordinates, GeoResult, GeocodedPlace, MapsClient, PlaceSuggestion, Route};
use async_trait::async_trait;
use futures::lock::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

/// Mapping service that answers from preloaded tables and counts the queries it receives.
///
/// Queries are counted by key: the address for `geocode`, the input for `autocomplete`, the
/// formatted coordinates for `reverse_geocode`, and `origin->destination` for `directions`.
#[derive(Clone, Default)]
pub struct MockMapsClient {
    /// Known routes keyed by `origin->destination`.
    routes: HashMap<String, Route>,

    /// Known forward geocoding results keyed by address.
    places: HashMap<String, Vec<GeocodedPlace>>,

    /// Known reverse geocoding results keyed by formatted coordinates.
    addresses: HashMap<String, Vec<GeocodedPlace>>,

    /// Known autocomplete results keyed by input.
    suggestions: HashMap<String, Vec<PlaceSuggestion>>,

    /// Whether every query should fail as if the service were down.
    unavailable: bool,

    /// Number of times each key has been queried.
    queries: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockMapsClient {
    /// Address or autocomplete input that makes the mock return an error.
    pub const RETURN_ERROR: &'static str = "return-error";

    /// Creates a new mock that knows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the key under which a directions query is recorded.
    pub fn directions_key(origin: &Coordinates, destination: &Coordinates) -> String {
        format!("{}->{}", origin, destination)
    }

    /// Registers `route` as the answer for directions between `origin` and `destination`.
    pub fn with_route(
        mut self,
        origin: Coordinates,
        destination: Coordinates,
        route: Route,
    ) -> Self {
        self.routes.insert(Self::directions_key(&origin, &destination), route);
        self
    }

    /// Registers `places` as the answer for geocoding `address`.
    pub fn with_places<S: Into<String>>(mut self, address: S, places: Vec<GeocodedPlace>) -> Self {
        self.places.insert(address.into(), places);
        self
    }

    /// Registers `places` as the answer for reverse geocoding `location`.
    pub fn with_addresses(mut self, location: Coordinates, places: Vec<GeocodedPlace>) -> Self {
        self.addresses.insert(location.to_string(), places);
        self
    }

    /// Registers `suggestions` as the answer for autocompleting `input`.
    pub fn with_suggestions<S: Into<String>>(
        mut self,
        input: S,
        suggestions: Vec<PlaceSuggestion>,
    ) -> Self {
        self.suggestions.insert(input.into(), suggestions);
        self
    }

    /// Makes every query fail.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Returns the number of times `key` has been queried.
    pub async fn query_count(&self, key: &str) -> usize {
        let queries = self.queries.lock().await;
        queries.get(key).copied().unwrap_or(0)
    }

    /// Records a query for `key` and fails if the mock has been told to.
    async fn record(&self, key: &str) -> GeoResult<()> {
        {
            let mut queries = self.queries.lock().await;
            *queries.entry(key.to_owned()).or_insert(0) += 1;
        }
        if self.unavailable || key == Self::RETURN_ERROR {
            return Err(io::Error::new(io::ErrorKind::Other, "Mock maps service failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl MapsClient for MockMapsClient {
    async fn directions(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> GeoResult<Option<Route>> {
        let key = Self::directions_key(origin, destination);
        self.record(&key).await?;
        Ok(self.routes.get(&key).cloned())
    }

    async fn geocode(&self, address: &str) -> GeoResult<Vec<GeocodedPlace>> {
        self.record(address).await?;
        Ok(self.places.get(address).cloned().unwrap_or_default())
    }

    async fn reverse_geocode(&self, location: &Coordinates) -> GeoResult<Vec<GeocodedPlace>> {
        let key = location.to_string();
        self.record(&key).await?;
        Ok(self.addresses.get(&key).cloned().unwrap_or_default())
    }

    async fn autocomplete(
        &self,
        input: &str,
        _near: Option<&Coordinates>,
    ) -> GeoResult<Vec<PlaceSuggestion>> {
        self.record(input).await?;
        Ok(self.suggestions.get(input).cloned().unwrap_or_default())
    }
}
