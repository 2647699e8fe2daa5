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

//! Wrapper over a mapping service to offer caching of query results.

use crate::{Coordinates, GeoResult, GeocodedPlace, MapsClient, PlaceSuggestion, Route};
use anta_core::env::get_optional_var;
use async_trait::async_trait;
use derivative::Derivative;
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum amount of time to keep cached entries in memory.
const DEFAULT_TTL_SECONDS: u64 = 60 * 60;

/// Default maximum number of responses to keep cached in memory, per operation.
const DEFAULT_CAPACITY: usize = 10 * 1024;

/// Options to configure a `CachingMapsClient`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct CachingMapsClientOptions {
    /// The TTL for the entries in the cache.
    pub ttl: Duration,

    /// The capacity of each per-operation cache in number of entries.
    pub capacity: usize,
}

impl Default for CachingMapsClientOptions {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(DEFAULT_TTL_SECONDS), capacity: DEFAULT_CAPACITY }
    }
}

impl CachingMapsClientOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_TTL` and `<prefix>_CAPACITY`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            ttl: get_optional_var::<Duration>(prefix, "TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TTL_SECONDS)),
            capacity: get_optional_var::<usize>(prefix, "CAPACITY")?.unwrap_or(DEFAULT_CAPACITY),
        })
    }
}

/// Shared cache of successful responses for one operation.
type Cache<K, V> = Arc<Mutex<LruCache<K, V>>>;

/// Key of the autocomplete cache: the raw input plus the optional location bias.
type AutocompleteKey = (String, Option<String>);

/// Creates an empty cache configured by `opts`.
fn new_cache<K: Clone + Ord, V>(opts: &CachingMapsClientOptions) -> Cache<K, V> {
    Arc::from(Mutex::from(LruCache::with_expiry_duration_and_capacity(opts.ttl, opts.capacity)))
}

/// Returns the value cached under `key` or awaits `fetch` and caches its result on success.
async fn cached<K, V, F>(cache: &Mutex<LruCache<K, V>>, key: K, fetch: F) -> GeoResult<V>
where
    K: Clone + Ord,
    V: Clone + Debug + PartialEq,
    F: Future<Output = GeoResult<V>>,
{
    {
        let mut cache = cache.lock().await;
        if let Some(value) = cache.get(&key) {
            return Ok(value.clone());
        };
    }

    let value = fetch.await?;

    let mut cache = cache.lock().await;
    if let Some(old_value) = cache.insert(key, value.clone()) {
        if old_value != value {
            warn!(
                "Cache insertion race detected with inconsistent values: {:?} != {:?}",
                old_value, value
            );
        }
    }
    Ok(value)
}

/// Mapping service that remembers the answers of another one.
#[derive(Clone)]
pub struct CachingMapsClient<M> {
    /// The wrapped mapping service.
    delegee: M,

    /// Cache of directions keyed by origin and destination.
    directions: Cache<String, Option<Route>>,

    /// Cache of forward geocoding results keyed by address.
    geocode: Cache<String, Vec<GeocodedPlace>>,

    /// Cache of reverse geocoding results keyed by location.
    reverse_geocode: Cache<String, Vec<GeocodedPlace>>,

    /// Cache of autocomplete results keyed by input and bias.
    autocomplete: Cache<AutocompleteKey, Vec<PlaceSuggestion>>,
}

impl<M> CachingMapsClient<M> {
    /// Creates a new caching client that wraps `delegee` using `opts` for configuration.
    pub fn new(opts: CachingMapsClientOptions, delegee: M) -> Self {
        Self {
            delegee,
            directions: new_cache(&opts),
            geocode: new_cache(&opts),
            reverse_geocode: new_cache(&opts),
            autocomplete: new_cache(&opts),
        }
    }
}

#[async_trait]
impl<M> MapsClient for CachingMapsClient<M>
where
    M: MapsClient + Send + Sync,
{
    async fn directions(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> GeoResult<Option<Route>> {
        let key = format!("{}|{}", origin, destination);
        cached(&self.directions, key, self.delegee.directions(origin, destination)).await
    }

    async fn geocode(&self, address: &str) -> GeoResult<Vec<GeocodedPlace>> {
        cached(&self.geocode, address.to_owned(), self.delegee.geocode(address)).await
    }

    async fn reverse_geocode(&self, location: &Coordinates) -> GeoResult<Vec<GeocodedPlace>> {
        let key = location.to_string();
        cached(&self.reverse_geocode, key, self.delegee.reverse_geocode(location)).await
    }

    async fn autocomplete(
        &self,
        input: &str,
        near: Option<&Coordinates>,
    ) -> GeoResult<Vec<PlaceSuggestion>> {
        let key = (input.to_owned(), near.map(Coordinates::to_string));
        cached(&self.autocomplete, key, self.delegee.autocomplete(input, near)).await
    }
}
