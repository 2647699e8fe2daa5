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

//! Mapping service backed by the Google Maps web services.

use crate::{Coordinates, GeoResult, GeocodedPlace, MapsClient, PlaceSuggestion, Route};
use anta_core::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use bytes::{Buf, Bytes};
use derivative::Derivative;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io;
use std::time::Duration;

/// Default root of the Google Maps web services.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default timeout for each request to Google Maps.
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Radius in meters of the location bias applied to autocomplete queries.
const AUTOCOMPLETE_BIAS_RADIUS_METERS: u32 = 50_000;

/// Converts a `reqwest::Error` to an `io::Error`.
fn reqwest_error_to_io_error(e: reqwest::Error) -> io::Error {
    let kind = if e.is_timeout() { io::ErrorKind::TimedOut } else { io::ErrorKind::Other };
    io::Error::new(kind, format!("{}", e))
}

/// Converts a `reqwest::Response` with a non-OK status to an `io::Error`.
async fn http_response_to_io_error(response: Response) -> io::Error {
    let status = response.status();

    let kind = match status {
        StatusCode::BAD_REQUEST => io::ErrorKind::InvalidInput,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => io::ErrorKind::PermissionDenied,
        StatusCode::NOT_FOUND => io::ErrorKind::NotFound,
        _ => io::ErrorKind::Other,
    };

    match response.text().await {
        Ok(text) => io::Error::new(
            kind,
            format!("HTTP request returned status {} with text '{}'", status, text),
        ),
        Err(e) => io::Error::new(
            kind,
            format!("HTTP request returned status {} and failed to get text due to {}", status, e),
        ),
    }
}

/// Interprets the application-level `status` that Google embeds in every response.
///
/// Returns true if the response carries results and false if the query legitimately matched
/// nothing.
fn check_status(status: &str, error_message: Option<&str>) -> GeoResult<bool> {
    let detail = || match error_message {
        Some(message) => format!("Google Maps returned {}: {}", status, message),
        None => format!("Google Maps returned {}", status),
    };
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(false),
        "INVALID_REQUEST" | "MAX_WAYPOINTS_EXCEEDED" => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, detail()))
        }
        "REQUEST_DENIED" => Err(io::Error::new(io::ErrorKind::PermissionDenied, detail())),
        _ => Err(io::Error::new(io::ErrorKind::Other, detail())),
    }
}

/// Decodes a JSON response body.
fn decode<T: DeserializeOwned>(body: Bytes) -> GeoResult<T> {
    Ok(serde_json::from_reader(body.reader())?)
}

/// A scalar quantity as returned in route legs, like a distance or a duration.
#[derive(Deserialize)]
struct QuantityResponse {
    /// Value in base units (meters or seconds).
    value: u64,
}

/// One leg of a route.
#[derive(Deserialize)]
struct LegResponse {
    /// Length of the leg.
    distance: QuantityResponse,

    /// Travel time of the leg.
    duration: QuantityResponse,

    /// Address of the leg's starting point.
    #[serde(default)]
    start_address: String,

    /// Address of the leg's end point.
    #[serde(default)]
    end_address: String,
}

/// Encoded polyline of a route.
#[derive(Deserialize)]
struct PolylineResponse {
    /// The encoded points.
    points: String,
}

/// A route as returned by the directions API.
#[derive(Deserialize)]
struct RouteResponse {
    /// Short description of the route.
    #[serde(default)]
    summary: String,

    /// Overview of the route's shape.
    overview_polyline: PolylineResponse,

    /// Legs that make up the route.
    legs: Vec<LegResponse>,
}

/// Response of the directions API.
#[derive(Deserialize)]
struct DirectionsResponse {
    /// Application-level status.
    status: String,

    /// Details on failures.
    error_message: Option<String>,

    /// Candidate routes, best first.
    #[serde(default)]
    routes: Vec<RouteResponse>,
}

/// A latitude/longitude pair as returned by Google.
#[derive(Deserialize)]
struct LatLngResponse {
    /// Latitude in degrees.
    lat: f64,

    /// Longitude in degrees.
    lng: f64,
}

/// Geometry of a geocoding result.
#[derive(Deserialize)]
struct GeometryResponse {
    /// Location of the result.
    location: LatLngResponse,
}

/// A single geocoding result.
#[derive(Deserialize)]
struct GeocodeResultResponse {
    /// Human-readable address.
    formatted_address: String,

    /// Identifier of the place.
    place_id: String,

    /// Geometry of the place.
    geometry: GeometryResponse,
}

/// Response of the geocoding API, both forward and reverse.
#[derive(Deserialize)]
struct GeocodeResponse {
    /// Application-level status.
    status: String,

    /// Details on failures.
    error_message: Option<String>,

    /// Matching places.
    #[serde(default)]
    results: Vec<GeocodeResultResponse>,
}

/// A single autocomplete prediction.
#[derive(Deserialize)]
struct PredictionResponse {
    /// Human-readable description.
    description: String,

    /// Identifier of the place.
    place_id: String,
}

/// Response of the place autocomplete API.
#[derive(Deserialize)]
struct AutocompleteResponse {
    /// Application-level status.
    status: String,

    /// Details on failures.
    error_message: Option<String>,

    /// Suggested places.
    #[serde(default)]
    predictions: Vec<PredictionResponse>,
}

/// Parses the body of a directions response and returns its best route.
fn parse_directions(body: Bytes) -> GeoResult<Option<Route>> {
    let response: DirectionsResponse = decode(body)?;
    if !check_status(&response.status, response.error_message.as_deref())? {
        return Ok(None);
    }

    let Some(route) = response.routes.into_iter().next() else {
        return Ok(None);
    };
    let (Some(first), Some(last)) = (route.legs.first(), route.legs.last()) else {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "Route without legs"));
    };
    Ok(Some(Route {
        distance_meters: route.legs.iter().map(|leg| leg.distance.value).sum(),
        duration_seconds: route.legs.iter().map(|leg| leg.duration.value).sum(),
        polyline: route.overview_polyline.points,
        summary: route.summary,
        start_address: first.start_address.clone(),
        end_address: last.end_address.clone(),
    }))
}

/// Parses the body of a geocoding response.
fn parse_geocode(body: Bytes) -> GeoResult<Vec<GeocodedPlace>> {
    let response: GeocodeResponse = decode(body)?;
    if !check_status(&response.status, response.error_message.as_deref())? {
        return Ok(vec![]);
    }

    let mut places = Vec::with_capacity(response.results.len());
    for result in response.results {
        let location = result.geometry.location;
        places.push(GeocodedPlace {
            formatted_address: result.formatted_address,
            place_id: result.place_id,
            location: Coordinates::new(location.lat, location.lng).map_err(|e| {
                let msg = format!("Bad location in response: {}", e);
                io::Error::new(io::ErrorKind::InvalidData, msg)
            })?,
        });
    }
    Ok(places)
}

/// Parses the body of an autocomplete response.
fn parse_autocomplete(body: Bytes) -> GeoResult<Vec<PlaceSuggestion>> {
    let response: AutocompleteResponse = decode(body)?;
    if !check_status(&response.status, response.error_message.as_deref())? {
        return Ok(vec![]);
    }

    Ok(response
        .predictions
        .into_iter()
        .map(|p| PlaceSuggestion { description: p.description, place_id: p.place_id })
        .collect())
}

/// Options to configure a `GoogleMapsClient`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct GoogleMapsClientOptions {
    /// The API key to use to contact Google Maps.
    #[derivative(Debug = "ignore")]
    pub key: String,

    /// Maximum time to wait for each request.
    pub timeout: Duration,

    /// Root URL of the web services, without a trailing slash.
    pub base_url: String,
}

impl GoogleMapsClientOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_KEY`, `<prefix>_TIMEOUT` and `<prefix>_BASE_URL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            key: get_required_var::<String>(prefix, "KEY")?,
            timeout: get_optional_var::<Duration>(prefix, "TIMEOUT")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)),
            base_url: get_optional_var::<String>(prefix, "BASE_URL")?
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }
}

/// Mapping service backed by a Google Maps account.
#[derive(Clone)]
pub struct GoogleMapsClient {
    /// Google Maps API key.
    key: String,

    /// Root URL of the web services.
    base_url: String,

    /// Asynchronous HTTP client with which to issue the service requests.
    client: Client,
}

impl GoogleMapsClient {
    /// Creates a new client using `opts` for configuration.
    pub fn new(opts: GoogleMapsClientOptions) -> GeoResult<Self> {
        let client =
            Client::builder().timeout(opts.timeout).build().map_err(reqwest_error_to_io_error)?;
        Ok(Self { key: opts.key, base_url: opts.base_url, client })
    }

    /// Issues a GET request against the `path` web service with `query` parameters and returns
    /// the raw body of a successful response.
    async fn get(&self, path: &str, query: &[(&str, String)]) -> GeoResult<Bytes> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .query(&[("key", self.key.as_str())])
            .send()
            .await
            .map_err(reqwest_error_to_io_error)?;
        match response.status() {
            StatusCode::OK => response.bytes().await.map_err(reqwest_error_to_io_error),
            _ => Err(http_response_to_io_error(response).await),
        }
    }
}

#[async_trait]
impl MapsClient for GoogleMapsClient {
    async fn directions(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
    ) -> GeoResult<Option<Route>> {
        let query = [
            ("origin", origin.to_string()),
            ("destination", destination.to_string()),
            ("mode", "driving".to_owned()),
        ];
        parse_directions(self.get("directions/json", &query).await?)
    }

    async fn geocode(&self, address: &str) -> GeoResult<Vec<GeocodedPlace>> {
        let query = [("address", address.to_owned())];
        parse_geocode(self.get("geocode/json", &query).await?)
    }

    async fn reverse_geocode(&self, location: &Coordinates) -> GeoResult<Vec<GeocodedPlace>> {
        let query = [("latlng", location.to_string())];
        parse_geocode(self.get("geocode/json", &query).await?)
    }

    async fn autocomplete(
        &self,
        input: &str,
        near: Option<&Coordinates>,
    ) -> GeoResult<Vec<PlaceSuggestion>> {
        let mut query = vec![("input", input.to_owned())];
        if let Some(near) = near {
            query.push(("location", near.to_string()));
            query.push(("radius", AUTOCOMPLETE_BIAS_RADIUS_METERS.to_string()));
        }
        parse_autocomplete(self.get("place/autocomplete/json", &query).await?)
    }
}
