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

//! Generic code for REST handlers.
//!
//! All services should implement an `app` function in their `rest` module that returns the
//! `Router` for the application.
//!
//! Every API should be put in its own `.rs` file, using a name like `<entity>_<method>.rs`, so
//! that the integration tests for an API live next to it.  The `tests` module within an API should
//! define a `route` function that returns the HTTP method and path under test, and all tests in
//! the module should rely on it.
//!
//! Every response, successful or not, is wrapped in the same JSON envelope:
//!
//! ```json
//! { "success": true, "data": { ... }, "error": null, "meta": null }
//! ```
//!
//! `error` carries a machine-readable `code` and a human-readable `message` on failures, and
//! `meta` carries pagination details on list responses.  The extractors in this module reject
//! malformed requests with the same envelope instead of axum's plain-text rejections.

use crate::driver::DriverError;
use crate::model::{ModelError, Page, PageMeta};
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use log::error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// The request conflicts with the current state of the resource.
    #[error("{0}")]
    Conflict(String),

    /// The caller is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Catch-all for unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// The request is malformed.
    #[error("{0}")]
    InvalidRequest(String),

    /// A requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// The caller failed to authenticate.
    #[error("{0}")]
    Unauthorized(String),
}

impl RestError {
    /// Returns the HTTP status code and envelope error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            RestError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            RestError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            RestError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            RestError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            RestError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            RestError::PayloadNotEmpty => (StatusCode::PAYLOAD_TOO_LARGE, "BAD_REQUEST"),
            RestError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::Forbidden(_) => RestError::Forbidden(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::InvalidState(_) => RestError::Conflict(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::Unauthorized(_) => RestError::Unauthorized(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if let RestError::InternalError(message) = &self {
            error!("Request failed with internal error: {}", message);
        }

        let envelope = Envelope::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody { code: code.to_owned(), message: self.to_string() }),
            meta: None,
        };
        (status, Json(envelope)).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Details of a failed request.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code, like `NOT_FOUND`.
    pub code: String,

    /// Human-readable description of the problem.
    pub message: String,
}

/// The JSON envelope wrapping every response.
#[derive(Debug, Deserialize, Serialize)]
pub struct Envelope<T> {
    /// Whether the request succeeded.
    pub success: bool,

    /// Payload of a successful request.
    pub data: Option<T>,

    /// Details of a failed request.
    pub error: Option<ErrorBody>,

    /// Pagination details for list responses.
    pub meta: Option<PageMeta>,
}

/// A successful response carrying `T` as its payload.
#[must_use]
pub struct ApiResponse<T> {
    /// HTTP status code of the response.
    status: StatusCode,

    /// Body of the response.
    envelope: Envelope<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a successful response with `status` and an optional payload.
    fn new(status: StatusCode, data: Option<T>, meta: Option<PageMeta>) -> Self {
        Self { status, envelope: Envelope { success: true, data, error: None, meta } }
    }

    /// A `200 OK` response with `data`.
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, Some(data), None)
    }

    /// A `201 Created` response with the newly-created `data`.
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, Some(data), None)
    }
}

impl ApiResponse<()> {
    /// A `200 OK` response without payload.
    pub fn empty() -> Self {
        Self::new(StatusCode::OK, None, None)
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// A `200 OK` response with the items of `page` and its pagination metadata.
    pub fn page(page: Page<T>) -> Self {
        Self::new(StatusCode::OK, Some(page.items), Some(page.meta))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// A request body extractor that forbids any content.
///
/// APIs that don't expect a body use this to reject garbage we would otherwise silently ignore.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// A JSON body extractor whose rejections are reported with the error envelope.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(e) => Err(RestError::InvalidRequest(e.body_text())),
        }
    }
}

/// A query string extractor whose rejections are reported with the error envelope.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(e) => Err(RestError::InvalidRequest(e.body_text())),
        }
    }
}

/// A path parameters extractor whose rejections are reported with the error envelope.
pub struct PathParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParams(value)),
            Err(e) => Err(RestError::InvalidRequest(e.body_text())),
        }
    }
}

/// Common test code for the REST server.
#[cfg(feature = "testutils")]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::http::{self, HeaderName, HeaderValue};
    use tower::util::ServiceExt;

    /// Maximum body size for testing purposes.
    const MAX_BODY_SIZE: usize = 1024 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Extends the URI in the request with a `query`.
        pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
            let uri = self.builder.uri_ref().unwrap().to_string();
            assert!(!uri.contains('?'), "URI already contains a query: {}", uri);
            self.builder = self.builder.uri(format!(
                "{}?{}",
                uri,
                serde_urlencoded::to_string(query).unwrap()
            ));
            self
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        ///
        /// The content type defaults to plain text unless a previous `with_header` set one.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            let mut builder = self.builder;
            let has_content_type = builder
                .headers_ref()
                .is_some_and(|headers| headers.contains_key(http::header::CONTENT_TYPE));
            if !has_content_type {
                builder = builder.header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref());
            }
            let request = builder.body(axum::body::Body::from(text.into())).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }
    }

    /// Type alias for the complex type returned by the `oneshot` function.
    type HttpResponse = hyper::Response<axum::body::Body>;

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: HttpResponse,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<HttpResponse> for ResponseChecker {
        fn from(response: HttpResponse) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Validates the status code and decodes the envelope carrying a payload of type `T`.
        async fn take_envelope<T: DeserializeOwned>(self) -> Envelope<T> {
            let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE)
                .await
                .unwrap();
            match serde_json::from_slice::<Envelope<T>>(&body) {
                Ok(envelope) => envelope,
                Err(e) => {
                    let body = String::from_utf8_lossy(&body);
                    panic!("Invalid envelope due to {}; content was {}", e, body);
                }
            }
        }

        /// Asserts that the response has the expected status code.
        fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Finishes checking the response and expects a successful envelope with a payload of type
        /// `T`, which is returned.
        pub async fn expect_data<T: DeserializeOwned>(self) -> T {
            self.verify();
            let envelope = self.take_envelope::<T>().await;
            assert!(envelope.success, "Request failed with {:?}", envelope.error);
            assert!(envelope.meta.is_none(), "Unexpected pagination metadata");
            envelope.data.expect("Successful envelope without data")
        }

        /// Finishes checking the response and expects a successful envelope without payload.
        pub async fn expect_success(self) {
            self.verify();
            let envelope = self.take_envelope::<serde_json::Value>().await;
            assert!(envelope.success, "Request failed with {:?}", envelope.error);
            assert!(envelope.data.is_none(), "Unexpected data {:?}", envelope.data);
        }

        /// Finishes checking the response and expects a paginated list of `T`.
        pub async fn expect_page<T: DeserializeOwned>(self) -> (Vec<T>, PageMeta) {
            self.verify();
            let envelope = self.take_envelope::<Vec<T>>().await;
            assert!(envelope.success, "Request failed with {:?}", envelope.error);
            (
                envelope.data.expect("Successful envelope without data"),
                envelope.meta.expect("Paginated envelope without metadata"),
            )
        }

        /// Finishes checking the response and expects an error envelope with `exp_code` and a
        /// message that matches `exp_re`.
        pub async fn expect_error(self, exp_code: &str, exp_re: &str) {
            self.verify();
            let envelope = self.take_envelope::<serde_json::Value>().await;
            assert!(!envelope.success, "Request unexpectedly succeeded");
            assert!(envelope.data.is_none(), "Error envelope with data {:?}", envelope.data);
            let error = envelope.error.expect("Failed envelope without error details");
            assert_eq!(exp_code, error.code, "Unexpected code in {:?}", error);
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&error.message),
                "Error message '{}' does not match re '{}'",
                error.message,
                exp_re
            );
        }
    }

    /// Generates a test to verify that an API that expects JSON fails when it gets something else.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("BAD_REQUEST", "Content-Type")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("BAD_REQUEST", "expected ident")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test to verify that an API that does not expect a payload fails as necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr $(, $query:expr)? ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    $( .with_query($query) )?
                    .send_text("should not be here")
                    .await
                    .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                    .expect_error("BAD_REQUEST", "should be empty")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;
}
