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

//! Business logic for the ride-hailing service.

use crate::db;
use crate::db::crud;
use crate::model::{Role, User, UserId, UserStatus};
use anta_core::clocks::Clock;
use anta_core::db::{Db, DbError, Executor};
use anta_core::driver::{DriverError, DriverResult};
use anta_core::env::get_optional_var;
use anta_geo::MapsClient;
use derivative::Derivative;
use log::warn;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod admin;
mod drivers;
mod maps;
mod otp;
mod payments;
mod promos;
#[cfg(test)]
pub(crate) mod testutils;
mod trips;
mod users;
mod vehicles;
mod zones;

pub(crate) use drivers::{DEFAULT_NEARBY_LIMIT, DEFAULT_NEARBY_RADIUS_METERS};
pub(crate) use trips::TripFilters;
pub(crate) use users::UserUpdate;

/// Default value for the `OTP_TTL` setting when not specified.
const DEFAULT_OTP_TTL_SECONDS: u64 = 5 * 60;

/// Default value for the `OTP_WINDOW` setting when not specified.
const DEFAULT_OTP_WINDOW_SECONDS: u64 = 60 * 60;

/// Default value for the `OTP_MAX_PER_WINDOW` setting when not specified.
const DEFAULT_OTP_MAX_PER_WINDOW: u32 = 5;

/// Default value for the `AVERAGE_SPEED_KMH` setting when not specified.
const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

/// Configuration options for the business logic.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct AntaOptions {
    /// How long one-time passwords remain valid after being issued.
    pub otp_ttl: Duration,

    /// Length of the window over which one-time password requests are counted.
    pub otp_window: Duration,

    /// Maximum number of one-time passwords a phone can request within `otp_window`.
    pub otp_max_per_window: u32,

    /// Speed used to estimate trip durations when the mapping service cannot compute a route.
    pub average_speed_kmh: f64,
}

impl Default for AntaOptions {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::from_secs(DEFAULT_OTP_TTL_SECONDS),
            otp_window: Duration::from_secs(DEFAULT_OTP_WINDOW_SECONDS),
            otp_max_per_window: DEFAULT_OTP_MAX_PER_WINDOW,
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl AntaOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_OTP_TTL` and `<prefix>_AVERAGE_SPEED_KMH`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let opts = Self {
            otp_ttl: get_optional_var::<Duration>(prefix, "OTP_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_OTP_TTL_SECONDS)),
            otp_window: get_optional_var::<Duration>(prefix, "OTP_WINDOW")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_OTP_WINDOW_SECONDS)),
            otp_max_per_window: get_optional_var::<u32>(prefix, "OTP_MAX_PER_WINDOW")?
                .unwrap_or(DEFAULT_OTP_MAX_PER_WINDOW),
            average_speed_kmh: get_optional_var::<f64>(prefix, "AVERAGE_SPEED_KMH")?
                .unwrap_or(DEFAULT_AVERAGE_SPEED_KMH),
        };
        if opts.otp_max_per_window == 0 {
            return Err(format!("{}_OTP_MAX_PER_WINDOW must be positive", prefix));
        }
        if !opts.average_speed_kmh.is_finite() || opts.average_speed_kmh <= 0.0 {
            return Err(format!("{}_AVERAGE_SPEED_KMH must be positive", prefix));
        }
        Ok(opts)
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub struct AntaDriver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Mapping service used for routes and geocoding.
    maps: Arc<dyn MapsClient + Send + Sync>,

    /// Options for the business logic.
    opts: AntaOptions,
}

impl AntaDriver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        maps: Arc<dyn MapsClient + Send + Sync>,
        opts: AntaOptions,
    ) -> Self {
        Self { db, clock, maps, opts }
    }
}

/// Returns a converter from `DbError` to `DriverError` that replaces the generic not found
/// message with `message`.
fn not_found<S: Into<String>>(message: S) -> impl FnOnce(DbError) -> DriverError {
    let message = message.into();
    move |e| match e {
        DbError::NotFound => DriverError::NotFound(message),
        e => e.into(),
    }
}

/// Converts a failure from the mapping service into a driver error.
fn map_geo_error(e: io::Error) -> DriverError {
    match e.kind() {
        io::ErrorKind::InvalidInput => DriverError::InvalidInput(e.to_string()),
        _ => {
            warn!("Mapping service failure: {}", e);
            DriverError::BackendError(format!("Mapping service failure: {}", e))
        }
    }
}

/// Checks that `admin_id` refers to an active admin and returns it.
async fn require_admin(ex: &mut Executor, admin_id: UserId) -> DriverResult<User> {
    let admin = match crud::get::<User>(ex, admin_id.as_i64()).await {
        Ok(user) => user,
        Err(DbError::NotFound) => {
            return Err(DriverError::Forbidden(format!("User {} is not an admin", admin_id)));
        }
        Err(e) => return Err(e.into()),
    };
    if admin.role != Role::Admin || admin.status != UserStatus::Active {
        return Err(DriverError::Forbidden(format!("User {} is not an admin", admin_id)));
    }
    Ok(admin)
}

/// Records that `admin` performed `action` on an entity.
async fn log_admin_action(
    ex: &mut Executor,
    admin: &User,
    action: &str,
    entity: &str,
    entity_id: Option<i64>,
    details: Option<String>,
    now: OffsetDateTime,
) -> DriverResult<()> {
    db::create_admin_log(ex, admin.id, action, entity, entity_id, details, now).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_options_from_env_all_present() {
        let overrides = [
            ("ANTA_OTP_TTL", Some("2m")),
            ("ANTA_OTP_WINDOW", Some("30m")),
            ("ANTA_OTP_MAX_PER_WINDOW", Some("3")),
            ("ANTA_AVERAGE_SPEED_KMH", Some("22.5")),
        ];
        temp_env::with_vars(overrides, || {
            let opts = AntaOptions::from_env("ANTA").unwrap();
            assert_eq!(
                AntaOptions {
                    otp_ttl: Duration::from_secs(2 * 60),
                    otp_window: Duration::from_secs(30 * 60),
                    otp_max_per_window: 3,
                    average_speed_kmh: 22.5,
                },
                opts
            );
        });
    }

    #[test]
    pub fn test_options_from_env_use_defaults() {
        let overrides = [
            "ANTA_OTP_TTL",
            "ANTA_OTP_WINDOW",
            "ANTA_OTP_MAX_PER_WINDOW",
            "ANTA_AVERAGE_SPEED_KMH",
        ];
        temp_env::with_vars_unset(overrides, || {
            let opts = AntaOptions::from_env("ANTA").unwrap();
            assert_eq!(AntaOptions::default(), opts);
        });
    }

    #[test]
    pub fn test_options_from_env_bad_values() {
        temp_env::with_vars([("ANTA_OTP_MAX_PER_WINDOW", Some("0"))], || {
            let err = AntaOptions::from_env("ANTA").unwrap_err();
            assert!(err.contains("ANTA_OTP_MAX_PER_WINDOW"));
        });
        temp_env::with_vars([("ANTA_AVERAGE_SPEED_KMH", Some("-1"))], || {
            let err = AntaOptions::from_env("ANTA").unwrap_err();
            assert!(err.contains("ANTA_AVERAGE_SPEED_KMH"));
        });
        temp_env::with_vars([("ANTA_OTP_TTL", Some("soon"))], || {
            AntaOptions::from_env("ANTA").unwrap_err();
        });
    }

    #[test]
    fn test_map_geo_error() {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "Bad address");
        assert_eq!(DriverError::InvalidInput("Bad address".to_owned()), map_geo_error(err));

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Denied");
        assert_eq!(
            DriverError::BackendError("Mapping service failure: Denied".to_owned()),
            map_geo_error(err)
        );
    }
}
