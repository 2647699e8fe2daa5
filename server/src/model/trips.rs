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

//! Trips and their ratings.

use crate::model::{DriverId, PromoCodeName, RatingId, TripId, TripStatus, UserId, ZoneId};
use anta_core::model::{ModelError, ModelResult};
use anta_geo::Coordinates;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum number of characters in a rating comment.
const MAX_COMMENT_CHARS: usize = 500;

/// A ride from an origin to a destination.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Trip {
    /// Identifier of the trip.
    pub(crate) id: TripId,

    /// The user that requested the trip.
    pub(crate) rider_id: UserId,

    /// The driver serving the trip, once accepted.
    pub(crate) driver_id: Option<DriverId>,

    /// The zone whose rates priced the trip.
    pub(crate) zone_id: ZoneId,

    /// Pickup point.
    pub(crate) origin: Coordinates,

    /// Drop-off point.
    pub(crate) destination: Coordinates,

    /// Current state.
    pub(crate) status: TripStatus,

    /// Estimated route length.
    pub(crate) distance_meters: i64,

    /// Estimated travel time.
    pub(crate) duration_seconds: i64,

    /// Fare before discounts.
    pub(crate) fare_cents: i64,

    /// Discount granted by a promo code.
    pub(crate) discount_cents: i64,

    /// The promo code redeemed for this trip, if any.
    pub(crate) promo_code: Option<PromoCodeName>,

    /// When the trip was requested.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,

    /// When the trip last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

impl Trip {
    /// Amount the rider owes for the trip.
    pub(crate) fn amount_due_cents(&self) -> i64 {
        self.fare_cents - self.discount_cents
    }
}

/// A score given to a driver, from 1 to 5.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "i64", into = "i64")]
pub(crate) struct Score(i64);

impl Score {
    /// Creates a new score after checking its range.
    pub(crate) fn new(score: i64) -> ModelResult<Self> {
        if !(1..=5).contains(&score) {
            return Err(ModelError(format!("Score {} must be between 1 and 5", score)));
        }
        Ok(Self(score))
    }

    /// Returns the score as a number.
    pub(crate) fn as_i64(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ModelError;

    fn try_from(value: i64) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<Score> for i64 {
    fn from(value: Score) -> Self {
        value.0
    }
}

/// A rider's rating of the driver of a completed trip.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Rating {
    /// Identifier of the rating.
    pub(crate) id: RatingId,

    /// The rated trip.  Each trip can be rated once.
    pub(crate) trip_id: TripId,

    /// The user that gave the rating.
    pub(crate) rater_id: UserId,

    /// The rated driver.
    pub(crate) driver_id: DriverId,

    /// The score.
    pub(crate) score: Score,

    /// Free-form remarks.
    pub(crate) comment: Option<String>,
}

impl Rating {
    /// Trims a rating `comment` and checks its length.  Blank comments are dropped.
    pub(crate) fn clean_comment(comment: Option<String>) -> ModelResult<Option<String>> {
        let Some(comment) = comment else {
            return Ok(None);
        };
        let comment = comment.trim();
        if comment.is_empty() {
            return Ok(None);
        }
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(ModelError(format!(
                "Comment cannot be longer than {} characters",
                MAX_COMMENT_CHARS
            )));
        }
        Ok(Some(comment.to_owned()))
    }
}
