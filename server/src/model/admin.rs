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

//! Operator-facing records.

use crate::model::{AdminLogId, UserId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Audit record of an action taken by an admin.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct AdminLog {
    /// Identifier of the record.
    pub(crate) id: AdminLogId,

    /// The admin that acted.
    pub(crate) admin_id: UserId,

    /// What was done, like `kyc_review`.
    pub(crate) action: String,

    /// Kind of entity acted upon, like `driver`.
    pub(crate) entity: String,

    /// Identifier of the entity acted upon, if any.
    pub(crate) entity_id: Option<i64>,

    /// Free-form details.
    pub(crate) details: Option<String>,

    /// When the action happened.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}

/// Platform-wide counters for the admin dashboard.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Stats {
    /// Number of registered users.
    pub(crate) users: i64,

    /// Number of driver profiles, excluding deleted ones.
    pub(crate) drivers: i64,

    /// Number of drivers currently online.
    pub(crate) online_drivers: i64,

    /// Number of trips, excluding deleted ones.
    pub(crate) trips: i64,

    /// Number of completed trips.
    pub(crate) completed_trips: i64,

    /// Number of cancelled trips.
    pub(crate) cancelled_trips: i64,

    /// Sum of all completed payments.
    pub(crate) revenue_cents: i64,
}
