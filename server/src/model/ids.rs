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

//! Identifiers of the persisted entities.

use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Defines a newtype over the database-generated `i64` identifier of an entity.
macro_rules! id_type {
    ( $name:ident, $what:literal ) => {
        #[doc = concat!("Identifier of ", $what, ".")]
        #[derive(
            Clone,
            Constructor,
            Copy,
            Debug,
            Deserialize,
            Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            Serialize,
        )]
        #[serde(transparent)]
        pub(crate) struct $name(i64);

        impl $name {
            /// Returns the raw identifier, ready to bind to a query.
            pub(crate) fn as_i64(self) -> i64 {
                self.0
            }
        }
    };
}

id_type!(AdminLogId, "an admin log entry");
id_type!(DocumentId, "a KYC document");
id_type!(DriverId, "a driver profile");
id_type!(LocationId, "a driver location sample");
id_type!(OtpId, "a one-time password");
id_type!(PaymentId, "a payment");
id_type!(PromoId, "a promo code");
id_type!(RatingId, "a trip rating");
id_type!(TripId, "a trip");
id_type!(UserId, "a user");
id_type!(VehicleId, "a vehicle");
id_type!(WalletId, "a wallet");
id_type!(ZoneId, "a pricing zone");
