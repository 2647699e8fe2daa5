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

//! Enumerations persisted as lowercase strings.

use anta_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines an enumeration whose variants map one-to-one to lowercase strings.
///
/// The string form is used both in JSON payloads and in the database, so the two can never drift.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub(crate) enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Returns the string representation of this value.
            pub(crate) fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            /// Parses the string representation `s` of a value.
            pub(crate) fn parse<S: AsRef<str>>(s: S) -> ModelResult<Self> {
                match s.as_ref() {
                    $( $text => Ok($name::$variant), )+
                    other => {
                        let valid: &[&str] = &[$( $text ),+];
                        Err(ModelError(format!(
                            "Invalid {} '{}'; must be one of {}",
                            $what,
                            other,
                            valid.join(", ")
                        )))
                    }
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> ModelResult<Self> {
                Self::parse(value)
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Role of a user account.
    Role, "role" {
        /// A passenger.
        Rider => "rider",
        /// A user with a driver profile.
        Driver => "driver",
        /// A platform operator.
        Admin => "admin",
    }
);

string_enum!(
    /// Whether a user account may be used.
    UserStatus, "user status" {
        /// The account is usable.
        Active => "active",
        /// The account has been blocked by an operator.
        Suspended => "suspended",
    }
);

string_enum!(
    /// Availability of a driver.
    DriverStatus, "driver status" {
        /// Not taking trips.
        Offline => "offline",
        /// Waiting for a trip.
        Online => "online",
        /// Serving a trip.
        Busy => "busy",
        /// Blocked by an operator.
        Suspended => "suspended",
    }
);

string_enum!(
    /// Progress of a driver's identity verification.
    KycStatus, "KYC status" {
        /// No documents have been submitted yet.
        Unsubmitted => "unsubmitted",
        /// Documents await review.
        Pending => "pending",
        /// An admin accepted the documents.
        Approved => "approved",
        /// An admin rejected the documents.
        Rejected => "rejected",
    }
);

string_enum!(
    /// Kind of document submitted for KYC.
    DocumentKind, "document kind" {
        /// Driving license.
        License => "license",
        /// National identity card.
        IdCard => "id_card",
        /// Vehicle insurance.
        Insurance => "insurance",
        /// Vehicle registration.
        Registration => "registration",
    }
);

string_enum!(
    /// Service class of a vehicle.
    VehicleCategory, "vehicle category" {
        /// Standard car.
        Economy => "economy",
        /// Larger or newer car.
        Comfort => "comfort",
        /// Car with extra seats.
        Xl => "xl",
        /// Motorcycle.
        Moto => "moto",
    }
);

string_enum!(
    /// Lifecycle state of a trip.
    TripStatus, "trip status" {
        /// Waiting for a driver.
        Requested => "requested",
        /// A driver is on the way to the pickup.
        Accepted => "accepted",
        /// The rider is on board.
        InProgress => "in_progress",
        /// The rider reached the destination.
        Completed => "completed",
        /// The trip was abandoned before starting.
        Cancelled => "cancelled",
    }
);

impl TripStatus {
    /// Returns true if a trip in this state may move to `next`.
    pub(crate) fn can_become(self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Requested, TripStatus::Accepted)
                | (TripStatus::Accepted, TripStatus::InProgress)
                | (TripStatus::InProgress, TripStatus::Completed)
                | (TripStatus::Requested, TripStatus::Cancelled)
                | (TripStatus::Accepted, TripStatus::Cancelled)
        )
    }
}

string_enum!(
    /// How a trip is paid for.
    PaymentMethod, "payment method" {
        /// Cash handed to the driver.
        Cash => "cash",
        /// In-app wallet balance.
        Wallet => "wallet",
        /// Card charged by an external provider.
        Card => "card",
    }
);

string_enum!(
    /// Settlement state of a payment.
    PaymentStatus, "payment status" {
        /// Awaiting settlement by an external provider.
        Pending => "pending",
        /// Settled.
        Completed => "completed",
        /// Could not be settled.
        Failed => "failed",
    }
);

string_enum!(
    /// Kind of entity that owns a wallet.
    OwnerKind, "owner kind" {
        /// A user account.
        User => "user",
        /// A driver profile.
        Driver => "driver",
        /// The platform itself.
        Platform => "platform",
    }
);

string_enum!(
    /// How a promo code computes its discount.
    PromoKind, "promo kind" {
        /// A percentage of the amount.
        Percent => "percent",
        /// A fixed amount in cents.
        Flat => "flat",
    }
);
