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

//! Users of the platform.

use crate::model::{Role, UserId, UserStatus};
use anta_core::model::{EmailAddress, ModelError, ModelResult, PhoneNumber};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum number of characters in a user's full name.
const MAX_FULL_NAME_CHARS: usize = 128;

/// The name a user goes by, trimmed and without control characters.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub(crate) struct FullName(String);

impl FullName {
    /// Creates a new name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(ModelError("Full name cannot be empty".to_owned()));
        }
        if s.chars().count() > MAX_FULL_NAME_CHARS {
            return Err(ModelError(format!(
                "Full name cannot be longer than {} characters",
                MAX_FULL_NAME_CHARS
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ModelError("Full name cannot contain control characters".to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns a string view of the name.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FullName {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

/// A registered user, be it a rider, a driver or an admin.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct User {
    /// Identifier of the user.
    pub(crate) id: UserId,

    /// Phone number, which is unique across users.
    pub(crate) phone: PhoneNumber,

    /// Name of the user.
    pub(crate) full_name: FullName,

    /// Contact email address, if any.
    pub(crate) email: Option<EmailAddress>,

    /// What the user does on the platform.
    pub(crate) role: Role,

    /// Whether the account is usable.
    pub(crate) status: UserStatus,

    /// Whether the user proved ownership of the phone number with an OTP.
    pub(crate) phone_verified: bool,

    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
}
