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

//! One-time passwords sent to phones.

use crate::model::OtpId;
use anta_core::model::{ModelError, ModelResult, PhoneNumber};
use rand::Rng;
use std::fmt;
use time::OffsetDateTime;

/// Number of digits in a one-time password.
const OTP_DIGITS: usize = 6;

/// A one-time password: exactly six decimal digits.
///
/// This type is not serializable on purpose: codes only ever travel through the SMS channel.
#[derive(Clone, Eq, PartialEq)]
pub(crate) struct OtpCode(String);

impl OtpCode {
    /// Creates a code from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().trim();
        if s.len() != OTP_DIGITS || !s.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ModelError(format!("One-time password must have {} digits", OTP_DIGITS)));
        }
        Ok(Self(s.to_owned()))
    }

    /// Generates a new random code.
    pub(crate) fn generate() -> Self {
        let code = rand::rng().random_range(0..1_000_000u32);
        Self(format!("{:06}", code))
    }

    /// Returns a string view of the code.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keeps codes out of logs and panic messages.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// A one-time password issued to a phone.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Otp {
    /// Identifier of the OTP.
    pub(crate) id: OtpId,

    /// The phone the code was sent to.
    pub(crate) phone: PhoneNumber,

    /// The code itself.
    pub(crate) code: OtpCode,

    /// Number of failed verification attempts.
    pub(crate) attempts: i64,

    /// Whether the code has been used successfully.
    pub(crate) consumed: bool,

    /// When the code was issued.
    pub(crate) created_at: OffsetDateTime,

    /// When the code stops being valid.
    pub(crate) expires_at: OffsetDateTime,
}
