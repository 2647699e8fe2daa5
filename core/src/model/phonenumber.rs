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

//! The `PhoneNumber` data type.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of digits in an E.164 number, excluding the leading `+`.
const MIN_DIGITS: usize = 8;

/// Maximum number of digits in an E.164 number, excluding the leading `+`.
const MAX_DIGITS: usize = 15;

/// A phone number in E.164 format, like `+6281234567890`.
///
/// Phone numbers identify users and are the target of one-time passwords, so they are normalized
/// on input: spaces, dashes, dots and parentheses are dropped.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Creates a new phone number from an untrusted string `s`, making sure it is valid.
    pub fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let normalized: String = s
            .as_ref()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        let Some(digits) = normalized.strip_prefix('+') else {
            return Err(ModelError(format!(
                "Phone number '{}' must start with + and a country code",
                s.as_ref()
            )));
        };
        if !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ModelError(format!("Phone number '{}' contains non-digits", s.as_ref())));
        }
        if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
            return Err(ModelError(format!(
                "Phone number '{}' must have between {} and {} digits",
                s.as_ref(),
                MIN_DIGITS,
                MAX_DIGITS
            )));
        }
        if digits.starts_with('0') {
            return Err(ModelError(format!(
                "Phone number '{}' has an invalid country code",
                s.as_ref()
            )));
        }

        Ok(Self(normalized))
    }

    /// Returns a string view of the phone number.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

#[cfg(feature = "testutils")]
impl From<&'static str> for PhoneNumber {
    fn from(raw: &'static str) -> Self {
        Self::new(raw).expect("Hardcoded phone numbers for testing must be valid")
    }
}
