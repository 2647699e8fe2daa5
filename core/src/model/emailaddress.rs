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

//! The `EmailAddress` data type.

use crate::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Maximum length of an email address per RFC 5321.
const MAX_EMAIL_LENGTH: usize = 254;

/// Represents a syntactically plausible email address.
///
/// Validation is shallow on purpose: the only way to know an address is real is to deliver to it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a new email address from an untrusted string `s`, making sure it is valid.
    ///
    /// Surrounding whitespace is dropped and the domain part is lowercased.
    pub fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(ModelError("Email address cannot be empty".to_owned()));
        }
        if s.len() > MAX_EMAIL_LENGTH {
            return Err(ModelError("Email address is too long".to_owned()));
        }

        let Some((local, domain)) = s.rsplit_once('@') else {
            return Err(ModelError(format!("Email does not look like a valid address '{}'", s)));
        };
        if local.is_empty() || domain.is_empty() || s.contains(char::is_whitespace) {
            return Err(ModelError(format!("Email does not look like a valid address '{}'", s)));
        }

        Ok(Self(format!("{}@{}", local, domain.to_lowercase())))
    }

    /// Returns a string view of the email address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens_error, assert_tokens};

    #[test]
    fn test_emailaddress_ok() {
        assert_eq!("simple@example.com", EmailAddress::new("simple@example.com").unwrap().as_str());
        assert_eq!("a!b@c", EmailAddress::new("  a!b@c ").unwrap().as_str());
    }

    #[test]
    fn test_emailaddress_domain_is_case_insensitive() {
        assert_eq!(
            EmailAddress::new("Foo@example.com").unwrap(),
            EmailAddress::new("Foo@EXAMPLE.com").unwrap()
        );
        assert_ne!(
            EmailAddress::new("foo@example.com").unwrap(),
            EmailAddress::new("Foo@example.com").unwrap()
        );
    }

    #[test]
    fn test_emailaddress_error() {
        assert!(EmailAddress::new("").is_err());
        assert!(EmailAddress::new("foo").is_err());
        assert!(EmailAddress::new("@example.com").is_err());
        assert!(EmailAddress::new("foo@").is_err());
        assert!(EmailAddress::new("foo bar@example.com").is_err());
        assert!(EmailAddress::new(format!("a@{}", "b".repeat(MAX_EMAIL_LENGTH))).is_err());
    }

    #[test]
    fn test_emailaddress_ser_de_ok() {
        let email = EmailAddress::new("rider@anta.app").unwrap();
        assert_tokens(&email, &[Token::String("rider@anta.app")]);
    }

    #[test]
    fn test_emailaddress_de_error() {
        assert_de_tokens_error::<EmailAddress>(
            &[Token::String("rider")],
            "Email does not look like a valid address 'rider'",
        );
    }
}
