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

//! Issuance and verification of one-time passwords.

use crate::db;
use crate::driver::AntaDriver;
use crate::model::OtpCode;
use anta_core::driver::{DriverError, DriverResult};
use anta_core::model::PhoneNumber;
use log::{info, warn};
use time::OffsetDateTime;

/// Number of failed verifications after which a code can no longer be used.
pub(crate) const MAX_ATTEMPTS: i64 = 3;

impl AntaDriver {
    /// Issues a new one-time password for `phone` and returns when it expires.
    ///
    /// The code itself is handed over to the SMS channel only and is never returned to callers.
    pub(crate) async fn issue_otp(self, phone: PhoneNumber) -> DriverResult<OffsetDateTime> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let issued = db::count_otps_since(tx.ex(), &phone, now - self.opts.otp_window).await?;
        if issued >= u64::from(self.opts.otp_max_per_window) {
            warn!("One-time password quota exhausted for {}", phone);
            return Err(DriverError::Forbidden(
                "Too many codes requested; try again later".to_owned(),
            ));
        }

        let expires_at = now + self.opts.otp_ttl;
        let otp = db::create_otp(tx.ex(), phone, OtpCode::generate(), now, expires_at).await?;

        tx.commit().await?;
        info!("Issued one-time password {} for {}", otp.id, otp.phone);
        Ok(otp.expires_at)
    }

    /// Verifies that `code` matches the latest pending one-time password for `phone` and, if so,
    /// marks the phone as verified.
    pub(crate) async fn verify_otp(self, phone: PhoneNumber, code: OtpCode) -> DriverResult<()> {
        let now = self.clock.now_utc();
        let mut tx = self.db.begin().await?;

        let otp = match db::get_latest_unconsumed_otp(tx.ex(), &phone).await? {
            Some(otp) => otp,
            None => {
                return Err(DriverError::Unauthorized("No pending code for this phone".to_owned()));
            }
        };

        if otp.attempts >= MAX_ATTEMPTS {
            return Err(DriverError::Forbidden("Too many failed attempts".to_owned()));
        }

        if otp.expires_at <= now {
            return Err(DriverError::Unauthorized("Code has expired".to_owned()));
        }

        if otp.code != code {
            db::increment_otp_attempts(tx.ex(), otp.id).await?;
            tx.commit().await?;
            return Err(DriverError::Unauthorized("Invalid code".to_owned()));
        }

        db::consume_otp(tx.ex(), otp.id).await?;
        if !db::set_phone_verified(tx.ex(), &phone).await? {
            info!("Verified phone {} does not belong to any user yet", phone);
        }

        tx.commit().await?;
        Ok(())
    }
}
