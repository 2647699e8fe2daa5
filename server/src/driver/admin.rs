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

//! Operations for the admin dashboard.

use crate::db::{self, crud};
use crate::driver::AntaDriver;
use crate::model::{AdminLog, Stats};
use anta_core::driver::DriverResult;
use anta_core::model::{Page, PageRequest};

impl AntaDriver {
    /// Computes the platform-wide counters.
    pub(crate) async fn get_stats(self) -> DriverResult<Stats> {
        let mut ex = self.db.ex().await?;
        Ok(db::get_stats(&mut ex).await?)
    }

    /// Lists the audit log, most recent entries first.
    pub(crate) async fn list_admin_logs(self, page: PageRequest) -> DriverResult<Page<AdminLog>> {
        let mut ex = self.db.ex().await?;
        Ok(crud::list::<AdminLog>(&mut ex, &[], page).await?)
    }
}
