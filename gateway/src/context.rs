//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use crate::session::CookiePolicy;
use crate::telegram::Connector;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Gateway context containing shared, read-only resources
#[derive(Clone)]
pub struct GatewayContext<C> {
    /// Opens Telegram connections
    connector: C,

    /// Signs and verifies the session cookies
    cookie_key: Key,

    /// Attributes of issued cookies
    cookie_policy: CookiePolicy,

    /// Root of per-upload scratch directories
    scratch_dir: Arc<PathBuf>,

    /// Saved messages scanned per listing
    list_limit: usize,

    /// Largest accepted upload body
    upload_limit: usize,
}

impl<C: Connector> GatewayContext<C> {
    /// Create a new gateway context
    pub fn new(
        connector: C,
        cookie_key: Key,
        cookie_policy: CookiePolicy,
        scratch_dir: PathBuf,
        list_limit: usize,
        upload_limit: usize,
    ) -> Self {
        Self {
            connector,
            cookie_key,
            cookie_policy,
            scratch_dir: Arc::new(scratch_dir),
            list_limit,
            upload_limit,
        }
    }

    /// Get the Telegram connector
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Get the cookie policy
    pub fn cookie_policy(&self) -> &CookiePolicy {
        &self.cookie_policy
    }

    /// Get the upload scratch directory
    pub fn scratch_dir(&self) -> &Path {
        self.scratch_dir.as_path()
    }

    pub fn list_limit(&self) -> usize {
        self.list_limit
    }

    pub fn upload_limit(&self) -> usize {
        self.upload_limit
    }
}

impl<C> FromRef<GatewayContext<C>> for Key {
    fn from_ref(context: &GatewayContext<C>) -> Key {
        context.cookie_key.clone()
    }
}
