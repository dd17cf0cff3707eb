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

//! Browser session management
//!
//! The gateway keeps no session state of its own. Everything it needs
//! between requests travels in two signed cookies:
//! - `telegram_session` holds the serialized Telegram session
//! - `pending_login` holds the half-finished login between the code request
//!   and the code submission
//!
//! A request reads both into a [`CookieSession`], mutates it, and writes any
//! changes back onto the response jar.

use crate::telegram::SessionToken;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "telegram_session";
pub const PENDING_COOKIE: &str = "pending_login";

/// Login state derived from the cookies alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Anonymous,
    CodeRequested,
    Authenticated,
}

/// A requested but not yet redeemed verification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    pub phone: String,
    pub phone_code_hash: String,

    /// Session the code was requested on
    pub session: SessionToken,
}

impl PendingLogin {
    fn encode(&self) -> Option<String> {
        serde_json::to_vec(self)
            .inspect_err(|e| tracing::error!("Failed to encode pending login: {}", e))
            .ok()
            .map(|json| URL_SAFE_NO_PAD.encode(json))
    }

    fn decode(value: &str) -> Option<Self> {
        let json = URL_SAFE_NO_PAD.decode(value).ok()?;
        serde_json::from_slice(&json)
            .inspect_err(|e| tracing::warn!("Discarding unreadable pending login: {}", e))
            .ok()
    }
}

/// Attributes shared by both session cookies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        Cookie::build(name).path("/").build()
    }
}

/// Session state carried by one browser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSession {
    pub token: Option<SessionToken>,
    pub pending: Option<PendingLogin>,
}

impl CookieSession {
    /// Read the session from verified cookies. Tampered or unreadable cookies
    /// are treated as absent.
    pub fn from_jar(jar: &SignedCookieJar) -> Self {
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| SessionToken::new(cookie.value()))
            .filter(|token| !token.is_empty());
        let pending = jar
            .get(PENDING_COOKIE)
            .and_then(|cookie| PendingLogin::decode(cookie.value()));
        Self { token, pending }
    }

    pub fn state(&self) -> LoginState {
        match (&self.token, &self.pending) {
            (Some(_), _) => LoginState::Authenticated,
            (None, Some(_)) => LoginState::CodeRequested,
            (None, None) => LoginState::Anonymous,
        }
    }

    /// Whether a session token is present. Validity is not checked.
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Replace any outstanding pending login.
    pub fn begin_login(&mut self, pending: PendingLogin) {
        self.pending = Some(pending);
    }

    pub fn authenticate(&mut self, token: SessionToken) {
        self.token = Some(token);
        self.pending = None;
    }

    /// Drop a token that failed its authorization probe.
    pub fn forget_token(&mut self) {
        self.token = None;
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.pending = None;
    }

    /// Write changed cookies onto `jar`.
    pub fn apply(self, jar: SignedCookieJar, policy: &CookiePolicy) -> SignedCookieJar {
        let current = Self::from_jar(&jar);

        let jar = if current.token == self.token {
            jar
        } else {
            match self.token {
                Some(token) => jar.add(policy.cookie(SESSION_COOKIE, token.as_str().to_string())),
                None => jar.remove(policy.removal(SESSION_COOKIE)),
            }
        };

        if current.pending == self.pending {
            return jar;
        }
        match self.pending.as_ref().and_then(PendingLogin::encode) {
            Some(value) => jar.add(policy.cookie(PENDING_COOKIE, value)),
            None => jar.remove(policy.removal(PENDING_COOKIE)),
        }
    }
}
