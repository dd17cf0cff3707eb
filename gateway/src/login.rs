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

//! Phone, code and password login

use crate::error::GatewayError;
use crate::session::{CookieSession, PendingLogin};
use crate::telegram::{Connection, Connector, SignInError};
use tracing::{info, warn};

pub const SESSION_EXPIRED: &str = "Session expired. Please re-enter phone number.";

/// Result of submitting a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated,

    /// The account has a cloud password and none was supplied
    TwoFactorRequired,
}

/// Mask all but the country prefix and last three digits of a phone number.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < 3 || i >= chars.len() - 3 { *c } else { '*' })
        .collect()
}

/// Ask Telegram to send a verification code and remember the request.
pub async fn request_code<C: Connector>(
    connector: &C,
    session: &mut CookieSession,
    phone: &str,
) -> Result<(), GatewayError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(GatewayError::validation("Phone number is required"));
    }

    let connection = connector.connect(None).await?;
    let request = connection
        .request_code(phone)
        .await
        .inspect_err(|e| warn!(phone = %mask_phone(phone), "Code request failed: {}", e))?;

    info!(phone = %mask_phone(phone), "Verification code sent");
    session.begin_login(PendingLogin {
        phone: phone.to_string(),
        phone_code_hash: request.phone_code_hash,
        session: request.session,
    });
    Ok(())
}

/// Redeem the pending verification code, with an optional cloud password.
///
/// The pending login survives every failure so the user can retry.
pub async fn submit_code<C: Connector>(
    connector: &C,
    session: &mut CookieSession,
    code: &str,
    password: Option<&str>,
) -> Result<LoginOutcome, GatewayError> {
    let pending = session
        .pending
        .clone()
        .ok_or_else(|| GatewayError::validation(SESSION_EXPIRED))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(GatewayError::validation("Verification code is required"));
    }

    let connection = connector
        .connect(Some(&pending.session))
        .await
        .map_err(|e| match e {
            crate::telegram::TelegramError::InvalidSession(_) => {
                GatewayError::validation(SESSION_EXPIRED)
            }
            other => other.into(),
        })?;

    match connection
        .sign_in(&pending.phone, &pending.phone_code_hash, code)
        .await
    {
        Ok(()) => {}
        Err(SignInError::PasswordRequired) => match password.filter(|p| !p.is_empty()) {
            None => {
                info!(phone = %mask_phone(&pending.phone), "Second factor required");
                return Ok(LoginOutcome::TwoFactorRequired);
            }
            Some(password) => connection.check_password(password).await.inspect_err(|e| {
                warn!(phone = %mask_phone(&pending.phone), "Password check failed: {}", e)
            })?,
        },
        Err(err) => {
            warn!(phone = %mask_phone(&pending.phone), "Sign-in failed: {}", err);
            return Err(err.into());
        }
    }

    info!(phone = %mask_phone(&pending.phone), "Signed in");
    session.authenticate(connection.export_session());
    Ok(LoginOutcome::Authenticated)
}

/// Forget everything the browser carries. Safe to repeat.
pub fn logout(session: &mut CookieSession) {
    session.clear();
}
