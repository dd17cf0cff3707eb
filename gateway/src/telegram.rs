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

//! Telegram client seam
//!
//! The gateway never keeps a client between requests. Each request asks a
//! [`Connector`] for a fresh [`Connection`], seeded from the opaque
//! [`SessionToken`] the browser carries, and drops it when the request is
//! done. Dropping a connection disconnects it.

pub mod grammers;
pub mod preview;

#[cfg(test)]
pub mod test_utils;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use futures::stream::BoxStream;
use savedrive_common::SavedItem;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized client session, safe to place in a cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encode raw session bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Decode back into raw session bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TelegramError> {
        URL_SAFE_NO_PAD
            .decode(self.0.as_bytes())
            .map_err(|e| TelegramError::InvalidSession(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Handle returned by a code request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRequest {
    /// Telegram's reference to the code it sent
    pub phone_code_hash: String,

    /// Session of the connection that requested the code
    pub session: SessionToken,
}

/// Account summary of the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Saved message paired with the backend's handle to its media
#[derive(Debug, Clone)]
pub struct SavedMedia<M> {
    pub item: SavedItem,
    pub media: M,
}

/// Chunked media payload
pub type MediaStream = BoxStream<'static, Result<Vec<u8>, TelegramError>>;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Account lives on data center {0}")]
    Migrate(i32),

    #[error("{0}")]
    Rpc(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("Two-factor password required")]
    PasswordRequired,

    #[error("{0}")]
    Failed(String),
}

impl From<TelegramError> for SignInError {
    fn from(err: TelegramError) -> Self {
        SignInError::Failed(err.to_string())
    }
}

/// Opens per-request connections.
#[async_trait]
pub trait Connector: Clone + Send + Sync + 'static {
    type Connection: Connection;

    /// Connect with an existing session, or a blank one when `session` is `None`.
    async fn connect(&self, session: Option<&SessionToken>)
    -> Result<Self::Connection, TelegramError>;
}

/// A live client bound to one session.
///
/// Implementations disconnect on drop.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Backend handle to a message's media
    type Media: Send + Sync + 'static;

    /// Probe whether the session belongs to a signed-in account.
    async fn is_authorized(&self) -> Result<bool, TelegramError>;

    async fn request_code(&self, phone: &str) -> Result<CodeRequest, TelegramError>;

    async fn sign_in(
        &self,
        phone: &str,
        phone_code_hash: &str,
        code: &str,
    ) -> Result<(), SignInError>;

    /// Complete a sign-in that stopped at [`SignInError::PasswordRequired`].
    async fn check_password(&self, password: &str) -> Result<(), SignInError>;

    async fn profile(&self) -> Result<Profile, TelegramError>;

    /// Small profile photo as JPEG, if the account has one
    async fn profile_photo(&self) -> Result<Option<Vec<u8>>, TelegramError>;

    /// Newest-first media-bearing saved messages, optionally matching `search`.
    async fn saved_media(
        &self,
        search: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SavedMedia<Self::Media>>, TelegramError>;

    /// A single saved message, when it exists and carries media.
    async fn saved_message(
        &self,
        id: i32,
    ) -> Result<Option<SavedMedia<Self::Media>>, TelegramError>;

    /// Smallest available preview of the media as JPEG.
    async fn thumbnail(&self, media: &Self::Media) -> Result<Option<Vec<u8>>, TelegramError>;

    /// Stream the full payload. The stream outlives the connection.
    async fn download(&self, media: &Self::Media) -> Result<MediaStream, TelegramError>;

    /// Send a local file to the user's saved messages.
    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), TelegramError>;

    /// Serialize the current session.
    fn export_session(&self) -> SessionToken;
}
