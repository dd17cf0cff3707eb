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

//! Scripted in-memory Telegram for tests
//!
//! Sessions are plain strings. A session becomes authorized once a sign-in
//! against it succeeds. Every open connection is counted so tests can check
//! that handlers release them.

use super::{
    CodeRequest, Connection, Connector, MediaStream, Profile, SavedMedia, SessionToken,
    SignInError, TelegramError,
};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use savedrive_common::{MediaKind, SavedItem};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub const TEST_PHONE: &str = "+15550001111";
pub const TEST_CODE: &str = "12345";
pub const TWO_FACTOR_PHONE: &str = "+15550002222";
pub const TWO_FACTOR_PASSWORD: &str = "hunter2";

/// Session value the fake refuses to load
pub const CORRUPT_SESSION: &str = "corrupt";

#[derive(Debug, Clone)]
struct Account {
    code: String,
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFile {
    pub caption: String,
    pub contents: Vec<u8>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    authorized: HashSet<String>,
    awaiting_password: HashMap<String, String>,
    profile: Profile,
    profile_photo: Option<Vec<u8>>,
    fail_profile_photo: bool,
    media: Vec<SavedItem>,
    thumbnails: HashMap<i32, Vec<u8>>,
    payloads: HashMap<i32, Vec<u8>>,
    sent: Vec<SentFile>,
    fail_send: bool,
    searches: Vec<Option<String>>,
    next_session: u64,
    open_connections: usize,
    connections_opened: usize,
}

#[derive(Clone, Default)]
pub struct FakeTelegram {
    state: Arc<Mutex<State>>,
}

impl FakeTelegram {
    /// A fake with one plain account and one two-factor account.
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.lock();
            state.accounts.insert(
                TEST_PHONE.to_string(),
                Account {
                    code: TEST_CODE.to_string(),
                    password: None,
                },
            );
            state.accounts.insert(
                TWO_FACTOR_PHONE.to_string(),
                Account {
                    code: TEST_CODE.to_string(),
                    password: Some(TWO_FACTOR_PASSWORD.to_string()),
                },
            );
            state.profile = Profile {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                username: Some("ada".to_string()),
            };
        }
        fake
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Store a saved message. Later additions are newer.
    pub fn add_media(&self, id: i32, kind: MediaKind, payload: &[u8]) {
        let mut state = self.lock();
        state.media.insert(
            0,
            SavedItem {
                id,
                date: Utc.timestamp_opt(1_700_000_000 + id as i64, 0).unwrap(),
                kind,
            },
        );
        state.payloads.insert(id, payload.to_vec());
    }

    pub fn add_photo(&self, id: i32, thumbnail: Option<&[u8]>) {
        self.add_media(id, MediaKind::Photo, b"full-size-photo");
        if let Some(thumbnail) = thumbnail {
            self.lock().thumbnails.insert(id, thumbnail.to_vec());
        }
    }

    pub fn add_document(&self, id: i32, file_name: Option<&str>, mime_type: Option<&str>, payload: &[u8]) {
        self.add_media(
            id,
            MediaKind::Document {
                file_name: file_name.map(str::to_string),
                mime_type: mime_type.map(str::to_string),
            },
            payload,
        );
    }

    pub fn set_profile_photo(&self, photo: Option<&[u8]>) {
        self.lock().profile_photo = photo.map(<[u8]>::to_vec);
    }

    pub fn fail_profile_photo(&self) {
        self.lock().fail_profile_photo = true;
    }

    pub fn fail_sends(&self) {
        self.lock().fail_send = true;
    }

    /// Forget every authorization, as a remote logout would.
    pub fn revoke_all(&self) {
        self.lock().authorized.clear();
    }

    pub fn sent(&self) -> Vec<SentFile> {
        self.lock().sent.clone()
    }

    pub fn searches(&self) -> Vec<Option<String>> {
        self.lock().searches.clone()
    }

    pub fn open_connections(&self) -> usize {
        self.lock().open_connections
    }

    pub fn connections_opened(&self) -> usize {
        self.lock().connections_opened
    }
}

#[async_trait]
impl Connector for FakeTelegram {
    type Connection = FakeConnection;

    async fn connect(&self, session: Option<&SessionToken>) -> Result<FakeConnection, TelegramError> {
        let mut state = self.lock();
        let session = match session {
            Some(token) if token.as_str() == CORRUPT_SESSION => {
                return Err(TelegramError::InvalidSession("unreadable session".to_string()));
            }
            Some(token) => token.clone(),
            None => {
                state.next_session += 1;
                SessionToken::new(format!("session-{}", state.next_session))
            }
        };
        state.open_connections += 1;
        state.connections_opened += 1;
        Ok(FakeConnection {
            state: Arc::clone(&self.state),
            session,
        })
    }
}

pub struct FakeConnection {
    state: Arc<Mutex<State>>,
    session: SessionToken,
}

impl FakeConnection {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn require_authorized(&self) -> Result<(), TelegramError> {
        if self.lock().authorized.contains(self.session.as_str()) {
            Ok(())
        } else {
            Err(TelegramError::Rpc("AUTH_KEY_UNREGISTERED".to_string()))
        }
    }

    fn find(&self, id: i32) -> Option<SavedItem> {
        self.lock().media.iter().find(|item| item.id == id).cloned()
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.open_connections -= 1;
        }
    }
}

fn code_hash(phone: &str) -> String {
    format!("hash-{}", phone)
}

#[async_trait]
impl Connection for FakeConnection {
    type Media = i32;

    async fn is_authorized(&self) -> Result<bool, TelegramError> {
        Ok(self.lock().authorized.contains(self.session.as_str()))
    }

    async fn request_code(&self, phone: &str) -> Result<CodeRequest, TelegramError> {
        if !self.lock().accounts.contains_key(phone) {
            return Err(TelegramError::Rpc("PHONE_NUMBER_INVALID".to_string()));
        }
        Ok(CodeRequest {
            phone_code_hash: code_hash(phone),
            session: self.session.clone(),
        })
    }

    async fn sign_in(&self, phone: &str, phone_code_hash: &str, code: &str) -> Result<(), SignInError> {
        let mut state = self.lock();
        let account = state
            .accounts
            .get(phone)
            .cloned()
            .ok_or_else(|| SignInError::Failed("PHONE_NUMBER_INVALID".to_string()))?;
        if phone_code_hash != code_hash(phone) {
            return Err(SignInError::Failed("PHONE_CODE_EXPIRED".to_string()));
        }
        if code != account.code {
            return Err(SignInError::Failed("PHONE_CODE_INVALID".to_string()));
        }
        match account.password {
            Some(password) => {
                state
                    .awaiting_password
                    .insert(self.session.as_str().to_string(), password);
                Err(SignInError::PasswordRequired)
            }
            None => {
                state.authorized.insert(self.session.as_str().to_string());
                Ok(())
            }
        }
    }

    async fn check_password(&self, password: &str) -> Result<(), SignInError> {
        let mut state = self.lock();
        let expected = state
            .awaiting_password
            .get(self.session.as_str())
            .cloned()
            .ok_or_else(|| SignInError::Failed("PASSWORD_NOT_REQUESTED".to_string()))?;
        if password != expected {
            return Err(SignInError::Failed("PASSWORD_HASH_INVALID".to_string()));
        }
        state.awaiting_password.remove(self.session.as_str());
        state.authorized.insert(self.session.as_str().to_string());
        Ok(())
    }

    async fn profile(&self) -> Result<Profile, TelegramError> {
        self.require_authorized()?;
        Ok(self.lock().profile.clone())
    }

    async fn profile_photo(&self) -> Result<Option<Vec<u8>>, TelegramError> {
        self.require_authorized()?;
        let state = self.lock();
        if state.fail_profile_photo {
            return Err(TelegramError::Rpc("FILE_MIGRATE_4".to_string()));
        }
        Ok(state.profile_photo.clone())
    }

    async fn saved_media(
        &self,
        search: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SavedMedia<i32>>, TelegramError> {
        self.require_authorized()?;
        let mut state = self.lock();
        state.searches.push(search.map(str::to_string));
        Ok(state
            .media
            .iter()
            .filter(|item| match search {
                Some(term) => item.display_name().contains(term),
                None => true,
            })
            .take(limit)
            .map(|item| SavedMedia {
                item: item.clone(),
                media: item.id,
            })
            .collect())
    }

    async fn saved_message(&self, id: i32) -> Result<Option<SavedMedia<i32>>, TelegramError> {
        self.require_authorized()?;
        Ok(self.find(id).map(|item| SavedMedia { item, media: id }))
    }

    async fn thumbnail(&self, media: &i32) -> Result<Option<Vec<u8>>, TelegramError> {
        Ok(self.lock().thumbnails.get(media).cloned())
    }

    async fn download(&self, media: &i32) -> Result<MediaStream, TelegramError> {
        let payload = self.lock().payloads.get(media).cloned().unwrap_or_default();
        let middle = payload.len() / 2;
        let chunks = vec![Ok(payload[..middle].to_vec()), Ok(payload[middle..].to_vec())];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), TelegramError> {
        self.require_authorized()?;
        let contents = std::fs::read(path)?;
        let mut state = self.lock();
        if state.fail_send {
            return Err(TelegramError::Rpc("FILE_PARTS_INVALID".to_string()));
        }
        state.sent.push(SentFile {
            caption: caption.to_string(),
            contents,
        });
        Ok(())
    }

    fn export_session(&self) -> SessionToken {
        self.session.clone()
    }
}
