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

//! [`Connector`] backed by grammers
//!
//! Login goes through the raw `auth.*` functions so that the code-request
//! handle can be stored in a cookie and redeemed by a later connection.

use super::preview::{self, Preview};
use super::{
    CodeRequest, Connection, Connector, MediaStream, Profile, SavedMedia, SessionToken,
    SignInError, TelegramError,
};
use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use grammers_client::types::media::{Document, Media};
use grammers_client::types::{Chat, Downloadable, Message, PasswordToken};
use grammers_client::{Client, Config, InputMessage, InvocationError};
use grammers_session::{PackedChat, Session};
use grammers_tl_types as tl;
use savedrive_common::filename::guess_mime_type;
use savedrive_common::{MediaKind, SavedItem};
use std::path::Path;
use tracing::{debug, info};

/// Data center a blank session connects to
const DEFAULT_DC: i32 = 2;

/// Chunk size for `upload.getFile`
const FILE_CHUNK: i32 = 512 * 1024;

/// Messages scanned per requested media item before a listing gives up
const SCAN_FACTOR: usize = 5;

#[derive(Clone)]
pub struct GrammersConnector {
    api_id: i32,
    api_hash: String,
}

impl GrammersConnector {
    pub fn new(api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            api_id,
            api_hash: api_hash.into(),
        }
    }

    async fn open(&self, session: Session) -> Result<GrammersConnection, TelegramError> {
        let dc_id = session.get_user().map(|user| user.dc).unwrap_or(DEFAULT_DC);
        let client = Client::connect(Config {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: Default::default(),
        })
        .await
        .map_err(|e| TelegramError::Connect(e.to_string()))?;

        debug!(dc_id, "Connected to Telegram");
        Ok(GrammersConnection {
            client,
            connector: self.clone(),
            dc_id,
        })
    }
}

#[async_trait]
impl Connector for GrammersConnector {
    type Connection = GrammersConnection;

    async fn connect(
        &self,
        session: Option<&SessionToken>,
    ) -> Result<GrammersConnection, TelegramError> {
        let session = match session {
            Some(token) => Session::load(&token.to_bytes()?)
                .map_err(|e| TelegramError::InvalidSession(e.to_string()))?,
            None => Session::new(),
        };
        self.open(session).await
    }
}

pub struct GrammersConnection {
    client: Client,
    connector: GrammersConnector,
    dc_id: i32,
}

fn rpc_error(err: InvocationError) -> TelegramError {
    match err {
        InvocationError::Rpc(rpc) if rpc.code == 303 => match rpc.value {
            Some(dc_id) => TelegramError::Migrate(dc_id as i32),
            None => TelegramError::Rpc(rpc.name),
        },
        InvocationError::Rpc(rpc) => TelegramError::Rpc(rpc.name),
        other => TelegramError::Rpc(other.to_string()),
    }
}

/// Blank session homed on `dc_id`.
fn migrated_session(dc_id: i32) -> Session {
    let session = Session::new();
    session.set_user(0, dc_id, false);
    session
}

fn unexpected<T: std::fmt::Debug>(value: T) -> TelegramError {
    TelegramError::Unexpected(format!("{:?}", value))
}

fn document_kind(document: &Document) -> MediaKind {
    MediaKind::Document {
        file_name: Some(document.name().to_string()).filter(|name| !name.is_empty()),
        mime_type: document.mime_type().map(str::to_string),
    }
}

/// Listing kind of a media attachment. Media without a file is skipped.
fn media_kind(media: &Media) -> Option<MediaKind> {
    match media {
        Media::Photo(_) => Some(MediaKind::Photo),
        Media::Document(document) if document.raw.document.is_some() => {
            Some(document_kind(document))
        }
        Media::Sticker(sticker) if sticker.document.raw.document.is_some() => {
            Some(document_kind(&sticker.document))
        }
        _ => None,
    }
}

fn to_saved_media(message: &Message) -> Option<SavedMedia<Media>> {
    let media = message.media()?;
    let kind = media_kind(&media)?;
    Some(SavedMedia {
        item: SavedItem {
            id: message.id(),
            date: message.date(),
            kind,
        },
        media,
    })
}

fn to_preview(size: tl::enums::PhotoSize) -> Preview {
    match size {
        tl::enums::PhotoSize::Size(size) => Preview::Remote {
            kind: size.r#type,
            size: size.size.max(0) as usize,
        },
        tl::enums::PhotoSize::Progressive(size) => Preview::Remote {
            size: size.sizes.last().copied().unwrap_or(0).max(0) as usize,
            kind: size.r#type,
        },
        tl::enums::PhotoSize::PhotoCachedSize(size) => Preview::Cached(size.bytes),
        _ => Preview::Stripped,
    }
}

/// Collect up to `limit` mapped items, reading at most `limit * SCAN_FACTOR`
/// entries from `source`.
async fn collect_limited<S, T, U>(
    source: S,
    limit: usize,
    map: impl Fn(T) -> Option<U>,
) -> Result<Vec<U>, TelegramError>
where
    S: Stream<Item = Result<T, TelegramError>>,
{
    let mut source = std::pin::pin!(source.take(limit.saturating_mul(SCAN_FACTOR)));
    let mut found = Vec::new();
    while found.len() < limit {
        match source.try_next().await? {
            Some(entry) => found.extend(map(entry)),
            None => break,
        }
    }
    Ok(found)
}

/// Where the preview sizes of a media item are fetched from
enum PreviewSource {
    Photo {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
    },
    Document {
        id: i64,
        access_hash: i64,
        file_reference: Vec<u8>,
    },
}

impl PreviewSource {
    fn location(self, thumb_size: String) -> tl::enums::InputFileLocation {
        match self {
            PreviewSource::Photo {
                id,
                access_hash,
                file_reference,
            } => tl::types::InputPhotoFileLocation {
                id,
                access_hash,
                file_reference,
                thumb_size,
            }
            .into(),
            PreviewSource::Document {
                id,
                access_hash,
                file_reference,
            } => tl::types::InputDocumentFileLocation {
                id,
                access_hash,
                file_reference,
                thumb_size,
            }
            .into(),
        }
    }
}

fn preview_sizes(media: &Media) -> Option<(Vec<tl::enums::PhotoSize>, PreviewSource)> {
    match media {
        Media::Photo(photo) => {
            let raw = tl::types::Photo::try_from(photo.raw.photo.clone()?).ok()?;
            Some((
                raw.sizes,
                PreviewSource::Photo {
                    id: raw.id,
                    access_hash: raw.access_hash,
                    file_reference: raw.file_reference,
                },
            ))
        }
        Media::Document(document) => document_preview_sizes(document),
        Media::Sticker(sticker) => document_preview_sizes(&sticker.document),
        _ => None,
    }
}

fn document_preview_sizes(
    document: &Document,
) -> Option<(Vec<tl::enums::PhotoSize>, PreviewSource)> {
    let raw = tl::types::Document::try_from(document.raw.document.clone()?).ok()?;
    Some((
        raw.thumbs.unwrap_or_default(),
        PreviewSource::Document {
            id: raw.id,
            access_hash: raw.access_hash,
            file_reference: raw.file_reference,
        },
    ))
}

impl GrammersConnection {
    async fn me(&self) -> Result<grammers_client::types::User, TelegramError> {
        self.client.get_me().await.map_err(rpc_error)
    }

    async fn saved_chat(&self) -> Result<PackedChat, TelegramError> {
        Ok(Chat::User(self.me().await?).pack())
    }

    async fn send_code(&self, phone: &str) -> Result<String, TelegramError> {
        let request = tl::functions::auth::SendCode {
            phone_number: phone.to_string(),
            api_id: self.connector.api_id,
            api_hash: self.connector.api_hash.clone(),
            settings: tl::types::CodeSettings {
                allow_flashcall: false,
                current_number: false,
                allow_app_hash: false,
                allow_missed_call: false,
                allow_firebase: false,
                unknown_number: false,
                logout_tokens: None,
                token: None,
                app_sandbox: None,
            }
            .into(),
        };
        let sent = self.client.invoke(&request).await.map_err(rpc_error)?;
        let sent = tl::types::auth::SentCode::try_from(sent).map_err(unexpected)?;
        Ok(sent.phone_code_hash)
    }

    fn remember_user(&self, user: tl::enums::User) {
        if let Ok(user) = tl::types::User::try_from(user) {
            self.client.session().set_user(user.id, self.dc_id, false);
        }
    }

    /// Fetch a small file in one piece with `upload.getFile`.
    async fn fetch_file(
        &self,
        location: tl::enums::InputFileLocation,
    ) -> Result<Vec<u8>, TelegramError> {
        let mut bytes = Vec::new();
        loop {
            let request = tl::functions::upload::GetFile {
                precise: false,
                cdn_supported: false,
                location: location.clone(),
                offset: bytes.len() as i64,
                limit: FILE_CHUNK,
            };
            let file = self.client.invoke(&request).await.map_err(rpc_error)?;
            let file = tl::types::upload::File::try_from(file).map_err(unexpected)?;
            let last = file.bytes.len() < FILE_CHUNK as usize;
            bytes.extend(file.bytes);
            if last {
                return Ok(bytes);
            }
        }
    }
}

#[async_trait]
impl Connection for GrammersConnection {
    type Media = Media;

    async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client.is_authorized().await.map_err(rpc_error)
    }

    async fn request_code(&self, phone: &str) -> Result<CodeRequest, TelegramError> {
        match self.send_code(phone).await {
            Err(TelegramError::Migrate(dc_id)) => {
                info!(dc_id, "Phone number is homed on another data center, retrying there");
                let migrated = self.connector.open(migrated_session(dc_id)).await?;
                let phone_code_hash = migrated.send_code(phone).await?;
                Ok(CodeRequest {
                    phone_code_hash,
                    session: migrated.export_session(),
                })
            }
            result => Ok(CodeRequest {
                phone_code_hash: result?,
                session: self.export_session(),
            }),
        }
    }

    async fn sign_in(
        &self,
        phone: &str,
        phone_code_hash: &str,
        code: &str,
    ) -> Result<(), SignInError> {
        let request = tl::functions::auth::SignIn {
            phone_number: phone.to_string(),
            phone_code_hash: phone_code_hash.to_string(),
            phone_code: Some(code.to_string()),
            email_verification: None,
        };
        match self.client.invoke(&request).await {
            Ok(authorization) => {
                let authorization = tl::types::auth::Authorization::try_from(authorization)
                    .map_err(|_| {
                        SignInError::Failed(
                            "This phone number is not registered with Telegram".to_string(),
                        )
                    })?;
                self.remember_user(authorization.user);
                Ok(())
            }
            Err(InvocationError::Rpc(rpc)) if rpc.name == "SESSION_PASSWORD_NEEDED" => {
                Err(SignInError::PasswordRequired)
            }
            Err(err) => Err(rpc_error(err).into()),
        }
    }

    async fn check_password(&self, password: &str) -> Result<(), SignInError> {
        let request = tl::functions::account::GetPassword {};
        let params = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| SignInError::from(rpc_error(e)))?;
        let params = tl::types::account::Password::try_from(params)
            .map_err(|e| SignInError::from(unexpected(e)))?;

        self.client
            .check_password(PasswordToken::new(params), password)
            .await
            .map_err(|e| SignInError::Failed(e.to_string()))?;
        Ok(())
    }

    async fn profile(&self) -> Result<Profile, TelegramError> {
        let me = self.me().await?;
        Ok(Profile {
            first_name: me.raw.first_name.clone(),
            last_name: me.raw.last_name.clone(),
            username: me.raw.username.clone(),
        })
    }

    async fn profile_photo(&self) -> Result<Option<Vec<u8>>, TelegramError> {
        let me = self.me().await?;
        let Some(photo) = me.raw.photo.clone() else {
            return Ok(None);
        };
        let Ok(photo) = tl::types::UserProfilePhoto::try_from(photo) else {
            return Ok(None);
        };
        let location = tl::types::InputPeerPhotoFileLocation {
            big: false,
            peer: tl::types::InputPeerSelf {}.into(),
            photo_id: photo.photo_id,
        }
        .into();
        self.fetch_file(location).await.map(Some)
    }

    async fn saved_media(
        &self,
        search: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SavedMedia<Media>>, TelegramError> {
        let chat = self.saved_chat().await?;

        macro_rules! messages {
            ($iter:expr) => {
                futures::stream::try_unfold($iter, |mut messages| async move {
                    let message = messages.next().await.map_err(rpc_error)?;
                    Ok::<_, TelegramError>(message.map(|message| (message, messages)))
                })
            };
        }

        let found = match search {
            Some(term) => {
                let source = messages!(self.client.search_messages(chat).query(term));
                collect_limited(source, limit, |message| to_saved_media(&message)).await?
            }
            None => {
                let source = messages!(self.client.iter_messages(chat));
                collect_limited(source, limit, |message| to_saved_media(&message)).await?
            }
        };

        debug!(count = found.len(), "Collected saved media");
        Ok(found)
    }

    async fn saved_message(&self, id: i32) -> Result<Option<SavedMedia<Media>>, TelegramError> {
        let chat = self.saved_chat().await?;
        let messages = self
            .client
            .get_messages_by_id(chat, &[id])
            .await
            .map_err(rpc_error)?;
        Ok(messages
            .into_iter()
            .flatten()
            .next()
            .and_then(|message| to_saved_media(&message)))
    }

    async fn thumbnail(&self, media: &Media) -> Result<Option<Vec<u8>>, TelegramError> {
        let Some((sizes, source)) = preview_sizes(media) else {
            return Ok(None);
        };
        match preview::smallest(sizes.into_iter().map(to_preview)) {
            Some(Preview::Remote { kind, .. }) => {
                self.fetch_file(source.location(kind)).await.map(Some)
            }
            Some(Preview::Cached(bytes)) => Ok(Some(bytes)),
            Some(Preview::Stripped) | None => Ok(None),
        }
    }

    async fn download(&self, media: &Media) -> Result<MediaStream, TelegramError> {
        let download = self
            .client
            .iter_download(&Downloadable::Media(media.clone()));
        let stream = futures::stream::try_unfold(download, |mut download| async move {
            let chunk = download.next().await.map_err(rpc_error)?;
            Ok(chunk.map(|chunk| (chunk, download)))
        });
        Ok(Box::pin(stream))
    }

    async fn send_file(&self, path: &Path, caption: &str) -> Result<(), TelegramError> {
        let chat = self.saved_chat().await?;
        let uploaded = self.client.upload_file(path).await?;
        let message = InputMessage::text(caption)
            .document(uploaded)
            .mime_type(guess_mime_type(caption));
        self.client
            .send_message(chat, message)
            .await
            .map_err(rpc_error)?;
        Ok(())
    }

    fn export_session(&self) -> SessionToken {
        SessionToken::from_bytes(&self.client.session().save())
    }
}
