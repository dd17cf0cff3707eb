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

//! Operations on the user's saved files

use crate::error::GatewayError;
use crate::session::CookieSession;
use crate::telegram::{Connection, Connector, MediaStream, Profile, TelegramError};
use axum::body::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use savedrive_common::filename::{fallback_upload_name, sanitize_filename};
use savedrive_common::{FileCatalog, FileCategory};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Full payload of a saved file, ready to stream
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub stream: MediaStream,
}

/// Profile plus the small profile photo, when one could be fetched
pub struct ProfileWithPhoto {
    pub profile: Profile,
    pub photo: Option<Vec<u8>>,
}

/// Connect with the browser's session and confirm it is signed in.
pub async fn open_authorized<C: Connector>(
    connector: &C,
    session: &CookieSession,
) -> Result<C::Connection, GatewayError> {
    let token = session.token.as_ref().ok_or(GatewayError::Unauthenticated)?;
    let connection = connector.connect(Some(token)).await.map_err(|e| match e {
        TelegramError::InvalidSession(reason) => {
            debug!("Rejecting unreadable session: {}", reason);
            GatewayError::Unauthenticated
        }
        other => other.into(),
    })?;
    if !connection.is_authorized().await? {
        return Err(GatewayError::Unauthenticated);
    }
    Ok(connection)
}

pub async fn profile<Conn: Connection>(connection: &Conn) -> Result<ProfileWithPhoto, GatewayError> {
    let profile = connection.profile().await?;
    let photo = match connection.profile_photo().await {
        Ok(photo) => photo,
        Err(e) => {
            warn!("Profile photo unavailable: {}", e);
            None
        }
    };
    Ok(ProfileWithPhoto { profile, photo })
}

/// Categorized listing of the newest saved files.
pub async fn list_files<Conn: Connection>(
    connection: &Conn,
    search: Option<&str>,
    limit: usize,
) -> Result<FileCatalog, GatewayError> {
    let media = connection.saved_media(search, limit).await?;
    let catalog: FileCatalog = media.iter().take(limit).map(|saved| &saved.item).collect();
    debug!(count = catalog.len(), search = ?search, "Listed saved files");
    Ok(catalog)
}

/// Preview of an image-classified saved message.
pub async fn thumbnail<Conn: Connection>(connection: &Conn, id: i32) -> Result<Vec<u8>, GatewayError> {
    let saved = connection
        .saved_message(id)
        .await?
        .filter(|saved| saved.item.category() == FileCategory::Image)
        .ok_or_else(|| GatewayError::not_found("Not an image"))?;

    connection
        .thumbnail(&saved.media)
        .await?
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| GatewayError::not_found("No thumbnail available"))
}

pub async fn download<Conn: Connection>(connection: &Conn, id: i32) -> Result<Download, GatewayError> {
    let saved = connection
        .saved_message(id)
        .await?
        .ok_or_else(|| GatewayError::not_found("File not found"))?;

    let stream = connection.download(&saved.media).await?;
    Ok(Download {
        file_name: saved.item.download_name(),
        content_type: saved.item.kind.content_type().to_string(),
        stream,
    })
}

/// Spool an uploaded body to scratch space and send it to saved messages.
///
/// The scratch directory is removed when this returns, whatever the outcome.
/// Returns the sanitized name the file was sent under.
pub async fn upload<Conn, S, E>(
    connection: &Conn,
    scratch_root: &Path,
    file_name: &str,
    body: S,
) -> Result<String, GatewayError>
where
    Conn: Connection,
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: std::fmt::Display,
{
    let safe_name = sanitize_filename(file_name)
        .unwrap_or_else(|| fallback_upload_name(Utc::now().timestamp()));

    tokio::fs::create_dir_all(scratch_root).await?;
    let scratch = tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(scratch_root)?;
    let path = scratch.path().join(&safe_name);

    let mut body = std::pin::pin!(body);
    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| GatewayError::validation(format!("Upload interrupted: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;
    drop(file);

    debug!(file = %safe_name, bytes = written, "Spooled upload");
    connection.send_file(&path, &safe_name).await?;
    info!(file = %safe_name, bytes = written, "Uploaded file to saved messages");
    Ok(safe_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::SessionToken;
    use crate::telegram::test_utils::*;
    use tempfile::TempDir;

    async fn signed_in(telegram: &FakeTelegram) -> CookieSession {
        let mut session = CookieSession::default();
        crate::login::request_code(telegram, &mut session, TEST_PHONE)
            .await
            .unwrap();
        crate::login::submit_code(telegram, &mut session, TEST_CODE, None)
            .await
            .unwrap();
        session
    }

    fn body(chunks: &[&'static str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
        futures::stream::iter(
            chunks
                .iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    fn scratch_entries(root: &Path) -> usize {
        std::fs::read_dir(root).unwrap().count()
    }

    #[tokio::test]
    async fn test_open_authorized_requires_token() {
        let telegram = FakeTelegram::new();
        let err = open_authorized(&telegram, &CookieSession::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err, GatewayError::Unauthenticated);
        assert_eq!(telegram.connections_opened(), 0);
    }

    #[tokio::test]
    async fn test_open_authorized_rejects_stale_and_corrupt_tokens() {
        let telegram = FakeTelegram::new();
        let mut session = CookieSession::default();

        session.authenticate(SessionToken::new("never-signed-in"));
        let err = open_authorized(&telegram, &session).await.err().unwrap();
        assert_eq!(err, GatewayError::Unauthenticated);

        session.authenticate(SessionToken::new(CORRUPT_SESSION));
        let err = open_authorized(&telegram, &session).await.err().unwrap();
        assert_eq!(err, GatewayError::Unauthenticated);
        assert_eq!(telegram.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_list_files_caps_results() {
        let telegram = FakeTelegram::new();
        for id in 1..=250 {
            telegram.add_document(id, Some(format!("notes-{}.txt", id).as_str()), Some("text/plain"), b"x");
        }
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();

        let catalog = list_files(&connection, None, 200).await.unwrap();
        assert_eq!(catalog.len(), 200);
        assert_eq!(catalog.documents.first().unwrap().id, 250);
    }

    #[tokio::test]
    async fn test_list_files_groups_and_searches() {
        let telegram = FakeTelegram::new();
        telegram.add_photo(1, None);
        telegram.add_document(2, Some("song.mp3"), Some("audio/mpeg"), b"x");
        telegram.add_document(3, Some("backup.zip"), None, b"x");
        telegram.add_document(4, None, Some("application/octet-stream"), b"x");
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();

        let catalog = list_files(&connection, None, 200).await.unwrap();
        assert_eq!(catalog.images[0].name, "photo_1.jpg");
        assert_eq!(catalog.audio[0].name, "song.mp3");
        assert_eq!(catalog.compressed[0].name, "backup.zip");
        assert_eq!(catalog.other[0].name, "file_4");

        let catalog = list_files(&connection, Some("backup"), 200).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            telegram.searches(),
            vec![None, Some("backup".to_string())]
        );
    }

    #[tokio::test]
    async fn test_thumbnail_rules() {
        let telegram = FakeTelegram::new();
        telegram.add_photo(1, Some(b"\xff\xd8thumb"));
        telegram.add_photo(2, None);
        telegram.add_document(3, Some("report.pdf"), Some("application/pdf"), b"x");
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();

        assert_eq!(thumbnail(&connection, 1).await.unwrap(), b"\xff\xd8thumb".to_vec());
        assert_eq!(
            thumbnail(&connection, 2).await.unwrap_err(),
            GatewayError::not_found("No thumbnail available")
        );
        assert_eq!(
            thumbnail(&connection, 3).await.unwrap_err(),
            GatewayError::not_found("Not an image")
        );
        assert_eq!(
            thumbnail(&connection, 99).await.unwrap_err(),
            GatewayError::not_found("Not an image")
        );
    }

    #[tokio::test]
    async fn test_download_names_and_types() {
        let telegram = FakeTelegram::new();
        telegram.add_document(5, None, None, b"payload");
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();

        let file = download(&connection, 5).await.ok().unwrap();
        assert_eq!(file.file_name, "download_5");
        assert_eq!(file.content_type, "application/octet-stream");
        let chunks: Vec<Vec<u8>> = file
            .stream
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.concat(), b"payload".to_vec());

        let missing = download(&connection, 6).await.err().unwrap();
        assert_eq!(missing, GatewayError::not_found("File not found"));
    }

    #[tokio::test]
    async fn test_upload_sends_sanitized_file_and_cleans_up() {
        let telegram = FakeTelegram::new();
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();
        let scratch = TempDir::new().unwrap();

        let name = upload(&connection, scratch.path(), "my holiday.jpg", body(&["abc", "def"]))
            .await
            .unwrap();

        assert_eq!(name, "my_holiday.jpg");
        assert_eq!(
            telegram.sent(),
            vec![SentFile {
                caption: "my_holiday.jpg".to_string(),
                contents: b"abcdef".to_vec(),
            }]
        );
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_cleans_up_when_send_fails() {
        let telegram = FakeTelegram::new();
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();
        telegram.fail_sends();
        let scratch = TempDir::new().unwrap();

        let err = upload(&connection, scratch.path(), "report.pdf", body(&["data"]))
            .await
            .unwrap_err();

        assert_eq!(err, GatewayError::Upstream("FILE_PARTS_INVALID".to_string()));
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_cleans_up_when_body_fails() {
        let telegram = FakeTelegram::new();
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();
        let scratch = TempDir::new().unwrap();
        let broken = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err("connection reset"),
        ]);

        let err = upload(&connection, scratch.path(), "big.iso", broken)
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(telegram.sent().is_empty());
        assert_eq!(scratch_entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_falls_back_to_generated_name() {
        let telegram = FakeTelegram::new();
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();
        let scratch = TempDir::new().unwrap();

        let name = upload(&connection, scratch.path(), "日本語", body(&["x"]))
            .await
            .unwrap();
        assert!(name.starts_with("upload_"));
    }

    #[tokio::test]
    async fn test_profile_tolerates_photo_failure() {
        let telegram = FakeTelegram::new();
        telegram.set_profile_photo(Some(b"jpeg"));
        let session = signed_in(&telegram).await;
        let connection = open_authorized(&telegram, &session).await.unwrap();

        let me = profile(&connection).await.ok().unwrap();
        assert_eq!(me.photo, Some(b"jpeg".to_vec()));

        telegram.fail_profile_photo();
        let me = profile(&connection).await.ok().unwrap();
        assert_eq!(me.profile.first_name.as_deref(), Some("Ada"));
        assert!(me.photo.is_none());
    }
}
