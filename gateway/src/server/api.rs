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

//! JSON API used by the browser client

use crate::context::GatewayContext;
use crate::error::GatewayError;
use crate::files;
use crate::login::{self, LoginOutcome};
use crate::session::CookieSession;
use crate::telegram::Connector;
use axum::{
    Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderValue, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use axum_extra::extract::SignedCookieJar;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use savedrive_common::api::{
    FileQuery, LoginRequest, LoginStatusResponse, ProfileResponse, SendCodeRequest,
    StatusResponse,
};
use savedrive_common::filename::content_disposition;
use tracing::error;

/// Create the API router
pub fn router<C: Connector>(upload_limit: usize) -> Router<GatewayContext<C>> {
    Router::new()
        .route("/is_logged_in", get(is_logged_in))
        .route("/send_code", post(send_code::<C>))
        .route("/login", post(sign_in::<C>))
        .route("/logout", post(logout::<C>))
        .route("/me", get(me::<C>))
        .route("/thumbnail/{id}", get(thumbnail::<C>))
        .route("/files", get(list_files::<C>))
        .route("/download/{id}", get(download::<C>))
        .route(
            "/upload",
            post(upload::<C>).layer(DefaultBodyLimit::max(upload_limit)),
        )
}

/// Write the session back and render the result in the route's shape.
fn respond<C: Connector>(
    context: &GatewayContext<C>,
    jar: SignedCookieJar,
    mut session: CookieSession,
    result: Result<Response, GatewayError>,
    render: fn(GatewayError) -> Response,
) -> Response {
    if matches!(result, Err(GatewayError::Unauthenticated)) {
        session.forget_token();
    }
    let jar = session.apply(jar, context.cookie_policy());
    match result {
        Ok(response) => (jar, response).into_response(),
        Err(err) => (jar, render(err)).into_response(),
    }
}

async fn is_logged_in(jar: SignedCookieJar) -> Json<LoginStatusResponse> {
    Json(LoginStatusResponse {
        logged_in: CookieSession::from_jar(&jar).is_logged_in(),
    })
}

async fn send_code<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    body: Result<Json<SendCodeRequest>, JsonRejection>,
) -> Response {
    let mut session = CookieSession::from_jar(&jar);
    let result = match body {
        Ok(Json(request)) => {
            let phone = request.phone.unwrap_or_default();
            login::request_code(context.connector(), &mut session, &phone)
                .await
                .map(|()| Json(StatusResponse::ok("Code sent!")).into_response())
        }
        Err(rejection) => Err(GatewayError::validation(rejection.body_text())),
    };
    respond(&context, jar, session, result, GatewayError::into_status_response)
}

async fn sign_in<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let mut session = CookieSession::from_jar(&jar);
    let result = match body {
        Ok(Json(request)) => {
            let code = request.code.unwrap_or_default();
            login::submit_code(
                context.connector(),
                &mut session,
                &code,
                request.password.as_deref(),
            )
            .await
            .map(|outcome| match outcome {
                LoginOutcome::Authenticated => {
                    Json(StatusResponse::ok("Login successful!")).into_response()
                }
                LoginOutcome::TwoFactorRequired => {
                    Json(StatusResponse::two_factor_required()).into_response()
                }
            })
        }
        Err(rejection) => Err(GatewayError::validation(rejection.body_text())),
    };
    respond(&context, jar, session, result, GatewayError::into_status_response)
}

async fn logout<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
) -> Response {
    let mut session = CookieSession::from_jar(&jar);
    login::logout(&mut session);
    let result = Ok(Json(StatusResponse::ok("Logged out.")).into_response());
    respond(&context, jar, session, result, GatewayError::into_status_response)
}

async fn load_profile<C: Connector>(
    context: &GatewayContext<C>,
    session: &CookieSession,
) -> Result<ProfileResponse, GatewayError> {
    let connection = files::open_authorized(context.connector(), session).await?;
    let me = files::profile(&connection).await?;
    Ok(ProfileResponse {
        first_name: me.profile.first_name,
        last_name: me.profile.last_name,
        username: me.profile.username,
        photo: me.photo.map(|photo| STANDARD.encode(photo)),
    })
}

async fn me<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
) -> Response {
    let session = CookieSession::from_jar(&jar);
    let result = load_profile(&context, &session)
        .await
        .map(|profile| Json(profile).into_response());
    respond(&context, jar, session, result, GatewayError::into_error_response)
}

async fn load_thumbnail<C: Connector>(
    context: &GatewayContext<C>,
    session: &CookieSession,
    id: i32,
) -> Result<Vec<u8>, GatewayError> {
    let connection = files::open_authorized(context.connector(), session).await?;
    files::thumbnail(&connection, id).await
}

async fn thumbnail<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    Path(id): Path<i32>,
) -> Response {
    let session = CookieSession::from_jar(&jar);
    let result = load_thumbnail(&context, &session, id)
        .await
        .map(|bytes| ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
        .map_err(|err| match err {
            GatewayError::Upstream(reason) => {
                error!("Thumbnail for message {} failed: {}", id, reason);
                GatewayError::Upstream("Error generating thumbnail".to_string())
            }
            other => other,
        });
    respond(&context, jar, session, result, GatewayError::into_text_response)
}

async fn load_files<C: Connector>(
    context: &GatewayContext<C>,
    session: &CookieSession,
    query: &FileQuery,
) -> Result<savedrive_common::FileCatalog, GatewayError> {
    let connection = files::open_authorized(context.connector(), session).await?;
    files::list_files(&connection, query.term(), context.list_limit()).await
}

async fn list_files<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    Query(query): Query<FileQuery>,
) -> Response {
    let session = CookieSession::from_jar(&jar);
    let result = load_files(&context, &session, &query)
        .await
        .map(|catalog| Json(catalog).into_response());
    respond(&context, jar, session, result, GatewayError::into_error_response)
}

async fn load_download<C: Connector>(
    context: &GatewayContext<C>,
    session: &CookieSession,
    id: i32,
) -> Result<Response, GatewayError> {
    let connection = files::open_authorized(context.connector(), session).await?;
    let file = files::download(&connection, id).await?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&file.file_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(file.stream),
    )
        .into_response())
}

async fn download<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    Path(id): Path<i32>,
) -> Response {
    let session = CookieSession::from_jar(&jar);
    let result = load_download(&context, &session, id).await;
    respond(&context, jar, session, result, GatewayError::into_text_response)
}

async fn receive_upload<C: Connector>(
    context: &GatewayContext<C>,
    session: &CookieSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, GatewayError> {
    let connection = files::open_authorized(context.connector(), session).await?;
    let mut multipart = multipart.map_err(|e| GatewayError::validation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::validation(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(GatewayError::validation("No selected file"));
        }
        return files::upload(&connection, context.scratch_dir(), &file_name, field).await;
    }

    Err(GatewayError::validation("No file part"))
}

async fn upload<C: Connector>(
    State(context): State<GatewayContext<C>>,
    jar: SignedCookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let session = CookieSession::from_jar(&jar);
    let result = receive_upload(&context, &session, multipart)
        .await
        .map(|_| Json(StatusResponse::ok("File uploaded!")).into_response());
    respond(&context, jar, session, result, GatewayError::into_status_response)
}
