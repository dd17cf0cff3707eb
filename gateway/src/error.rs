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

//! Request failures and their HTTP renderings

use crate::telegram::{SignInError, TelegramError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use savedrive_common::api::{ErrorResponse, StatusResponse};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Not logged in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GatewayError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{success: false, message}` as used by the action routes
    pub fn into_status_response(self) -> Response {
        (self.status(), Json(StatusResponse::failed(self.to_string()))).into_response()
    }

    /// `{error}` as used by the lookup routes
    pub fn into_error_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }

    /// Plain text as used by the media routes
    pub fn into_text_response(self) -> Response {
        let body = match &self {
            GatewayError::Unauthenticated => "Not authorized".to_string(),
            other => other.to_string(),
        };
        (self.status(), body).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.into_status_response()
    }
}

impl From<TelegramError> for GatewayError {
    fn from(err: TelegramError) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl From<SignInError> for GatewayError {
    fn from(err: SignInError) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Upstream(err.to_string())
    }
}
