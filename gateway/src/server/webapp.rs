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

use axum::Router;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;

const INDEX_HTML: &str = include_str!("../../defaults/index.html");
const INDEX_CSS: &str = include_str!("../../defaults/index.css");
const INDEX_JS: &str = include_str!("../../defaults/index.js");

/// Routes serving the browser client
pub fn router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new()
        .route("/", get(client_page))
        .route("/index.html", get(client_page))
        .route("/index.css", get(client_css))
        .route("/index.js", get(client_js))
}

async fn client_page() -> Response {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], INDEX_HTML).into_response()
}

async fn client_css() -> Response {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], INDEX_CSS).into_response()
}

async fn client_js() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        INDEX_JS,
    )
        .into_response()
}
