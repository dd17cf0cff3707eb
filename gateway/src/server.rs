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

//! HTTP surface of the gateway

pub mod api;
#[cfg(test)]
pub mod test_utils;
pub mod webapp;

use crate::context::GatewayContext;
use crate::telegram::Connector;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Build the complete application router.
pub fn router<C: Connector>(context: GatewayContext<C>) -> Router {
    Router::new()
        .merge(webapp::router())
        .nest("/api", api::router::<C>(context.upload_limit()))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
