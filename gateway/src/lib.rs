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


//! SavedDrive Gateway Library
//!
//! This library provides the web gateway that lets a browser sign in to a
//! Telegram account and browse, download and upload the files kept in its
//! "Saved Messages" chat.

pub mod config;
pub mod context;
pub mod error;
pub mod files;
pub mod login;
pub mod server;
pub mod session;
pub mod telegram;

// Re-export commonly used types
pub use context::GatewayContext;
pub use error::GatewayError;
pub use session::{CookiePolicy, CookieSession, LoginState};
pub use telegram::grammers::GrammersConnector;
pub use telegram::{Connection, Connector, SessionToken, TelegramError};
