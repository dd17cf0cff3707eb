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

use axum_extra::extract::cookie::Key;
use clap::Parser;
use savedrive_common::LIST_LIMIT;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum length of a configured cookie secret in bytes
pub const MIN_COOKIE_SECRET_LEN: usize = 32;

/// Telegram's cap on a single user-account upload
pub const DEFAULT_UPLOAD_LIMIT: usize = 2000 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "gateway/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "gateway/.env"
    )]
    pub env_file: Option<String>,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to open config file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub cookie: CookieConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        tracing::debug!("Loading configuration from file: {}", path);
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_string(),
            source,
        })?;

        let conf = serde_yaml::from_reader(file)?;

        Ok(conf)
    }

    /// Reject settings the gateway cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if *self.telegram.api_id == 0 {
            return Err(ConfigError::Invalid(
                "telegram.api_id must be set to the id issued by my.telegram.org".to_string(),
            ));
        }
        if self.telegram.api_hash.as_str().is_empty() {
            return Err(ConfigError::Invalid(
                "telegram.api_hash must be set to the hash issued by my.telegram.org".to_string(),
            ));
        }
        let secret = self.cookie.secret.as_str();
        if !secret.is_empty() && secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "cookie.secret must be at least {} bytes",
                MIN_COOKIE_SECRET_LEN
            )));
        }
        if self.files.list_limit == 0 || self.files.list_limit > LIST_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "files.list_limit must be between 1 and {}",
                LIST_LIMIT
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "upload.max_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Application id from my.telegram.org
    #[serde(default)]
    pub api_id: EnvField<i32>,

    /// Application hash from my.telegram.org
    #[serde(default)]
    pub api_hash: EnvField<ApiHash>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiHash(String);

impl ApiHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ApiHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Debug for ApiHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiHash(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub addr: EnvField<HttpBinding>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HttpBinding(SocketAddr);

impl HttpBinding {
    pub fn to_addr(&self) -> SocketAddr {
        self.0
    }
    pub fn to_ip(&self) -> IpAddr {
        self.0.ip()
    }
    pub fn to_port(&self) -> u16 {
        self.0.port()
    }
}

impl FromStr for HttpBinding {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(SocketAddr::from_str(s)?))
    }
}

impl Default for HttpBinding {
    fn default() -> Self {
        Self(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::new(0, 0, 0, 0),
            5000,
        )))
    }
}

impl std::fmt::Display for HttpBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Master secret the cookie signing key is derived from
    #[serde(default)]
    pub secret: EnvField<CookieSecret>,

    /// Mark cookies `Secure` (serve over HTTPS when enabled)
    #[serde(default)]
    pub secure: EnvField<bool>,
}

impl CookieConfig {
    /// Signing key for the session cookies.
    ///
    /// An empty secret yields a random key, which invalidates every cookie
    /// when the process restarts.
    pub fn key(&self) -> Result<Key, ConfigError> {
        let secret = self.secret.as_str();
        if secret.is_empty() {
            tracing::warn!(
                "No cookie secret configured, generating an ephemeral key; sessions will not survive a restart"
            );
            return Ok(Key::generate());
        }
        if secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "cookie.secret must be at least {} bytes",
                MIN_COOKIE_SECRET_LEN
            )));
        }
        Ok(Key::derive_from(secret.as_bytes()))
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CookieSecret(String);

impl CookieSecret {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CookieSecret {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl std::fmt::Debug for CookieSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CookieSecret(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory holding upload scratch space
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: EnvField<String>,

    /// Largest accepted request body on the upload route
    #[serde(default = "default_upload_limit")]
    pub max_bytes: usize,
}

fn default_scratch_dir() -> EnvField<String> {
    EnvField::from("uploads".to_string())
}

fn default_upload_limit() -> usize {
    DEFAULT_UPLOAD_LIMIT
}

impl UploadConfig {
    pub fn scratch_path(&self) -> PathBuf {
        PathBuf::from(self.scratch_dir.as_str())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        UploadConfig {
            scratch_dir: default_scratch_dir(),
            max_bytes: default_upload_limit(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Number of saved messages scanned per listing
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_list_limit() -> usize {
    LIST_LIMIT
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            list_limit: default_list_limit(),
        }
    }
}
