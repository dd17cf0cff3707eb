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

//! SavedDrive Common Types
//!
//! This crate defines the network-free pieces shared by the SavedDrive gateway:
//! - File categories and the saved-media classification table
//! - Filename sanitization and synthesized download names
//! - Request and response shapes of the browser-facing JSON API

pub mod api;
pub mod catalog;
pub mod filename;

pub use catalog::{FileCatalog, FileCategory, FileDescriptor, LIST_LIMIT, MediaKind, SavedItem};
