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

//! Saved-media categories
//!
//! Every media-bearing saved message lands in exactly one [`FileCategory`].
//! Classification walks the rule table in order; a rule matches when the MIME type
//! contains one of its fragments or the file name ends with one of its
//! extensions. Bare photo attachments are always images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Maximum number of media items returned by a single listing.
pub const LIST_LIMIT: usize = 200;

/// Category a saved file is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Audio,
    Video,
    Compressed,
    Document,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Image => "image",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Compressed => "compressed",
            FileCategory::Document => "document",
            FileCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    category: FileCategory,
    mime_fragments: &'static [&'static str],
    extensions: &'static [&'static str],
}

impl Rule {
    fn matches(&self, mime_type: &str, file_name: &str) -> bool {
        self.mime_fragments
            .iter()
            .any(|fragment| mime_type.contains(fragment))
            || self
                .extensions
                .iter()
                .any(|extension| file_name.ends_with(extension))
    }
}

const RULES: [Rule; 5] = [
    Rule {
        category: FileCategory::Image,
        mime_fragments: &["image"],
        extensions: &[],
    },
    Rule {
        category: FileCategory::Audio,
        mime_fragments: &["audio"],
        extensions: &[".mp3", ".wav", ".ogg", ".m4a", ".flac"],
    },
    Rule {
        category: FileCategory::Video,
        mime_fragments: &["video"],
        extensions: &[".mp4", ".mov", ".avi", ".mkv", ".webm"],
    },
    Rule {
        category: FileCategory::Compressed,
        mime_fragments: &["zip", "rar"],
        extensions: &[".zip", ".rar", ".tar", ".gz", ".7z"],
    },
    Rule {
        category: FileCategory::Document,
        mime_fragments: &["pdf", "text", "csv", "doc", "xls", "ppt"],
        extensions: &[
            ".pdf", ".txt", ".csv", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".md",
        ],
    },
];

/// Classify a document by MIME type and file name.
///
/// Both inputs are compared case-insensitively and either may be empty.
pub fn classify(mime_type: &str, file_name: &str) -> FileCategory {
    let mime_type = mime_type.to_lowercase();
    let file_name = file_name.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&mime_type, &file_name))
        .map(|rule| rule.category)
        .unwrap_or(FileCategory::Other)
}

/// What kind of attachment a saved message carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    /// A bare photo attachment
    Photo,

    /// A document with its stored attributes
    Document {
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

impl MediaKind {
    pub fn category(&self) -> FileCategory {
        match self {
            MediaKind::Photo => FileCategory::Image,
            MediaKind::Document {
                file_name,
                mime_type,
            } => classify(
                mime_type.as_deref().unwrap_or(""),
                file_name.as_deref().unwrap_or(""),
            ),
        }
    }

    /// MIME type to serve the full payload with.
    pub fn content_type(&self) -> &str {
        match self {
            MediaKind::Photo => "image/jpeg",
            MediaKind::Document { mime_type, .. } => mime_type
                .as_deref()
                .filter(|mime| !mime.is_empty())
                .unwrap_or("application/octet-stream"),
        }
    }

    fn stored_name(&self) -> Option<&str> {
        match self {
            MediaKind::Photo => None,
            MediaKind::Document { file_name, .. } => {
                file_name.as_deref().filter(|name| !name.is_empty())
            }
        }
    }
}

/// A media-bearing message in the user's saved-message store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedItem {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub kind: MediaKind,
}

impl SavedItem {
    pub fn category(&self) -> FileCategory {
        self.kind.category()
    }

    /// Name shown in listings
    pub fn display_name(&self) -> String {
        match &self.kind {
            MediaKind::Photo => format!("photo_{}.jpg", self.id),
            kind => kind
                .stored_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("file_{}", self.id)),
        }
    }

    /// Name offered in the download's content disposition
    pub fn download_name(&self) -> String {
        match &self.kind {
            MediaKind::Photo => format!("photo_{}.jpg", self.id),
            kind => kind
                .stored_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("download_{}", self.id)),
        }
    }

    pub fn descriptor(&self) -> FileDescriptor {
        FileDescriptor {
            id: self.id,
            date: self.date,
            name: self.display_name(),
            category: self.category(),
        }
    }
}

/// Listing entry for one saved file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: i32,

    /// Message timestamp, serialized as ISO-8601 with an explicit offset
    #[serde(serialize_with = "serialize_iso8601")]
    pub date: DateTime<Utc>,

    pub name: String,

    #[serde(rename = "type")]
    pub category: FileCategory,
}

fn serialize_iso8601<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339())
}

/// Saved files grouped by category, each list newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCatalog {
    pub images: Vec<FileDescriptor>,
    pub documents: Vec<FileDescriptor>,
    pub audio: Vec<FileDescriptor>,
    pub video: Vec<FileDescriptor>,
    pub compressed: Vec<FileDescriptor>,
    pub other: Vec<FileDescriptor>,
}

impl FileCatalog {
    /// Append a descriptor to the list of its category.
    pub fn insert(&mut self, descriptor: FileDescriptor) {
        let list = match descriptor.category {
            FileCategory::Image => &mut self.images,
            FileCategory::Document => &mut self.documents,
            FileCategory::Audio => &mut self.audio,
            FileCategory::Video => &mut self.video,
            FileCategory::Compressed => &mut self.compressed,
            FileCategory::Other => &mut self.other,
        };
        list.push(descriptor);
    }

    /// Total number of descriptors across all categories
    pub fn len(&self) -> usize {
        self.images.len()
            + self.documents.len()
            + self.audio.len()
            + self.video.len()
            + self.compressed.len()
            + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<&'a SavedItem> for FileCatalog {
    fn from_iter<I: IntoIterator<Item = &'a SavedItem>>(items: I) -> Self {
        let mut catalog = FileCatalog::default();
        for item in items {
            catalog.insert(item.descriptor());
        }
        catalog
    }
}
