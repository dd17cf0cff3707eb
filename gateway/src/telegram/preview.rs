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

//! Thumbnail size selection

/// One preview size attached to a photo or document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Stored on the server, fetched by its size type
    Remote { kind: String, size: usize },

    /// JPEG bytes delivered inline with the message
    Cached(Vec<u8>),

    /// Compressed inline placeholder, not a standalone JPEG
    Stripped,
}

/// Pick the smallest usable preview.
///
/// Downloadable sizes win over inline ones; stripped placeholders are never
/// chosen.
pub fn smallest(previews: impl IntoIterator<Item = Preview>) -> Option<Preview> {
    let mut remote: Option<Preview> = None;
    let mut cached: Option<Preview> = None;

    for preview in previews {
        match &preview {
            Preview::Remote { size, .. } => {
                let smaller = match &remote {
                    Some(Preview::Remote { size: best, .. }) => size < best,
                    _ => true,
                };
                if smaller {
                    remote = Some(preview);
                }
            }
            Preview::Cached(bytes) if !bytes.is_empty() => {
                let smaller = match &cached {
                    Some(Preview::Cached(best)) => bytes.len() < best.len(),
                    _ => true,
                };
                if smaller {
                    cached = Some(preview);
                }
            }
            Preview::Cached(_) | Preview::Stripped => {}
        }
    }

    remote.or(cached)
}
