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

//! Upload filename handling

use unicode_normalization::UnicodeNormalization;

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// Accents are decomposed (NFKD) and the marks dropped, path separators
/// become whitespace, whitespace runs become a single `_`,
/// anything outside `[A-Za-z0-9_.-]` is dropped, and leading or trailing
/// `.` and `_` are stripped. Returns `None` when nothing survives.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let flattened: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let safe: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let safe = safe.trim_matches(|c| c == '.' || c == '_');

    if safe.is_empty() {
        None
    } else {
        Some(safe.to_string())
    }
}

/// Name used when sanitization leaves nothing behind
pub fn fallback_upload_name(unix_seconds: i64) -> String {
    format!("upload_{}", unix_seconds)
}

/// MIME type for a file name, from its extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

/// `Content-Disposition` value for downloading a file under `name`.
///
/// Carries an ASCII `filename` fallback plus an RFC 5987 `filename*` so
/// non-ASCII names survive.
pub fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
