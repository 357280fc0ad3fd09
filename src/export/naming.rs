//! Output file naming: sanitization and conflict resolution.
//!
//! Source names arrive from arbitrary filesystems and drag-and-drop events;
//! the archive must only ever see names that are safe to extract anywhere
//! and unique within the export.

use std::collections::HashSet;

use thiserror::Error;

/// Characters never allowed in an output file name.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest base (pre-extension) kept, in characters.
const MAX_BASE_CHARS: usize = 200;

/// Cap on `_N` suffix probing before resolution fails.
const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// Fallback base when sanitization consumes the whole name.
const FALLBACK_BASE: &str = "image";

/// Error type for name conflict resolution.
#[derive(Debug, Error)]
pub enum NamingError {
    /// Every numbered variant of the candidate was already taken.
    #[error("No free name for {0} within {max} attempts", max = MAX_SUFFIX_ATTEMPTS)]
    SuffixesExhausted(String),
}

/// Derive a safe output name from a source name and a target extension.
///
/// Strips the source extension, replaces filesystem-reserved punctuation and
/// control characters with `_`, collapses whitespace runs, strips
/// leading/trailing dots, and truncates the base to 200 characters before
/// appending `.{target_ext}`.
pub fn sanitize_file_name(original: &str, target_ext: &str) -> String {
    // Drop the source extension; a lone leading dot is part of the base.
    let base = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };

    let replaced: String = base
        .chars()
        .map(|c| {
            if c.is_control() || ILLEGAL_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Collapse whitespace runs to single spaces and trim the ends.
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut base: String = collapsed.trim_matches('.').chars().take(MAX_BASE_CHARS).collect();
    // Truncation can expose a trailing dot or space again.
    while base.ends_with('.') || base.ends_with(' ') {
        base.pop();
    }
    if base.is_empty() {
        base = FALLBACK_BASE.to_string();
    }

    format!("{base}.{target_ext}")
}

/// Reserves output names for the scope of one export.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `candidate`, or the first free `stem_N.ext` variant of it.
    ///
    /// # Errors
    ///
    /// Fails once 1000 numbered variants have been probed without finding a
    /// free name.
    pub fn resolve(&mut self, candidate: &str) -> Result<String, NamingError> {
        if self.used.insert(candidate.to_string()) {
            return Ok(candidate.to_string());
        }

        let (stem, ext) = match candidate.rfind('.') {
            Some(idx) if idx > 0 => (&candidate[..idx], Some(&candidate[idx + 1..])),
            _ => (candidate, None),
        };

        for n in 1..=MAX_SUFFIX_ATTEMPTS {
            let variant = match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            if self.used.insert(variant.clone()) {
                return Ok(variant);
            }
        }

        Err(NamingError::SuffixesExhausted(candidate.to_string()))
    }
}
