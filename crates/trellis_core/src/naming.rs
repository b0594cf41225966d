//! Logical identity allocation.
//!
//! A logical id is the deploy-system-safe identity derived from a node's
//! tree path. Ids are deterministic, length-bounded, and collision
//! resistant: nested paths always embed a fixed-width hash of the full
//! sanitized path, so concatenation ambiguity (`AB/C` vs `A/BC`) and
//! truncation can never silently merge two distinct paths.

use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

/// Maximum length of an allocated logical id.
pub const MAX_ID_LEN: usize = 255;

/// Hex characters of the path hash embedded in nested ids.
const HASH_LEN: usize = 8;

/// Allocates logical ids from tree paths.
///
/// Allocation is a pure function: the same path always yields the same id,
/// with no shared state and no randomness.
pub struct IdAllocator;

impl IdAllocator {
    /// Allocate the logical id for a path given root-to-leaf components.
    ///
    /// Top-level constructs keep their sanitized name as-is when it fits.
    /// Nested paths append an 8-char hash of the full sanitized path; if
    /// the human-readable concatenation overflows [`MAX_ID_LEN`], the id
    /// keeps its head and tail with the hash in the middle, sized to the
    /// limit exactly.
    pub fn allocate<S: AsRef<str>>(components: &[S]) -> CoreResult<String> {
        if components.is_empty() {
            return Err(CoreError::EmptyPath);
        }
        let sanitized: Vec<String> = components
            .iter()
            .map(|c| Self::sanitize(c.as_ref()))
            .collect::<CoreResult<_>>()?;
        let human: String = sanitized.concat();

        if sanitized.len() == 1 && human.len() <= MAX_ID_LEN {
            return Ok(human);
        }

        let hash = Self::path_hash(&sanitized);
        if human.len() + HASH_LEN <= MAX_ID_LEN {
            return Ok(format!("{human}{hash}"));
        }

        let keep = MAX_ID_LEN - HASH_LEN;
        let prefix_len = keep / 2;
        let suffix_len = keep - prefix_len;
        let prefix = &human[..prefix_len];
        let suffix = &human[human.len() - suffix_len..];
        Ok(format!("{prefix}{hash}{suffix}"))
    }

    /// Strip a path segment down to the allowed character set.
    ///
    /// Fails with [`CoreError::InvalidName`] if nothing remains.
    pub fn sanitize(segment: &str) -> CoreResult<String> {
        let cleaned: String = segment.chars().filter(char::is_ascii_alphanumeric).collect();
        if cleaned.is_empty() {
            return Err(CoreError::InvalidName(segment.to_string()));
        }
        Ok(cleaned)
    }

    /// Fixed-width hash over the `/`-joined, un-truncated sanitized path.
    fn path_hash(sanitized: &[String]) -> String {
        let digest = Sha256::digest(sanitized.join("/").as_bytes());
        let mut hash = String::with_capacity(HASH_LEN);
        for byte in digest.iter().take(HASH_LEN / 2) {
            hash.push_str(&format!("{byte:02X}"));
        }
        hash
    }
}
