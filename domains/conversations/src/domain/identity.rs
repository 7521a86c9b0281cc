//! Canonical conversation identity
//!
//! A conversation belongs to exactly one unordered pair of users, so its id is
//! derived from the pair rather than allocated. Two encodings exist:
//!
//! - plain: `{low}_{high}` for ids that do not contain the separator. This is
//!   the readable form existing clients already store.
//! - hashed: `h-{sha256 hex}` of the length-prefixed sorted pair, used as soon
//!   as either id contains the separator (where the plain form would be
//!   ambiguous, e.g. `a_b`+`c` vs `a`+`b_c`).
//!
//! A plain id always contains exactly one separator and a hashed id none, so
//! the two forms never collide with each other.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thrift_common::{Error, Result};

/// Separator of the plain form
pub const SEPARATOR: char = '_';

const HASHED_PREFIX: &str = "h-";
const HASH_HEX_LEN: usize = 64;

/// Deterministic id of the conversation between two users
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Id for the unordered pair `{a, b}`
    pub fn for_pair(a: &str, b: &str) -> Self {
        derive_id(a, b)
    }

    /// Accept an id that arrived from outside (path segment, notification)
    ///
    /// Only checks the shape; whether the conversation exists is the store's
    /// business.
    pub fn parse(raw: &str) -> Result<Self> {
        let well_formed = match raw.strip_prefix(HASHED_PREFIX) {
            Some(hash) if !raw.contains(SEPARATOR) => {
                hash.len() == HASH_HEX_LEN && hash.chars().all(|c| c.is_ascii_hexdigit())
            }
            _ => match raw.split_once(SEPARATOR) {
                Some((low, high)) => {
                    !low.is_empty() && !high.is_empty() && !high.contains(SEPARATOR) && low <= high
                }
                None => false,
            },
        };

        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(Error::Validation(format!(
                "Malformed conversation id: {}",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the conversation id for two user ids, independent of their order
pub fn derive_id(a: &str, b: &str) -> ConversationId {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };

    if is_plain(low) && is_plain(high) {
        ConversationId(format!("{}{}{}", low, SEPARATOR, high))
    } else {
        ConversationId(hashed(low, high))
    }
}

fn is_plain(id: &str) -> bool {
    !id.is_empty() && !id.contains(SEPARATOR)
}

fn hashed(low: &str, high: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [low, high] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{}{}", HASHED_PREFIX, hex::encode(hasher.finalize()))
}
