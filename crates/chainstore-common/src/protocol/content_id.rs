//! Content identifiers returned by content-addressed stores.
//!
//! Two textual forms are accepted:
//!
//! - CIDv0: 46 characters of base58btc, always starting with `Qm`, wrapping a
//!   sha2-256 multihash (`0x12 0x20 <32-byte digest>`).
//! - CIDv1: any multibase string (`b...`, `z...`, ...) whose decoded bytes
//!   start with the version byte `0x01`.
//!
//! The identifier is otherwise opaque: the client never assumes it can
//! recompute the id a daemon assigns (daemons chunk and wrap content before
//! hashing). [`ContentId::sha256_v0`] derives the id of a single raw block,
//! which is what in-process stores use.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use multibase::Base;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{GatewayError, Result};

const SHA2_256_CODE: u8 = 0x12;
const SHA2_256_LEN: u8 = 0x20;
const CID_V1: u8 = 0x01;

/// How the identifier was rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdEncoding {
    /// Bare base58btc, the CIDv0 form.
    Base58Btc,
    /// Multibase with the given prefix character.
    Multibase(char),
}

#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId {
    bytes: Vec<u8>,
    encoding: IdEncoding,
    text: String,
}

impl ContentId {
    /// Parses and validates an identifier string.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GatewayError::InvalidContentId("empty identifier".into()));
        }
        // Rules out the identity and emoji multibases, which have no
        // printable ASCII form.
        if !text.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(GatewayError::InvalidContentId(format!(
                "{}: not a printable ASCII identifier",
                text.escape_debug()
            )));
        }

        if text.len() == 46 && text.starts_with("Qm") {
            let bytes = Base::Base58Btc
                .decode(text)
                .map_err(|e| GatewayError::InvalidContentId(format!("{text}: {e}")))?;
            if bytes.len() != 34 || bytes[0] != SHA2_256_CODE || bytes[1] != SHA2_256_LEN {
                return Err(GatewayError::InvalidContentId(format!(
                    "{text}: not a sha2-256 multihash"
                )));
            }
            return Ok(Self {
                bytes,
                encoding: IdEncoding::Base58Btc,
                text: text.to_string(),
            });
        }

        let (base, bytes) = multibase::decode(text)
            .map_err(|e| GatewayError::InvalidContentId(format!("{text}: {e}")))?;
        if bytes.first() != Some(&CID_V1) {
            return Err(GatewayError::InvalidContentId(format!(
                "{text}: unsupported CID version"
            )));
        }
        Ok(Self {
            bytes,
            encoding: IdEncoding::Multibase(base.code()),
            text: text.to_string(),
        })
    }

    /// CIDv0 of `data` stored as one raw block.
    ///
    /// Deterministic: the same bytes always produce the same identifier.
    pub fn sha256_v0(data: impl AsRef<[u8]>) -> Self {
        let digest = Sha256::digest(data.as_ref());
        let mut bytes = Vec::with_capacity(34);
        bytes.push(SHA2_256_CODE);
        bytes.push(SHA2_256_LEN);
        bytes.extend_from_slice(&digest);
        let text = Base::Base58Btc.encode(&bytes);
        Self {
            bytes,
            encoding: IdEncoding::Base58Btc,
            text,
        }
    }

    /// Decoded identifier bytes (the multihash for CIDv0, the full CID for v1).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> IdEncoding {
        self.encoding
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_v0(&self) -> bool {
        self.encoding == IdEncoding::Base58Btc
    }
}

impl PartialEq for ContentId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Hash for ContentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for ContentId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.text
    }
}
