//! Cryptographic hash type using SHA-256.

use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte cryptographic hash using SHA-256.
///
/// Totally ordered (lexicographic over the digest bytes) and safe to use as
/// a map key. All hashing operations are deterministic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Size of hash in bytes.
    pub const BYTES: usize = 32;

    /// Zero hash (all bytes are 0x00).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create hash from bytes using SHA-256.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(digest.into())
    }

    /// Create hash from multiple byte slices, digested in order.
    pub fn from_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Parse hash from hex string.
    pub fn from_hex(hex: &str) -> Result<Self, HexError> {
        if hex.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: hex.len(),
            });
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| HexError::InvalidHex)?;

        Ok(Self(bytes))
    }

    /// Convert hash to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex of the first 3 bytes (6 chars), for diagnostics.
    pub fn shortcode(&self) -> String {
        hex::encode(&self.0[..3])
    }

    /// Get bytes as slice reference.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to bytes array.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Compute a binary merkle root from a list of hashes.
///
/// The leaf layer is padded with [`Hash::ZERO`] to the next power of two
/// (minimum 2), then reduced pairwise: each pair `(a, b)` becomes
/// `SHA256(a || b)` over the concatenated 64 bytes, until a single hash
/// remains. The reduction is a single pass over an expanding buffer rather
/// than recursive.
///
/// Returns [`Hash::ZERO`] for an empty list. The zero-hash padding is
/// structural: two inputs that differ only in trailing zero hashes collide.
///
/// ```text
/// Leaves:  [H0, H1, H2]           padded to [H0, H1, H2, 0]
/// Round 1: [hash(H0||H1), hash(H2||0)]
/// Root:    [hash(R1_0||R1_1)]
/// ```
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return Hash::ZERO;
    }

    let width = hashes.len().next_power_of_two().max(2);
    let mut nodes: Vec<Hash> = hashes.to_vec();
    nodes.resize(width, Hash::ZERO);

    let mut start = 0;
    let mut end = nodes.len();
    while end - start > 1 {
        for i in (start..end).step_by(2) {
            let parent = Hash::from_parts(&[nodes[i].as_bytes(), nodes[i + 1].as_bytes()]);
            nodes.push(parent);
        }
        start = end;
        end = nodes.len();
    }

    nodes[end - 1]
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Hash({}..{})", &hex[..8], &hex[56..])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Errors that can occur when parsing hex strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// Invalid hex string length.
    #[error("Invalid hex length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid hex characters.
    #[error("Invalid hex string")]
    InvalidHex,
}
