//! Content hash value and the pluggable hash primitive

use crate::constants::HASH_LEN;
use crate::error::CbError;
use std::fmt;
use std::str::FromStr;

/// Incremental hash primitive consumed by content hashing.
///
/// Content hashing only fixes which bytes are fed and in what order; the
/// digest itself is opaque.
pub trait HashBuilder {
    /// Feed more bytes.
    fn update(&mut self, bytes: &[u8]);
    /// Produce the digest.
    fn finalize(self) -> CbHash;
}

/// Default hash primitive: BLAKE3 truncated to 160 bits.
#[derive(Default, Clone)]
pub struct Blake3Hasher {
    inner: blake3::Hasher,
}

impl Blake3Hasher {
    /// Create a new hasher
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashBuilder for Blake3Hasher {
    fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    fn finalize(self) -> CbHash {
        let digest = self.inner.finalize();
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&digest.as_bytes()[..HASH_LEN]);
        CbHash(out)
    }
}

/// 160-bit content hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CbHash(pub [u8; HASH_LEN]);

impl CbHash {
    /// All-zero hash.
    pub const ZERO: CbHash = CbHash([0u8; HASH_LEN]);

    /// Hash `data` with the default primitive.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Blake3Hasher::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Build from a 20-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; HASH_LEN]>::try_from(bytes).ok().map(CbHash)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }
}

impl fmt::Display for CbHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CbHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CbHash({})", self)
    }
}

impl FromStr for CbHash {
    type Err = CbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_LEN * 2 || !s.is_ascii() {
            return Err(CbError::Parse(format!(
                "hash must be {} hex digits, got {:?}",
                HASH_LEN * 2,
                s
            )));
        }
        let mut out = [0u8; HASH_LEN];
        for (i, slot) in out.iter_mut().enumerate() {
            let digits = &s[i * 2..i * 2 + 2];
            *slot = u8::from_str_radix(digits, 16)
                .map_err(|_| CbError::Parse(format!("invalid hex digits {:?}", digits)))?;
        }
        Ok(CbHash(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(CbHash::of(b"compact"), CbHash::of(b"compact"));
        assert_ne!(CbHash::of(b"compact"), CbHash::of(b"binary"));
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = Blake3Hasher::new();
        hasher.update(b"comp");
        hasher.update(b"act");
        assert_eq!(hasher.finalize(), CbHash::of(b"compact"));
    }

    #[test]
    fn test_truncates_blake3() {
        let full = blake3::hash(b"abc");
        assert_eq!(CbHash::of(b"abc").as_bytes(), &full.as_bytes()[..20]);
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = CbHash::of(b"hex");
        let text = hash.to_string();
        assert_eq!(text.len(), 40);
        assert_eq!(text.parse::<CbHash>().unwrap(), hash);
    }

    #[test]
    fn test_hex_rejects_bad_input() {
        assert!("abc".parse::<CbHash>().is_err());
        assert!("zz".repeat(20).parse::<CbHash>().is_err());
    }

    #[test]
    fn test_zero() {
        assert!(CbHash::ZERO.is_zero());
        assert!(!CbHash::of(b"").is_zero());
        assert_eq!(CbHash::from_slice(&[0u8; 20]), Some(CbHash::ZERO));
        assert_eq!(CbHash::from_slice(&[0u8; 19]), None);
    }
}
