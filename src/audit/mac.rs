//! MAC Engine
//!
//! HMAC-SHA256 over log payloads, hex rendering of digests and
//! constant-time comparison of digest strings.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{GalleryLogError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length of a raw HMAC-SHA256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a rendered digest (lowercase hex).
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// Secret key used to authenticate log entries.
///
/// Never empty. The bytes are kept out of `Debug` output.
#[derive(Clone)]
pub struct IntegrityKey(Vec<u8>);

impl IntegrityKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(GalleryLogError::missing_secret("Integrity key"));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for IntegrityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("IntegrityKey").field(&"<redacted>").finish()
    }
}

/// Compute HMAC-SHA256(key, message).
pub fn mac(key: &IntegrityKey, message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| GalleryLogError::CryptoError(format!("HMAC init failed: {}", e)))?;
    mac.update(message);

    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Lowercase hex rendering of a digest.
pub fn render_hex(digest: &[u8]) -> String {
    hex::encode(digest)
}

/// Compute the MAC of `message` and render it as hex in one step.
pub fn mac_hex(key: &IntegrityKey, message: &[u8]) -> Result<String> {
    Ok(render_hex(&mac(key, message)?))
}

/// Compare two secret-bearing values without leaking the mismatch position.
///
/// Unequal lengths return false straight away; the length of a digest
/// is public.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
