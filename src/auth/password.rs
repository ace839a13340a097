//! Password hashing
//!
//! Salted HMAC-SHA256, stored as "salt_b64.digest_b64".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 16;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = digest_with_salt(password, &salt)?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    ))
}

/// Verify a password against a stored "salt.digest" hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('.') else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_b64) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(digest_b64) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn digest_with_salt(password: &str, salt: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut mac =
        HmacSha256::new_from_slice(salt).map_err(|e| AppError::Config(e.to_string()))?;
    mac.update(password.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", "bad.!!base64!!"));
    }
}
