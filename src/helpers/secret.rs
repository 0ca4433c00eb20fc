//! Token sealing for the settings file.
//!
//! API tokens are stored as Base64 of `[nonce (12 bytes)][AES-256-GCM ciphertext]`.

use crate::error::{Error, Result};
use aes_gcm::{
    Aes256Gcm,
    aead::{Aead, AeadCore, KeyInit, Nonce, OsRng},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

const NONCE_LEN: usize = 12;

/// Key used to seal secrets at rest.
///
/// Keeps tokens out of plain sight in `settings.toml`; it is not a substitute
/// for an OS keychain.
const SEAL_KEY: &[u8; 32] = b"DeliveryConsoleSettingsSealKey!!";

/// Encrypt `plain` with a fresh random nonce
pub fn seal(plain: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(SEAL_KEY.into());
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plain.as_bytes())
        .map_err(|e| Error::Invalid {
            message: format!("Failed to seal secret: {e}"),
        })?;

    let mut combined = nonce.to_vec();
    combined.extend_from_slice(&sealed);
    Ok(BASE64.encode(combined))
}

/// Reverse [`seal`]
pub fn unseal(sealed: &str) -> Result<String> {
    let data = BASE64.decode(sealed.trim()).map_err(|e| Error::Invalid {
        message: format!("Sealed secret is not Base64: {e}"),
    })?;
    if data.len() < NONCE_LEN {
        return Err(Error::Invalid {
            message: "Sealed secret is too short".to_string(),
        });
    }

    let (nonce, body) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(SEAL_KEY.into());
    let plain = cipher
        .decrypt(Nonce::<Aes256Gcm>::from_slice(nonce), body)
        .map_err(|e| Error::Invalid {
            message: format!("Failed to unseal secret: {e}"),
        })?;

    String::from_utf8(plain).map_err(|e| Error::Invalid {
        message: format!("Unsealed secret is not UTF-8: {e}"),
    })
}
