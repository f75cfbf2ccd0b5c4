//! Password-obscuring cipher.
//!
//! Symmetric encryption under a key and nonce compiled into the client,
//! used to obscure the password field before submission. Anyone with
//! the shipped binary can reverse it, so this is obfuscation on top of
//! TLS, not a confidentiality layer; see DESIGN.md.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use thiserror::Error;

/// Fixed symmetric key shared with the backend.
const CIPHER_KEY: &[u8; 32] = b"abcdef0123456789abcdef0123456789";

/// Fixed nonce. Reuse across messages is fine only because this layer
/// makes no confidentiality claim.
const CIPHER_NONCE: &[u8; 12] = b"0123456789ab";

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,

    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decryption failed")]
    Decrypt,

    #[error("decrypted payload is not UTF-8")]
    NotUtf8,
}

/// Encrypt a string, returning base64-armored ciphertext.
pub fn encrypt(plaintext: &str) -> Result<String, CipherError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(CIPHER_KEY));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(CIPHER_NONCE), plaintext.as_bytes())
        .map_err(|_| CipherError::Encrypt)?;
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64-armored ciphertext produced by [`encrypt`].
pub fn decrypt(ciphertext: &str) -> Result<String, CipherError> {
    let raw = BASE64.decode(ciphertext)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(CIPHER_KEY));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(CIPHER_NONCE), raw.as_slice())
        .map_err(|_| CipherError::Decrypt)?;
    String::from_utf8(plaintext).map_err(|_| CipherError::NotUtf8)
}
