//! The cipher seam and field-state classification.
//!
//! The engine never implements encryption itself. It drives a [`FieldCipher`]
//! supplied by the caller and only cares about three facts per stored value:
//! is it already ciphertext of the current scheme, is it plaintext awaiting
//! encryption, or is it malformed? That three-way split is the whole dispatch
//! of the migration, so it is data ([`FieldState`]), not control flow.

use thiserror::Error;

/// Errors a cipher can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The value is not ciphertext of the current scheme. During migration
    /// this is the expected answer for not-yet-migrated plaintext.
    #[error("value is not ciphertext of the current scheme")]
    NotCiphertext,

    /// Encryption or decryption failed for an unexpected reason: the value
    /// claims to be ciphertext but cannot be decrypted, or the cipher itself
    /// misbehaved.
    #[error("cipher failure: {0}")]
    Failed(String),
}

impl CipherError {
    /// Create an unexpected-failure error.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Field-level encrypt/decrypt, supplied by the caller.
///
/// `decrypt` doubles as the format probe: it must return
/// [`CipherError::NotCiphertext`] for values that are not ciphertext of the
/// current scheme, and [`CipherError::Failed`] for values that look like
/// ciphertext but cannot be decrypted.
pub trait FieldCipher: Send + Sync {
    /// Encrypt a plaintext value.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypt a ciphertext value.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

impl<T: FieldCipher + ?Sized> FieldCipher for std::sync::Arc<T> {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        (**self).encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        (**self).decrypt(ciphertext)
    }
}

/// What a stored value turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    /// Decrypts cleanly under the current scheme; already migrated.
    AlreadyCiphertext,
    /// Not ciphertext; awaiting encryption.
    Plaintext,
    /// Neither valid plaintext nor decryptable ciphertext.
    Malformed(String),
}

/// Probe a stored value with the cipher's `decrypt`.
pub fn classify_field(cipher: &dyn FieldCipher, value: &str) -> FieldState {
    match cipher.decrypt(value) {
        Ok(_) => FieldState::AlreadyCiphertext,
        Err(CipherError::NotCiphertext) => FieldState::Plaintext,
        Err(CipherError::Failed(message)) => FieldState::Malformed(message),
    }
}

/// A versioned-prefix envelope with no cryptographic protection.
///
/// Wraps values as `enc:v1:<plaintext>` and unwraps them again. Useful for
/// wiring, tests, and dry-run rehearsals of a migration; it provides no
/// confidentiality whatsoever. Values carrying the envelope prefix with an
/// unknown version are reported as failures, which is how test fixtures
/// exercise the malformed path.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCipher;

impl EnvelopeCipher {
    /// Envelope prefix for the current version.
    pub const PREFIX: &'static str = "enc:v1:";

    /// Create an envelope cipher.
    pub fn new() -> Self {
        Self
    }
}

impl FieldCipher for EnvelopeCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        if plaintext.starts_with("enc:") {
            return Err(CipherError::failed(
                "refusing to wrap a value that already carries an envelope prefix",
            ));
        }
        Ok(format!("{}{}", Self::PREFIX, plaintext))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        if let Some(plaintext) = ciphertext.strip_prefix(Self::PREFIX) {
            return Ok(plaintext.to_string());
        }
        if ciphertext.starts_with("enc:") {
            return Err(CipherError::failed("unknown envelope version"));
        }
        Err(CipherError::NotCiphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_plaintext() {
        let cipher = EnvelopeCipher::new();
        assert_eq!(
            classify_field(&cipher, "alice@example.com"),
            FieldState::Plaintext
        );
    }

    #[test]
    fn test_classify_already_ciphertext() {
        let cipher = EnvelopeCipher::new();
        let stored = cipher.encrypt("alice@example.com").unwrap();
        assert_eq!(
            classify_field(&cipher, &stored),
            FieldState::AlreadyCiphertext
        );
    }

    #[test]
    fn test_classify_malformed() {
        let cipher = EnvelopeCipher::new();
        match classify_field(&cipher, "enc:v9:????") {
            FieldState::Malformed(msg) => assert!(msg.contains("unknown envelope version")),
            other => panic!("expected malformed, got {:?}", other),
        }
    }

    // ==================== Envelope Cipher Tests ====================

    #[test]
    fn test_envelope_round_trip() {
        let cipher = EnvelopeCipher::new();
        let wrapped = cipher.encrypt("secret").unwrap();
        assert_eq!(wrapped, "enc:v1:secret");
        assert_eq!(cipher.decrypt(&wrapped).unwrap(), "secret");
    }

    #[test]
    fn test_envelope_rejects_double_wrap() {
        let cipher = EnvelopeCipher::new();
        let wrapped = cipher.encrypt("secret").unwrap();
        assert!(matches!(
            cipher.encrypt(&wrapped),
            Err(CipherError::Failed(_))
        ));
    }

    #[test]
    fn test_envelope_decrypt_plain_is_not_ciphertext() {
        let cipher = EnvelopeCipher::new();
        assert_eq!(
            cipher.decrypt("just some text"),
            Err(CipherError::NotCiphertext)
        );
    }

    #[test]
    fn test_arc_cipher_delegates() {
        let cipher: std::sync::Arc<dyn FieldCipher> = std::sync::Arc::new(EnvelopeCipher::new());
        assert_eq!(cipher.encrypt("x").unwrap(), "enc:v1:x");
    }
}
