//! Symmetric signing tokens for the signed-API provider family.
//!
//! Upstream servers verify tokens produced by AES-128-ECB encryption of a
//! timestamp or identifier composite, hex-encoded uppercase, with no IV or
//! nonce exchange. The scheme is reproduced exactly because the external
//! verifiers require it; determinism here is a protocol requirement, not a
//! security property of this crate.
//!
//! The two signing keys are not stored in the clear: they ship as base64
//! ciphertexts and are decrypted once at startup with a fixed bootstrap key.
//! [`SignatureCodec::bootstrap`] failure is fatal for Family-B resolvers and
//! irrelevant to every other family.

use aes::Aes128;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit, block_padding::Pkcs7};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::ResolveError;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

const KEY_LENGTH: usize = 16;
const KEY_PAD_BYTE: u8 = b'L';

/// Fixed bootstrap key material. Padded/truncated to 16 bytes like every
/// other key string in this scheme.
const BOOTSTRAP_KEY: &str = "AES/ECB/PKCS5Padding";

/// Bundled ciphertext of the primary derived key.
const PRIMARY_KEY_CIPHERTEXT: &str = "YbQHZqK/PdQql2+7ATcPQHREAxt0Hn0Ob9v317QirZM=";

/// Bundled ciphertext of the secondary derived key.
const SECONDARY_KEY_CIPHERTEXT: &str = "1uQFS3sNeHd/bCrmrQpflXREAxt0Hn0Ob9v317QirZM=";

/// Which derived key a token is produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedKey {
    /// Key used for timestamp and download-id tokens.
    Primary,
    /// Key used by providers on the alternate key schedule.
    Secondary,
}

/// Derived signing keys, produced once at startup and read-only afterwards.
#[derive(Clone)]
pub struct SignatureCodec {
    primary: [u8; KEY_LENGTH],
    secondary: [u8; KEY_LENGTH],
}

impl std::fmt::Debug for SignatureCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("SignatureCodec").finish_non_exhaustive()
    }
}

impl SignatureCodec {
    /// Decrypts the bundled key ciphertexts and returns a ready codec.
    ///
    /// Run once at process start; the codec is then shared by reference with
    /// every resolver that signs requests.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SigningUnavailable`] when either ciphertext
    /// fails base64 decoding or AES unpadding.
    pub fn bootstrap() -> Result<Self, ResolveError> {
        let primary = decrypt_key_string(PRIMARY_KEY_CIPHERTEXT)?;
        let secondary = decrypt_key_string(SECONDARY_KEY_CIPHERTEXT)?;
        Ok(Self {
            primary: key_bytes(&primary),
            secondary: key_bytes(&secondary),
        })
    }

    /// Signs `input` under the selected derived key.
    ///
    /// Deterministic: identical input and key always produce identical
    /// output, which the upstream verifier depends on.
    #[must_use]
    pub fn sign(&self, input: &str, key: DerivedKey) -> String {
        let key = match key {
            DerivedKey::Primary => &self.primary,
            DerivedKey::Secondary => &self.secondary,
        };
        encrypt_hex(input.as_bytes(), key)
    }
}

/// AES-128-ECB/PKCS7 encryption, uppercase hex output.
fn encrypt_hex(plaintext: &[u8], key: &[u8; KEY_LENGTH]) -> String {
    let ciphertext = Aes128EcbEnc::new(key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    hex::encode_upper(ciphertext)
}

/// Decrypts one bundled base64 ciphertext under the bootstrap key.
fn decrypt_key_string(ciphertext_b64: &str) -> Result<String, ResolveError> {
    let ciphertext = BASE64
        .decode(ciphertext_b64)
        .map_err(|e| ResolveError::signing_unavailable(&format!("bad key ciphertext: {e}")))?;
    let key = key_bytes(BOOTSTRAP_KEY);
    let plaintext = Aes128EcbDec::new((&key).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| ResolveError::signing_unavailable(&format!("key decryption failed: {e}")))?;
    String::from_utf8(plaintext)
        .map_err(|e| ResolveError::signing_unavailable(&format!("derived key not utf-8: {e}")))
}

/// Key strings are right-padded with `'L'` to 16 bytes, or truncated.
fn key_bytes(key: &str) -> [u8; KEY_LENGTH] {
    let mut out = [KEY_PAD_BYTE; KEY_LENGTH];
    for (slot, byte) in out.iter_mut().zip(key.bytes()) {
        *slot = byte;
    }
    out
}
