use crate::HpkeError;

use alloc::vec::Vec;

use aead::{Aead as BaseAead, KeyInit as BaseKeyInit, Payload};

/// Represents authenticated encryption functionality. The trait is object-safe: a ciphersuite
/// holds a `&'static dyn Aead` and dispatches at runtime. Ciphertexts are in combined form,
/// i.e. `ct || tag`.
pub trait Aead: Send + Sync {
    /// The algorithm identifier for this AEAD
    fn id(&self) -> u16;

    /// The key size in bytes, called `Nk` in the RFC. Zero for the export-only sentinel.
    fn nk(&self) -> usize;

    /// The nonce size in bytes, called `Nn` in the RFC. Zero for the export-only sentinel.
    fn nn(&self) -> usize;

    /// Encrypts and authenticates `plaintext` with associated data `aad`, returning `ct || tag`.
    /// This does not fail for well-sized inputs.
    fn seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, HpkeError>;

    /// Decrypts and authenticates `ciphertext` (in `ct || tag` form) with associated data `aad`.
    /// Fails with `AuthenticationFailure` if the tag does not verify.
    fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, HpkeError>;
}

// The seal/open legwork, generic over the RustCrypto AEAD backend. Key and nonce lengths are
// checked here so that a caller slip-up surfaces as an error rather than a GenericArray panic.
fn seal_with<A: BaseAead + BaseKeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, HpkeError> {
    let cipher = A::new_from_slice(key).map_err(|_| HpkeError::InvalidKey)?;
    if nonce.len() != aead::Nonce::<A>::default().len() {
        return Err(HpkeError::InvalidKey);
    }
    cipher
        .encrypt(aead::Nonce::<A>::from_slice(nonce), Payload { msg: plaintext, aad })
        .map_err(|_| HpkeError::Encryption)
}

fn open_with<A: BaseAead + BaseKeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, HpkeError> {
    let cipher = A::new_from_slice(key).map_err(|_| HpkeError::InvalidKey)?;
    if nonce.len() != aead::Nonce::<A>::default().len() {
        return Err(HpkeError::InvalidKey);
    }
    cipher
        .decrypt(aead::Nonce::<A>::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| HpkeError::AuthenticationFailure)
}

// Implements an Aead over the given RustCrypto cipher
macro_rules! impl_aead {
    ($aead_name:ident, $aead_impl:ty, $aead_id:literal, $nk:literal, $nn:literal, $doc_str:expr) => {
        #[doc = $doc_str]
        pub struct $aead_name;

        impl $aead_name {
            // RFC 9180 §7.3
            /// The algorithm identifier for this AEAD
            pub const AEAD_ID: u16 = $aead_id;
        }

        impl Aead for $aead_name {
            fn id(&self) -> u16 {
                Self::AEAD_ID
            }

            fn nk(&self) -> usize {
                $nk
            }

            fn nn(&self) -> usize {
                $nn
            }

            fn seal(
                &self,
                key: &[u8],
                nonce: &[u8],
                aad: &[u8],
                plaintext: &[u8],
            ) -> Result<Vec<u8>, HpkeError> {
                seal_with::<$aead_impl>(key, nonce, aad, plaintext)
            }

            fn open(
                &self,
                key: &[u8],
                nonce: &[u8],
                aad: &[u8],
                ciphertext: &[u8],
            ) -> Result<Vec<u8>, HpkeError> {
                open_with::<$aead_impl>(key, nonce, aad, ciphertext)
            }
        }
    };
}

impl_aead!(
    AesGcm128,
    aes_gcm::Aes128Gcm,
    0x0001,
    16,
    12,
    "The implementation of AES-128-GCM"
);
impl_aead!(
    AesGcm256,
    aes_gcm::Aes256Gcm,
    0x0002,
    32,
    12,
    "The implementation of AES-256-GCM"
);
impl_aead!(
    ChaCha20Poly1305,
    chacha20poly1305::ChaCha20Poly1305,
    0x0003,
    32,
    12,
    "The implementation of ChaCha20-Poly1305"
);

/// An AEAD which can **only** be used for its `export()` functionality. Contexts built over this
/// AEAD reject `seal()` and `open()` with `OperationNotSupported` before this impl is ever
/// reached; the methods here panic to keep that gate honest.
pub struct ExportOnlyAead;

impl ExportOnlyAead {
    // RFC 9180 §7.3: Export-only
    /// The algorithm identifier for this AEAD
    pub const AEAD_ID: u16 = 0xFFFF;
}

impl Aead for ExportOnlyAead {
    fn id(&self) -> u16 {
        Self::AEAD_ID
    }

    fn nk(&self) -> usize {
        0
    }

    fn nn(&self) -> usize {
        0
    }

    fn seal(&self, _: &[u8], _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, HpkeError> {
        panic!("Cannot encrypt with an export-only AEAD!");
    }

    fn open(&self, _: &[u8], _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, HpkeError> {
        panic!("Cannot decrypt with an export-only AEAD!");
    }
}
