//-------- no_std stuff --------//
#![no_std]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

#[allow(unused_imports)]
#[macro_use]
extern crate alloc;

//-------- Testing stuff --------//


#[cfg(test)]
mod test_util;

//-------- Modules and exports --------//

pub mod aead;
mod context;
pub mod kdf;
pub mod kem;
mod key_schedule;
pub mod setup;
pub mod single_shot;
mod suite;
mod util;

pub(crate) mod dhkex;

#[doc(inline)]
pub use context::{
    unmarshal_receiver_context, unmarshal_sender_context, ReceiverContext, SenderContext,
};
#[doc(inline)]
pub use setup::{
    setup_auth_psk_r, setup_auth_psk_s, setup_auth_r, setup_auth_s, setup_base_r, setup_base_s,
    setup_psk_r, setup_psk_s,
};
#[doc(inline)]
pub use single_shot::{single_shot_open, single_shot_seal};
#[doc(inline)]
pub use suite::{CipherSuite, Mode};

//-------- Top-level types --------//

/// Describes things that can go wrong in HPKE
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HpkeError {
    /// The requested `(KEM, KDF, AEAD)` triple is not in the registry
    UnknownSuite,
    /// An Auth mode was requested with a KEM that has no authenticated variant
    ModeNotSupported,
    /// The presence of the PSK inputs does not match the requested mode
    InconsistentPsk,
    /// A key failed to deserialize or validate, or was used under the wrong KEM
    InvalidKey,
    /// The encapsulated key was structurally invalid during decapsulation
    InvalidCiphertext,
    /// The AEAD authentication tag did not verify when opening
    AuthenticationFailure,
    /// The nonce sequence counter is exhausted for this context
    MessageLimitReached,
    /// `seal`/`open` was called on an export-only context
    OperationNotSupported,
    /// A serialized context was truncated or inconsistent
    MalformedSerialization,
    /// The KDF was asked to output too many bytes
    InvalidKdfLength,
    /// An unspecified error occurred during encryption
    Encryption,
}

impl core::fmt::Display for HpkeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self {
            HpkeError::UnknownSuite => "Unknown ciphersuite",
            HpkeError::ModeNotSupported => "KEM does not support the authenticated mode",
            HpkeError::InconsistentPsk => "Inconsistent PSK inputs",
            HpkeError::InvalidKey => "Invalid key",
            HpkeError::InvalidCiphertext => "Invalid encapsulated key",
            HpkeError::AuthenticationFailure => "Invalid authentication tag",
            HpkeError::MessageLimitReached => "Message limit reached",
            HpkeError::OperationNotSupported => "Operation not supported on this context",
            HpkeError::MalformedSerialization => "Malformed serialized context",
            HpkeError::InvalidKdfLength => "Too many bytes requested from KDF",
            HpkeError::Encryption => "Encryption error",
        };
        f.write_str(kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HpkeError {}
