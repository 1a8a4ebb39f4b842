use crate::{kdf::Kdf, util::KemSuiteId, HpkeError};

use alloc::vec::Vec;

use zeroize::Zeroizing;

/// This trait captures the requirements of a Diffie-Hellman key exchange mechanism: keypair
/// derivation, the DH operation itself, and validated (de)serialization of keys. This is built
/// into a KEM in `kem/dhkem.rs`. Unlike the KEM layer, this layer is compile-time generic; each
/// impl is a zero-sized type over one concrete curve.
pub(crate) trait DhKeyExchange {
    /// The length of a serialized public key, called `Npk` in the RFC
    const NPK: usize;
    /// The length of a serialized private key, called `Nsk` in the RFC
    const NSK: usize;

    /// The curve-native public key type
    type PublicKey: Clone;
    /// The curve-native private key type
    type PrivateKey: Clone;

    /// Computes the public key of a given private key
    fn sk_to_pk(sk: &Self::PrivateKey) -> Self::PublicKey;

    /// Does the Diffie-Hellman operation, returning the serialized shared point (the
    /// x-coordinate for the NIST curves). Fails with `InvalidKey` on a degenerate result.
    fn dh(sk: &Self::PrivateKey, pk: &Self::PublicKey) -> Result<Zeroizing<Vec<u8>>, HpkeError>;

    /// Serializes a public key to its `Npk`-byte wire form
    fn pk_to_bytes(pk: &Self::PublicKey) -> Vec<u8>;

    /// Deserializes and validates a public key. Fails with `InvalidKey` on wrong length or an
    /// off-curve/identity point.
    fn pk_from_bytes(bytes: &[u8]) -> Result<Self::PublicKey, HpkeError>;

    /// Serializes a private key to its `Nsk`-byte wire form
    fn sk_to_bytes(sk: &Self::PrivateKey) -> Zeroizing<Vec<u8>>;

    /// Deserializes and validates a private key. Fails with `InvalidKey` on wrong length or an
    /// out-of-range scalar.
    fn sk_from_bytes(bytes: &[u8]) -> Result<Self::PrivateKey, HpkeError>;

    /// Computes a keypair from keying material `ikm` per the `DeriveKeyPair` definition of
    /// RFC 9180 §7.1.3. `suite_id` is the KEM-local `"KEM" || kem_id` context, and `kdf` is the
    /// KDF named by the DHKEM that wraps this curve.
    fn derive_keypair(
        kdf: &dyn Kdf,
        suite_id: &KemSuiteId,
        ikm: &[u8],
    ) -> Result<(Self::PrivateKey, Self::PublicKey), HpkeError>;
}

#[cfg(any(feature = "p256", feature = "p384"))]
pub(crate) mod ecdh_nistp;

#[cfg(feature = "x25519")]
pub(crate) mod x25519;
