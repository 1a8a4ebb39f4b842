use crate::HpkeError;

use alloc::vec::Vec;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

mod dhkem;
#[cfg(feature = "x25519")]
pub use dhkem::X25519HkdfSha256;
#[cfg(feature = "p256")]
pub use dhkem::DhP256HkdfSha256;
#[cfg(feature = "p384")]
pub use dhkem::DhP384HkdfSha384;

/// The shared secret produced by `encap`/`decap`. Zeroed on drop.
pub type SharedSecret = Zeroizing<Vec<u8>>;

/// A KEM public key: the `Npk`-byte wire encoding, validated on construction and tagged with the
/// KEM it belongs to. Using it under a different KEM fails `InvalidKey`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KemPublicKey {
    pub(crate) kem_id: u16,
    pub(crate) bytes: Vec<u8>,
}

impl KemPublicKey {
    /// The algorithm identifier of the KEM this key belongs to
    pub fn kem_id(&self) -> u16 {
        self.kem_id
    }

    /// The `Npk`-byte serialization of this key
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A KEM private key: the `Nsk`-byte encoding, validated on construction and tagged with the KEM
/// it belongs to. The bytes are zeroed on drop.
#[derive(Clone)]
pub struct KemPrivateKey {
    pub(crate) kem_id: u16,
    pub(crate) bytes: Zeroizing<Vec<u8>>,
}

impl KemPrivateKey {
    /// The algorithm identifier of the KEM this key belongs to
    pub fn kem_id(&self) -> u16 {
        self.kem_id
    }

    /// The `Nsk`-byte serialization of this key
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Represents key encapsulation functionality. The trait is object-safe: a ciphersuite holds a
/// `&'static dyn Kem` and dispatches at runtime. A KEM that also supports the sender-authenticated
/// variant advertises it through [`Kem::auth`].
pub trait Kem: Send + Sync {
    /// The algorithm identifier for this KEM
    fn id(&self) -> u16;

    /// The length of a serialized private key, called `Nsk` in the RFC
    fn nsk(&self) -> usize;

    /// The length of a serialized public key, called `Npk` in the RFC
    fn npk(&self) -> usize;

    /// The length of an encapsulated key, called `Nenc` in the RFC
    fn nenc(&self) -> usize;

    /// The length of the KEM shared secret, called `Nsecret` in the RFC
    fn nsecret(&self) -> usize;

    /// Generates a random keypair. This is `derive_key_pair` over `Nsk` bytes drawn from the
    /// given CSPRNG.
    fn generate_key_pair(
        &self,
        csprng: &mut dyn CryptoRngCore,
    ) -> Result<(KemPrivateKey, KemPublicKey), HpkeError>;

    /// Deterministically derives a keypair from the given input keying material
    ///
    /// Requirements
    /// ============
    /// This keying material SHOULD have as many bits of entropy as the bit length of a secret
    /// key. Inputs shorter than `Nsk` bytes are rejected with `InvalidKey`.
    fn derive_key_pair(&self, ikm: &[u8])
        -> Result<(KemPrivateKey, KemPublicKey), HpkeError>;

    /// Deserializes and validates an `Npk`-byte public key
    fn deserialize_public_key(&self, bytes: &[u8]) -> Result<KemPublicKey, HpkeError>;

    /// Deserializes and validates an `Nsk`-byte private key
    fn deserialize_private_key(&self, bytes: &[u8]) -> Result<KemPrivateKey, HpkeError>;

    /// Computes the public key of a given private key
    fn sk_to_pk(&self, sk: &KemPrivateKey) -> Result<KemPublicKey, HpkeError>;

    /// Generates an ephemeral keypair and derives a shared secret that the holder of `pk_recip`'s
    /// private key can recover from the returned encapsulated key
    fn encap(
        &self,
        csprng: &mut dyn CryptoRngCore,
        pk_recip: &KemPublicKey,
    ) -> Result<(SharedSecret, Vec<u8>), HpkeError>;

    /// Recovers the shared secret from an encapsulated key. Fails with `InvalidCiphertext` if
    /// `enc` is not a valid encapsulated key for this KEM.
    fn decap(&self, enc: &[u8], sk_recip: &KemPrivateKey) -> Result<SharedSecret, HpkeError>;

    /// The deterministic form of `encap`, taking the ephemeral key as input rather than sampling
    /// it. This is the primitive that known-answer tests exercise; everything else should use
    /// `encap`.
    #[doc(hidden)]
    fn encap_deterministic(
        &self,
        pk_recip: &KemPublicKey,
        sk_eph: &KemPrivateKey,
    ) -> Result<(SharedSecret, Vec<u8>), HpkeError>;

    /// Returns the authenticated-variant interface of this KEM, if it has one. `Auth` mode setup
    /// fails `ModeNotSupported` when this returns `None`.
    fn auth(&self) -> Option<&dyn AuthKem> {
        None
    }
}

/// The sender-authenticated variant of a KEM. All DHKEMs support this.
pub trait AuthKem: Kem {
    /// Like `encap`, but additionally ties the sender's identity keypair into the shared secret
    fn auth_encap(
        &self,
        csprng: &mut dyn CryptoRngCore,
        pk_recip: &KemPublicKey,
        sk_sender: &KemPrivateKey,
    ) -> Result<(SharedSecret, Vec<u8>), HpkeError>;

    /// Like `decap`, but checks the shared secret against the sender's identity public key
    fn auth_decap(
        &self,
        enc: &[u8],
        sk_recip: &KemPrivateKey,
        pk_sender: &KemPublicKey,
    ) -> Result<SharedSecret, HpkeError>;

    /// The deterministic form of `auth_encap`. See [`Kem::encap_deterministic`].
    #[doc(hidden)]
    fn auth_encap_deterministic(
        &self,
        pk_recip: &KemPublicKey,
        sk_sender: &KemPrivateKey,
        sk_eph: &KemPrivateKey,
    ) -> Result<(SharedSecret, Vec<u8>), HpkeError>;
}
