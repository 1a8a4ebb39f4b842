use crate::{
    dhkex::DhKeyExchange,
    kdf::{labeled_expand, labeled_extract, Kdf},
    util::KemSuiteId,
    HpkeError,
};

use alloc::vec::Vec;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

// We wrap the types in order to abstract away the dalek dep

/// An X25519 public key
#[derive(Clone)]
pub(crate) struct PublicKey(x25519_dalek::PublicKey);

/// An X25519 private key
#[derive(Clone)]
pub(crate) struct PrivateKey(x25519_dalek::StaticSecret);

/// Represents ECDH functionality over the X25519 group
pub(crate) struct X25519;

impl DhKeyExchange for X25519 {
    // RFC 9180 §7.1: Npk and Nsk of DHKEM(X25519, HKDF-SHA256) are 32
    const NPK: usize = 32;
    const NSK: usize = 32;

    type PublicKey = PublicKey;
    type PrivateKey = PrivateKey;

    fn sk_to_pk(sk: &PrivateKey) -> PublicKey {
        PublicKey(x25519_dalek::PublicKey::from(&sk.0))
    }

    /// Does the DH operation. Returns `HpkeError::InvalidKey` if and only if the DH result was
    /// all zeros. This check is required by the HPKE spec.
    fn dh(sk: &PrivateKey, pk: &PublicKey) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
        let res = sk.0.diffie_hellman(&pk.0);
        // RFC 9180 §7.1.4: "senders and recipients MUST check whether the shared secret is the
        // all-zero value and abort if so"
        if res.as_bytes().ct_eq(&[0u8; 32]).into() {
            Err(HpkeError::InvalidKey)
        } else {
            Ok(Zeroizing::new(res.as_bytes().to_vec()))
        }
    }

    fn pk_to_bytes(pk: &PublicKey) -> Vec<u8> {
        pk.0.as_bytes().to_vec()
    }

    fn pk_from_bytes(bytes: &[u8]) -> Result<PublicKey, HpkeError> {
        // Every 32-byte string is a valid X25519 pubkey encoding; only the length can be wrong
        if bytes.len() != Self::NPK {
            return Err(HpkeError::InvalidKey);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        Ok(PublicKey(x25519_dalek::PublicKey::from(arr)))
    }

    fn sk_to_bytes(sk: &PrivateKey) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(sk.0.to_bytes().to_vec())
    }

    fn sk_from_bytes(bytes: &[u8]) -> Result<PrivateKey, HpkeError> {
        if bytes.len() != Self::NSK {
            return Err(HpkeError::InvalidKey);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(bytes);
        let sk = PrivateKey(x25519_dalek::StaticSecret::from(arr));
        arr.fill(0);
        Ok(sk)
    }

    // RFC 9180 §7.1.3:
    // def DeriveKeyPair(ikm):
    //   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
    //   sk = LabeledExpand(dkp_prk, "sk", "", Nsk)
    //   return (sk, pk(sk))
    fn derive_keypair(
        kdf: &dyn Kdf,
        suite_id: &KemSuiteId,
        ikm: &[u8],
    ) -> Result<(PrivateKey, PublicKey), HpkeError> {
        let dkp_prk = labeled_extract(kdf, suite_id, b"", b"dkp_prk", ikm);
        let sk_bytes = Zeroizing::new(labeled_expand(
            kdf,
            suite_id,
            &dkp_prk,
            b"sk",
            b"",
            Self::NSK,
        )?);

        let sk = Self::sk_from_bytes(&sk_bytes)?;
        let pk = Self::sk_to_pk(&sk);
        Ok((sk, pk))
    }
}
