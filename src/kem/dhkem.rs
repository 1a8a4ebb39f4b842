use crate::{
    dhkex::DhKeyExchange,
    kdf::{extract_and_expand, Kdf as KdfTrait},
    kem::{AuthKem, Kem as KemTrait, KemPrivateKey, KemPublicKey, SharedSecret},
    util::{kem_suite_id, KemSuiteId},
    HpkeError,
};

use alloc::vec::Vec;

use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

// RFC 9180 §4.1
// def Encap(pkR):
//   skE, pkE = GenerateKeyPair()
//   dh = DH(skE, pkR)
//   enc = SerializePublicKey(pkE)
//
//   pkRm = SerializePublicKey(pkR)
//   kem_context = concat(enc, pkRm)
//
// def AuthEncap(pkR, skS):
//   skE, pkE = GenerateKeyPair()
//   dh = concat(DH(skE, pkR), DH(skS, pkR))
//   enc = SerializePublicKey(pkE)
//
//   pkRm = SerializePublicKey(pkR)
//   pkSm = SerializePublicKey(pk(skS))
//   kem_context = concat(enc, pkRm, pkSm)
//
//   shared_secret = ExtractAndExpand(dh, kem_context)
//   return shared_secret, enc

/// Derives a shared secret that the owner of the recipient's pubkey can use to derive the same
/// shared secret. If `sender_keypair` is given, the sender's identity is tied to the shared
/// secret. The ephemeral key is an explicit input so that the randomized `encap` and the
/// known-answer tests share one code path.
fn encap_with_eph<Kex: DhKeyExchange>(
    kdf: &dyn KdfTrait,
    suite_id: &KemSuiteId,
    n_secret: usize,
    pk_recip: &Kex::PublicKey,
    sender_keypair: Option<(&Kex::PrivateKey, &Kex::PublicKey)>,
    sk_eph: &Kex::PrivateKey,
) -> Result<(SharedSecret, Vec<u8>), HpkeError> {
    // Compute the shared secret from the ephemeral inputs
    let dh_eph = Kex::dh(sk_eph, pk_recip)?;

    // The encapped key is the ephemeral pubkey
    let enc = Kex::pk_to_bytes(&Kex::sk_to_pk(sk_eph));
    let pk_recip_bytes = Kex::pk_to_bytes(pk_recip);

    // The shared secret is either derived from dh_eph alone, or from dh_eph along with another
    // DH result that's tied to the sender's identity
    let shared_secret = if let Some((sk_sender, pk_sender)) = sender_keypair {
        // kem_context = enc || pkRm || pkSm
        let kem_context = [&enc[..], &pk_recip_bytes, &Kex::pk_to_bytes(pk_sender)].concat();

        // Do a DH exchange between the sender identity key and the recipient's pubkey
        let dh_sender = Kex::dh(sk_sender, pk_recip)?;

        // dh = dh_eph || dh_sender
        let dh = Zeroizing::new([&dh_eph[..], &dh_sender[..]].concat());
        extract_and_expand(kdf, suite_id, &dh, &kem_context, n_secret)?
    } else {
        // kem_context = enc || pkRm
        let kem_context = [&enc[..], &pk_recip_bytes].concat();
        extract_and_expand(kdf, suite_id, &dh_eph, &kem_context, n_secret)?
    };

    Ok((shared_secret, enc))
}

// RFC 9180 §4.1
// def Decap(enc, skR):
//   pkE = DeserializePublicKey(enc)
//   dh = DH(skR, pkE)
//
//   pkRm = SerializePublicKey(pk(skR))
//   kem_context = concat(enc, pkRm)
//
// def AuthDecap(enc, skR, pkS):
//   pkE = DeserializePublicKey(enc)
//   dh = concat(DH(skR, pkE), DH(skR, pkS))
//
//   pkRm = SerializePublicKey(pk(skR))
//   pkSm = SerializePublicKey(pkS)
//   kem_context = concat(enc, pkRm, pkSm)
//
//   shared_secret = ExtractAndExpand(dh, kem_context)
//   return shared_secret

/// Derives the shared secret from the encapsulated key and the recipient's private key. If
/// `pk_sender` is given, the sender's identity is checked into the shared secret.
fn decap_core<Kex: DhKeyExchange>(
    kdf: &dyn KdfTrait,
    suite_id: &KemSuiteId,
    n_secret: usize,
    enc: &[u8],
    sk_recip: &Kex::PrivateKey,
    pk_sender: Option<&Kex::PublicKey>,
) -> Result<SharedSecret, HpkeError> {
    // A malformed encapped key is a structural decapsulation failure
    let pk_eph = Kex::pk_from_bytes(enc).map_err(|_| HpkeError::InvalidCiphertext)?;

    // Compute the shared secret from the ephemeral inputs
    let dh_eph = Kex::dh(sk_recip, &pk_eph)?;

    let pk_recip_bytes = Kex::pk_to_bytes(&Kex::sk_to_pk(sk_recip));

    if let Some(pk_sender) = pk_sender {
        // kem_context = enc || pkRm || pkSm
        let kem_context = [enc, &pk_recip_bytes, &Kex::pk_to_bytes(pk_sender)].concat();

        // Mirror the sender's identity DH with our private key
        let dh_sender = Kex::dh(sk_recip, pk_sender)?;

        // dh = dh_eph || dh_sender
        let dh = Zeroizing::new([&dh_eph[..], &dh_sender[..]].concat());
        extract_and_expand(kdf, suite_id, &dh, &kem_context, n_secret)
    } else {
        // kem_context = enc || pkRm
        let kem_context = [enc, &pk_recip_bytes].concat();
        extract_and_expand(kdf, suite_id, &dh_eph, &kem_context, n_secret)
    }
}

/// Defines DHKEM(Kex, Kdf) given a Diffie-Hellman group and a KDF
macro_rules! impl_dhkem {
    (
        $kem_name:ident,
        $dhkex:ty,
        $kdf:ident,
        $kem_id:literal,
        $doc_str:expr
    ) => {
        #[doc = $doc_str]
        pub struct $kem_name;

        impl $kem_name {
            // RFC 9180 §7.1
            /// The algorithm identifier for this KEM
            pub const KEM_ID: u16 = $kem_id;

            // The KDF named by this DHKEM, used for ExtractAndExpand and DeriveKeyPair
            const KDF: &'static dyn KdfTrait = &crate::kdf::$kdf;

            // Checks that a caller-provided key actually belongs to this KEM
            fn check_key_id(key_kem_id: u16) -> Result<(), HpkeError> {
                if key_kem_id != Self::KEM_ID {
                    return Err(HpkeError::InvalidKey);
                }
                Ok(())
            }

            // Lifts a validated byte-backed pubkey to its curve-native form
            fn lift_pk(pk: &KemPublicKey) -> Result<<$dhkex as DhKeyExchange>::PublicKey, HpkeError> {
                Self::check_key_id(pk.kem_id)?;
                <$dhkex>::pk_from_bytes(&pk.bytes)
            }

            // Lifts a validated byte-backed privkey to its curve-native form
            fn lift_sk(sk: &KemPrivateKey) -> Result<<$dhkex as DhKeyExchange>::PrivateKey, HpkeError> {
                Self::check_key_id(sk.kem_id)?;
                <$dhkex>::sk_from_bytes(&sk.bytes)
            }

            fn wrap_keypair(
                sk: &<$dhkex as DhKeyExchange>::PrivateKey,
                pk: &<$dhkex as DhKeyExchange>::PublicKey,
            ) -> (KemPrivateKey, KemPublicKey) {
                (
                    KemPrivateKey {
                        kem_id: Self::KEM_ID,
                        bytes: <$dhkex>::sk_to_bytes(sk),
                    },
                    KemPublicKey {
                        kem_id: Self::KEM_ID,
                        bytes: <$dhkex>::pk_to_bytes(pk),
                    },
                )
            }
        }

        impl KemTrait for $kem_name {
            fn id(&self) -> u16 {
                Self::KEM_ID
            }

            fn nsk(&self) -> usize {
                <$dhkex as DhKeyExchange>::NSK
            }

            fn npk(&self) -> usize {
                <$dhkex as DhKeyExchange>::NPK
            }

            // RFC 9180 §4.1: for DHKEM, the encapsulated key is a serialized pubkey, so
            // Nenc = Npk
            fn nenc(&self) -> usize {
                <$dhkex as DhKeyExchange>::NPK
            }

            // RFC 9180 §4.1: for DHKEM, Nsecret equals the output length of the hash function
            // underlying the KDF
            fn nsecret(&self) -> usize {
                Self::KDF.nh()
            }

            fn generate_key_pair(
                &self,
                csprng: &mut dyn CryptoRngCore,
            ) -> Result<(KemPrivateKey, KemPublicKey), HpkeError> {
                let mut ikm = Zeroizing::new(vec![0u8; self.nsk()]);
                csprng.fill_bytes(&mut ikm);
                self.derive_key_pair(&ikm)
            }

            fn derive_key_pair(
                &self,
                ikm: &[u8],
            ) -> Result<(KemPrivateKey, KemPublicKey), HpkeError> {
                // The ikm SHOULD have at least Nsk bytes of entropy; shorter inputs are rejected
                if ikm.len() < self.nsk() {
                    return Err(HpkeError::InvalidKey);
                }
                let suite_id = kem_suite_id(Self::KEM_ID);
                let (sk, pk) = <$dhkex>::derive_keypair(Self::KDF, &suite_id, ikm)?;
                Ok(Self::wrap_keypair(&sk, &pk))
            }

            fn deserialize_public_key(&self, bytes: &[u8]) -> Result<KemPublicKey, HpkeError> {
                let pk = <$dhkex>::pk_from_bytes(bytes)?;
                Ok(KemPublicKey {
                    kem_id: Self::KEM_ID,
                    bytes: <$dhkex>::pk_to_bytes(&pk),
                })
            }

            fn deserialize_private_key(&self, bytes: &[u8]) -> Result<KemPrivateKey, HpkeError> {
                let sk = <$dhkex>::sk_from_bytes(bytes)?;
                Ok(KemPrivateKey {
                    kem_id: Self::KEM_ID,
                    bytes: <$dhkex>::sk_to_bytes(&sk),
                })
            }

            fn sk_to_pk(&self, sk: &KemPrivateKey) -> Result<KemPublicKey, HpkeError> {
                let sk = Self::lift_sk(sk)?;
                let pk = <$dhkex>::sk_to_pk(&sk);
                Ok(KemPublicKey {
                    kem_id: Self::KEM_ID,
                    bytes: <$dhkex>::pk_to_bytes(&pk),
                })
            }

            // Runs encap_with_eph using a fresh ephemeral key
            fn encap(
                &self,
                csprng: &mut dyn CryptoRngCore,
                pk_recip: &KemPublicKey,
            ) -> Result<(SharedSecret, Vec<u8>), HpkeError> {
                let (sk_eph, _) = self.generate_key_pair(csprng)?;
                self.encap_deterministic(pk_recip, &sk_eph)
            }

            fn decap(
                &self,
                enc: &[u8],
                sk_recip: &KemPrivateKey,
            ) -> Result<SharedSecret, HpkeError> {
                let sk_recip = Self::lift_sk(sk_recip)?;
                let suite_id = kem_suite_id(Self::KEM_ID);
                decap_core::<$dhkex>(Self::KDF, &suite_id, self.nsecret(), enc, &sk_recip, None)
            }

            fn encap_deterministic(
                &self,
                pk_recip: &KemPublicKey,
                sk_eph: &KemPrivateKey,
            ) -> Result<(SharedSecret, Vec<u8>), HpkeError> {
                let pk_recip = Self::lift_pk(pk_recip)?;
                let sk_eph = Self::lift_sk(sk_eph)?;
                let suite_id = kem_suite_id(Self::KEM_ID);
                encap_with_eph::<$dhkex>(
                    Self::KDF,
                    &suite_id,
                    self.nsecret(),
                    &pk_recip,
                    None,
                    &sk_eph,
                )
            }

            fn auth(&self) -> Option<&dyn AuthKem> {
                Some(self)
            }
        }

        impl AuthKem for $kem_name {
            fn auth_encap(
                &self,
                csprng: &mut dyn CryptoRngCore,
                pk_recip: &KemPublicKey,
                sk_sender: &KemPrivateKey,
            ) -> Result<(SharedSecret, Vec<u8>), HpkeError> {
                let (sk_eph, _) = self.generate_key_pair(csprng)?;
                self.auth_encap_deterministic(pk_recip, sk_sender, &sk_eph)
            }

            fn auth_decap(
                &self,
                enc: &[u8],
                sk_recip: &KemPrivateKey,
                pk_sender: &KemPublicKey,
            ) -> Result<SharedSecret, HpkeError> {
                let sk_recip = Self::lift_sk(sk_recip)?;
                let pk_sender = Self::lift_pk(pk_sender)?;
                let suite_id = kem_suite_id(Self::KEM_ID);
                decap_core::<$dhkex>(
                    Self::KDF,
                    &suite_id,
                    self.nsecret(),
                    enc,
                    &sk_recip,
                    Some(&pk_sender),
                )
            }

            fn auth_encap_deterministic(
                &self,
                pk_recip: &KemPublicKey,
                sk_sender: &KemPrivateKey,
                sk_eph: &KemPrivateKey,
            ) -> Result<(SharedSecret, Vec<u8>), HpkeError> {
                let pk_recip = Self::lift_pk(pk_recip)?;
                let sk_sender = Self::lift_sk(sk_sender)?;
                let pk_sender = <$dhkex>::sk_to_pk(&sk_sender);
                let sk_eph = Self::lift_sk(sk_eph)?;
                let suite_id = kem_suite_id(Self::KEM_ID);
                encap_with_eph::<$dhkex>(
                    Self::KDF,
                    &suite_id,
                    self.nsecret(),
                    &pk_recip,
                    Some((&sk_sender, &pk_sender)),
                    &sk_eph,
                )
            }
        }
    };
}

// Implement DHKEM(X25519, HKDF-SHA256)
#[cfg(feature = "x25519")]
impl_dhkem!(
    X25519HkdfSha256,
    crate::dhkex::x25519::X25519,
    HkdfSha256,
    0x0020,
    "Represents DHKEM(X25519, HKDF-SHA256)"
);

// Implement DHKEM(P-256, HKDF-SHA256)
#[cfg(feature = "p256")]
impl_dhkem!(
    DhP256HkdfSha256,
    crate::dhkex::ecdh_nistp::p256::DhP256,
    HkdfSha256,
    0x0010,
    "Represents DHKEM(P-256, HKDF-SHA256)"
);

// Implement DHKEM(P-384, HKDF-SHA384)
#[cfg(feature = "p384")]
impl_dhkem!(
    DhP384HkdfSha384,
    crate::dhkex::ecdh_nistp::p384::DhP384,
    HkdfSha384,
    0x0011,
    "Represents DHKEM(P-384, HKDF-SHA384)"
);

#[cfg(test)]
mod tests {
    use crate::kem::{AuthKem, Kem};

    use rand::{rngs::StdRng, SeedableRng};

    /// Tests that encap and decap produce the same shared secret when composed, in both the base
    /// and authenticated variants
    #[allow(dead_code)]
    fn test_encap_correctness(kem: &dyn Kem) {
        let mut csprng = StdRng::from_entropy();
        let (sk_recip, pk_recip) = kem.generate_key_pair(&mut csprng).unwrap();

        // Encapsulate a random shared secret
        let (shared_secret, enc) = kem.encap(&mut csprng, &pk_recip).unwrap();
        assert_eq!(enc.len(), kem.nenc());
        assert_eq!(shared_secret.len(), kem.nsecret());

        // Decap it and ensure that the encapsulated secret is what decap() derives
        let decapped = kem.decap(&enc, &sk_recip).unwrap();
        assert_eq!(shared_secret.as_slice(), decapped.as_slice());

        //
        // Now do it with the auth variant, i.e., using the sender's identity keys
        //

        let auth_kem = kem.auth().expect("DHKEM supports the auth variant");
        let (sk_sender, pk_sender) = kem.generate_key_pair(&mut csprng).unwrap();

        let (auth_shared_secret, enc) =
            auth_kem.auth_encap(&mut csprng, &pk_recip, &sk_sender).unwrap();
        let decapped = auth_kem.auth_decap(&enc, &sk_recip, &pk_sender).unwrap();
        assert_eq!(auth_shared_secret.as_slice(), decapped.as_slice());

        // Decapping under the wrong sender identity must derive a different secret
        let (_, pk_mallory) = kem.generate_key_pair(&mut csprng).unwrap();
        let decapped_wrong = auth_kem.auth_decap(&enc, &sk_recip, &pk_mallory).unwrap();
        assert_ne!(auth_shared_secret.as_slice(), decapped_wrong.as_slice());
    }

    /// Tests that derive_key_pair is deterministic, rejects short ikm, and round-trips through
    /// the serialization interface
    #[allow(dead_code)]
    fn test_derive_keypair_correctness(kem: &dyn Kem) {
        let ikm = vec![0x42u8; kem.nsk()];

        let (sk1, pk1) = kem.derive_key_pair(&ikm).unwrap();
        let (sk2, pk2) = kem.derive_key_pair(&ikm).unwrap();
        assert_eq!(sk1.as_bytes(), sk2.as_bytes());
        assert_eq!(pk1.as_bytes(), pk2.as_bytes());

        assert_eq!(sk1.as_bytes().len(), kem.nsk());
        assert_eq!(pk1.as_bytes().len(), kem.npk());

        // The derived pubkey must be the privkey's pubkey
        assert_eq!(kem.sk_to_pk(&sk1).unwrap().as_bytes(), pk1.as_bytes());

        // Short ikm is rejected
        assert!(kem.derive_key_pair(&ikm[..kem.nsk() - 1]).is_err());

        // Serialization round-trip
        let sk = kem.deserialize_private_key(sk1.as_bytes()).unwrap();
        let pk = kem.deserialize_public_key(pk1.as_bytes()).unwrap();
        assert_eq!(sk.as_bytes(), sk1.as_bytes());
        assert_eq!(pk.as_bytes(), pk1.as_bytes());
    }

    /// Tests that keys are rejected when used under a different KEM
    #[cfg(all(feature = "x25519", feature = "p256"))]
    #[test]
    fn test_kem_id_mismatch() {
        use crate::kem::{DhP256HkdfSha256, X25519HkdfSha256};
        use crate::HpkeError;

        let mut csprng = StdRng::from_entropy();
        let (sk, pk) = X25519HkdfSha256.generate_key_pair(&mut csprng).unwrap();

        assert!(matches!(
            DhP256HkdfSha256.encap(&mut csprng, &pk),
            Err(HpkeError::InvalidKey)
        ));
        assert_eq!(DhP256HkdfSha256.sk_to_pk(&sk).unwrap_err(), HpkeError::InvalidKey);
    }

    macro_rules! test_kem {
        ($test_name:ident, $feature:literal, $kem:path) => {
            #[cfg(feature = $feature)]
            #[test]
            fn $test_name() {
                test_encap_correctness(&$kem);
                test_derive_keypair_correctness(&$kem);
            }
        };
    }

    test_kem!(test_kem_x25519, "x25519", crate::kem::X25519HkdfSha256);
    test_kem!(test_kem_p256, "p256", crate::kem::DhP256HkdfSha256);
    test_kem!(test_kem_p384, "p384", crate::kem::DhP384HkdfSha384);
}
