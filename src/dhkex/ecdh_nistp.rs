// We define all the NIST P- curve ECDH functionalities in one macro
macro_rules! nistp_dhkex {
    (
        $curve_name:expr,
        $dh_name:ident,
        $curve:ident,
        $pubkey_size:literal,
        $privkey_size:literal,
        $keygen_bitmask:expr
    ) => {
        pub(crate) mod $curve {
            use crate::{
                dhkex::DhKeyExchange,
                kdf::{labeled_expand, labeled_extract, Kdf},
                util::KemSuiteId,
                HpkeError,
            };

            use alloc::vec::Vec;

            use ::$curve as curve_crate;
            use curve_crate::elliptic_curve::{ecdh::diffie_hellman, sec1::ToEncodedPoint};
            use zeroize::Zeroizing;

            #[doc = concat!("An ECDH ", $curve_name, " public key. This is never the point at infinity.")]
            #[derive(Clone, Debug, Eq, PartialEq)]
            pub(crate) struct PublicKey(curve_crate::PublicKey);

            // This is only ever constructed via sk_from_bytes, which checks for the 0 value.
            // Also, the underlying type is zeroize-on-drop.
            #[doc = concat!(
                "An ECDH ",
                $curve_name,
                " private key. This is a scalar in the range `[1,p)` where `p` is the group order."
            )]
            #[derive(Clone)]
            pub(crate) struct PrivateKey(curve_crate::SecretKey);

            #[cfg(test)]
            impl PartialEq for PrivateKey {
                fn eq(&self, other: &PrivateKey) -> bool {
                    self.0 == other.0
                }
            }

            #[doc = concat!("Represents ECDH functionality over NIST curve ", $curve_name, ".")]
            pub(crate) struct $dh_name;

            impl DhKeyExchange for $dh_name {
                const NPK: usize = $pubkey_size;
                const NSK: usize = $privkey_size;

                type PublicKey = PublicKey;
                type PrivateKey = PrivateKey;

                fn sk_to_pk(sk: &PrivateKey) -> PublicKey {
                    // pk = sk·G where G is the generator. This maintains the invariant of the
                    // public key not being the point at infinity, since ord(G) = p, and sk is
                    // not 0 mod p.
                    PublicKey(sk.0.public_key())
                }

                /// Does the DH operation. This cannot hit the point at infinity: pk is a valid
                /// curve point and sk is a nonzero scalar mod p, so the result is a non-identity
                /// element of a prime-order group.
                fn dh(sk: &PrivateKey, pk: &PublicKey) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
                    let dh_res = diffie_hellman(sk.0.to_nonzero_scalar(), pk.0.as_affine());
                    // RFC 9180 §4.1: Ndh is the length of the x-coordinate, which is what
                    // raw_secret_bytes returns
                    Ok(Zeroizing::new(dh_res.raw_secret_bytes().to_vec()))
                }

                // Everything is serialized and deserialized in uncompressed form
                fn pk_to_bytes(pk: &PublicKey) -> Vec<u8> {
                    pk.0.as_affine().to_encoded_point(false).as_bytes().to_vec()
                }

                fn pk_from_bytes(bytes: &[u8]) -> Result<PublicKey, HpkeError> {
                    // In order to parse as an uncompressed curve point, first make sure the input
                    // length is correct
                    if bytes.len() != Self::NPK {
                        return Err(HpkeError::InvalidKey);
                    }

                    // The non-identity invariant is preserved here, because from_sec1_bytes()
                    // errors on the point at infinity
                    let parsed = curve_crate::PublicKey::from_sec1_bytes(bytes)
                        .map_err(|_| HpkeError::InvalidKey)?;
                    Ok(PublicKey(parsed))
                }

                fn sk_to_bytes(sk: &PrivateKey) -> Zeroizing<Vec<u8>> {
                    Zeroizing::new(sk.0.to_bytes().to_vec())
                }

                fn sk_from_bytes(bytes: &[u8]) -> Result<PrivateKey, HpkeError> {
                    if bytes.len() != Self::NSK {
                        return Err(HpkeError::InvalidKey);
                    }

                    // Invariant: the scalar is in [1,p). from_slice() rejects zero and anything
                    // exceeding the modulus.
                    let sk = curve_crate::SecretKey::from_slice(bytes)
                        .map_err(|_| HpkeError::InvalidKey)?;
                    Ok(PrivateKey(sk))
                }

                // RFC 9180 §7.1.3:
                // def DeriveKeyPair(ikm):
                //   dkp_prk = LabeledExtract("", "dkp_prk", ikm)
                //   sk = 0
                //   counter = 0
                //   while sk == 0 or sk >= order:
                //     if counter > 255:
                //       raise DeriveKeyPairError
                //     bytes = LabeledExpand(dkp_prk, "candidate",
                //                           I2OSP(counter, 1), Nsk)
                //     bytes[0] = bytes[0] & bitmask
                //     sk = OS2IP(bytes)
                //     counter = counter + 1
                //   return (sk, pk(sk))
                fn derive_keypair(
                    kdf: &dyn Kdf,
                    suite_id: &KemSuiteId,
                    ikm: &[u8],
                ) -> Result<(PrivateKey, PublicKey), HpkeError> {
                    let dkp_prk = labeled_extract(kdf, suite_id, b"", b"dkp_prk", ikm);

                    // Try to generate a key 256 times. Practically, this succeeds on the first
                    // iteration.
                    for counter in 0u8..=255 {
                        let mut candidate = Zeroizing::new(labeled_expand(
                            kdf,
                            suite_id,
                            &dkp_prk,
                            b"candidate",
                            &[counter],
                            Self::NSK,
                        )?);
                        candidate[0] &= $keygen_bitmask;

                        // Recall the invariant of PrivateKey: it is a value in the range [1,p)
                        if let Ok(sk) = Self::sk_from_bytes(&candidate) {
                            let pk = Self::sk_to_pk(&sk);
                            return Ok((sk, pk));
                        }
                    }

                    // The likelihood of getting 256 bad samples in a row for P-256 is 2^-8192
                    Err(HpkeError::InvalidKey)
                }
            }
        }
    };
}

#[cfg(feature = "p256")]
nistp_dhkex!(
    "P-256",
    DhP256,
    p256,
    65,   // RFC 9180 §7.1: Npk of DHKEM(P-256, HKDF-SHA256) is 65
    32,   // RFC 9180 §7.1: Nsk of DHKEM(P-256, HKDF-SHA256) is 32
    0xFF  // RFC 9180 §7.1.3: the bitmask in DeriveKeyPair is 0xFF for P-256
);

#[cfg(feature = "p384")]
nistp_dhkex!(
    "P-384",
    DhP384,
    p384,
    97,   // RFC 9180 §7.1: Npk of DHKEM(P-384, HKDF-SHA384) is 97
    48,   // RFC 9180 §7.1: Nsk of DHKEM(P-384, HKDF-SHA384) is 48
    0xFF  // RFC 9180 §7.1.3: the bitmask in DeriveKeyPair is 0xFF for P-384
);

#[cfg(test)]
mod tests {
    use crate::dhkex::DhKeyExchange;

    #[cfg(feature = "p256")]
    use super::p256::DhP256;
    #[cfg(feature = "p384")]
    use super::p384::DhP384;

    use hex_literal::hex;

    //
    // Test vectors come from RFC 5903 §8.1 and §8.2
    // https://tools.ietf.org/html/rfc5903
    //

    #[cfg(feature = "p256")]
    const P256_PRIVKEYS: &[&[u8]] = &[
        &hex!("C88F01F5 10D9AC3F 70A292DA A2316DE5 44E9AAB8 AFE84049 C62A9C57 862D1433"),
        &hex!("C6EF9C5D 78AE012A 011164AC B397CE20 88685D8F 06BF9BE0 B283AB46 476BEE53"),
    ];

    // The public keys corresponding to the above private keys, in order
    #[cfg(feature = "p256")]
    const P256_PUBKEYS: &[&[u8]] = &[
        &hex!(
            "04"                                                                      // Uncompressed
            "DAD0B653 94221CF9 B051E1FE CA5787D0 98DFE637 FC90B9EF 945D0C37 72581180" // x-coordinate
            "5271A046 1CDB8252 D61F1C45 6FA3E59A B1F45B33 ACCF5F58 389E0577 B8990BB3" // y-coordinate
        ),
        &hex!(
            "04"                                                                      // Uncompressed
            "D12DFB52 89C8D4F8 1208B702 70398C34 2296970A 0BCCB74C 736FC755 4494BF63" // x-coordinate
            "56FBF3CA 366CC23E 8157854C 13C58D6A AC23F046 ADA30F83 53E74F33 039872AB" // y-coordinate
        ),
    ];

    // The result of DH(privkey0, pubkey1) or equivalently, DH(privkey1, pubkey0)
    #[cfg(feature = "p256")]
    const P256_DH_RES_XCOORD: &[u8] =
        &hex!("D6840F6B 42F6EDAF D13116E0 E1256520 2FEF8E9E CE7DCE03 812464D0 4B9442DE");

    #[cfg(feature = "p384")]
    const P384_PRIVKEYS: &[&[u8]] = &[
        &hex!(
            "099F3C70 34D4A2C6 99884D73 A375A67F 7624EF7C 6B3C0F16 0647B674 14DCE655 E35B5380"
            "41E649EE 3FAEF896 783AB194"
        ),
        &hex!(
            "41CB0779 B4BDB85D 47846725 FBEC3C94 30FAB46C C8DC5060 855CC9BD A0AA2942 E0308312"
            "916B8ED2 960E4BD5 5A7448FC"
        ),
    ];

    // The public keys corresponding to the above private keys, in order
    #[cfg(feature = "p384")]
    const P384_PUBKEYS: &[&[u8]] = &[
        &hex!(
            "04"                                                             // Uncompressed
            "667842D7 D180AC2C DE6F74F3 7551F557 55C7645C 20EF73E3 1634FE72" // x-coordinate
            "B4C55EE6 DE3AC808 ACB4BDB4 C88732AE E95F41AA"                   //   ...cont
            "9482ED1F C0EEB9CA FC498462 5CCFC23F 65032149 E0E144AD A0241815" // y-coordinate
            "35A0F38E EB9FCFF3 C2C947DA E69B4C63 4573A81C"                   //   ...cont
        ),
        &hex!(
            "04"                                                             // Uncompressed
            "E558DBEF 53EECDE3 D3FCCFC1 AEA08A89 A987475D 12FD950D 83CFA417" // x-coordinate
            "32BC509D 0D1AC43A 0336DEF9 6FDA41D0 774A3571"                   //   ...cont
            "DCFBEC7A ACF31964 72169E83 8430367F 66EEBE3C 6E70C416 DD5F0C68" // y-coordinate
            "759DD1FF F83FA401 42209DFF 5EAAD96D B9E6386C"                   //   ...cont
        ),
    ];

    // The result of DH(privkey0, pubkey1) or equivalently, DH(privkey1, pubkey0)
    #[cfg(feature = "p384")]
    const P384_DH_RES_XCOORD: &[u8] = &hex!(
        "11187331 C279962D 93D60424 3FD592CB 9D0A926F 422E4718 7521287E 7156C5C4 D6031355"
        "69B9E9D0 9CF5D4A2 70F59746"
    );

    /// Tests the ECDH op against a known answer
    #[allow(dead_code)]
    fn test_vector_ecdh<Kex: DhKeyExchange>(
        sk_recip_bytes: &[u8],
        pk_sender_bytes: &[u8],
        dh_res_xcoord_bytes: &[u8],
    ) {
        // Deserialize the pubkey and privkey and do a DH operation
        let sk_recip = Kex::sk_from_bytes(sk_recip_bytes).unwrap();
        let pk_sender = Kex::pk_from_bytes(pk_sender_bytes).unwrap();
        let derived_dh = Kex::dh(&sk_recip, &pk_sender).unwrap();

        // The HPKE DH result is just the x-coordinate, so that's all we can compare
        assert_eq!(derived_dh.as_slice(), dh_res_xcoord_bytes);
    }

    /// Tests the `sk_to_pk` function against known answers
    #[allow(dead_code)]
    fn test_vector_corresponding_pubkey<Kex: DhKeyExchange>(sks: &[&[u8]], pks: &[&[u8]]) {
        for (sk_bytes, pk_bytes) in sks.iter().zip(pks.iter()) {
            let sk = Kex::sk_from_bytes(sk_bytes).unwrap();
            let pk = Kex::pk_from_bytes(pk_bytes).unwrap();

            // Derive the secret key's corresponding pubkey and check that it matches the given
            // pubkey
            let derived_pk = Kex::sk_to_pk(&sk);
            assert_eq!(Kex::pk_to_bytes(&derived_pk), Kex::pk_to_bytes(&pk));
        }
    }

    #[cfg(feature = "p256")]
    #[test]
    fn test_vector_ecdh_p256() {
        test_vector_ecdh::<DhP256>(P256_PRIVKEYS[0], P256_PUBKEYS[1], P256_DH_RES_XCOORD);
    }

    #[cfg(feature = "p384")]
    #[test]
    fn test_vector_ecdh_p384() {
        test_vector_ecdh::<DhP384>(P384_PRIVKEYS[0], P384_PUBKEYS[1], P384_DH_RES_XCOORD);
    }

    #[cfg(feature = "p256")]
    #[test]
    fn test_vector_corresponding_pubkey_p256() {
        test_vector_corresponding_pubkey::<DhP256>(P256_PRIVKEYS, P256_PUBKEYS);
    }

    #[cfg(feature = "p384")]
    #[test]
    fn test_vector_corresponding_pubkey_p384() {
        test_vector_corresponding_pubkey::<DhP384>(P384_PRIVKEYS, P384_PUBKEYS);
    }

    /// Tests that off-length and degenerate encodings are rejected
    #[cfg(feature = "p256")]
    #[test]
    fn test_key_validation_p256() {
        // A compressed-length encoding must be rejected even if it names a valid point
        assert!(DhP256::pk_from_bytes(&[0x02; 33]).is_err());
        // The all-zero uncompressed encoding is not a valid point
        assert!(DhP256::pk_from_bytes(&[0x00; 65]).is_err());
        // A zero scalar is not a valid private key
        assert!(DhP256::sk_from_bytes(&[0x00; 32]).is_err());
    }
}
