use crate::{
    kem::{KemPrivateKey, KemPublicKey},
    setup::{setup_base_r, setup_base_s},
    suite::CipherSuite,
    HpkeError,
};

use alloc::vec::Vec;

use rand_core::{CryptoRng, RngCore};

// def SealBase(pkR, info, aad, pt):
//   enc, ctx = SetupBaseS(pkR, info)
//   ct = ctx.Seal(aad, pt)
//   return enc, ct
/// Does a base-mode `setup_base_s` and a single `seal` in one shot
///
/// Return Value
/// ============
/// Returns `Ok((encapped_key, ciphertext))` on success. Fails with `OperationNotSupported` on an
/// export-only suite, since there is nothing to seal.
pub fn single_shot_seal<R: CryptoRng + RngCore>(
    suite: &CipherSuite,
    csprng: &mut R,
    pk_recip: &KemPublicKey,
    info: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), HpkeError> {
    let (enc, mut ctx) = setup_base_s(suite, csprng, pk_recip, info)?;
    let ciphertext = ctx.seal(aad, plaintext)?;
    Ok((enc, ciphertext))
}

// def OpenBase(enc, skR, info, aad, ct):
//   ctx = SetupBaseR(enc, skR, info)
//   return ctx.Open(aad, ct)
/// Does a base-mode `setup_base_r` and a single `open` in one shot
pub fn single_shot_open(
    suite: &CipherSuite,
    sk_recip: &KemPrivateKey,
    enc: &[u8],
    info: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, HpkeError> {
    let mut ctx = setup_base_r(suite, sk_recip, enc, info)?;
    ctx.open(aad, ciphertext)
}

#[cfg(all(test, feature = "x25519"))]
mod tests {
    use super::{single_shot_open, single_shot_seal};
    use crate::suite::CipherSuite;

    use rand::{rngs::StdRng, SeedableRng};

    /// Tests that `single_shot_open` can open a `single_shot_seal` ciphertext. This doesn't need
    /// to be tested for all ciphersuite combinations, since its correctness follows from the
    /// correctness of `setup_*` and `seal`/`open`.
    #[test]
    fn test_single_shot_correctness() {
        let suite = CipherSuite::new(
            crate::kem::X25519HkdfSha256::KEM_ID,
            crate::kdf::HkdfSha256::KDF_ID,
            crate::aead::ChaCha20Poly1305::AEAD_ID,
        )
        .unwrap();

        let msg = b"Good night, a-ding ding ding ding ding";
        let aad = b"Five four three two one";
        let info = b"why would you think in a million years that that would actually work";

        let mut csprng = StdRng::from_entropy();
        let (sk_recip, pk_recip) = suite.kem().generate_key_pair(&mut csprng).unwrap();

        let (enc, ciphertext) =
            single_shot_seal(&suite, &mut csprng, &pk_recip, info, aad, msg)
                .expect("single_shot_seal() failed");

        // Make sure seal() isn't a no-op
        assert!(&ciphertext[..msg.len()] != &msg[..]);

        let decrypted = single_shot_open(&suite, &sk_recip, &enc, info, aad, &ciphertext)
            .expect("single_shot_open() failed");
        assert_eq!(&decrypted, msg);
    }
}
