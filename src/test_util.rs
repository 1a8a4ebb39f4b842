#[cfg(feature = "x25519")]
use crate::{
    context::{ReceiverContext, SenderContext},
    setup::{setup_base_r, setup_base_s},
    suite::CipherSuite,
};

use rand::{rngs::StdRng, RngCore, SeedableRng};

// The seed scenario inputs, used anywhere a test needs a plausible transcript
pub(crate) const SEED_INFO: &[u8] = b"Ode on a Grecian Urn";
pub(crate) const SEED_AAD: &[u8] = b"that is all // Ye know on earth, and all ye need to know";
pub(crate) const SEED_MSG: &[u8] = b"Beauty is truth, truth beauty";
pub(crate) const SEED_PSK_ID: &[u8] = b"Ennyn Durin aran Moria";

/// Returns a random 32-byte PSK
pub(crate) fn new_psk() -> [u8; 32] {
    let mut csprng = StdRng::from_entropy();
    let mut buf = [0u8; 32];
    csprng.fill_bytes(&mut buf);
    buf
}

// The default suite for context-level tests. Everything context.rs exercises is
// algorithm-agnostic, so one suite is enough.
#[cfg(feature = "x25519")]
fn test_suite() -> CipherSuite {
    CipherSuite::new(
        crate::kem::X25519HkdfSha256::KEM_ID,
        crate::kdf::HkdfSha256::KDF_ID,
        crate::aead::ChaCha20Poly1305::AEAD_ID,
    )
    .unwrap()
}

/// Creates an agreeing sender/receiver pair over the default suite via a fresh base-mode setup
#[cfg(feature = "x25519")]
pub(crate) fn gen_ctx_pair() -> (SenderContext, ReceiverContext) {
    gen_ctx_pair_with_rng(&mut StdRng::from_entropy())
}

/// Like `gen_ctx_pair`, but seeded: two calls with the same seed yield byte-identical pairs
#[cfg(feature = "x25519")]
pub(crate) fn gen_ctx_pair_seeded(seed: u64) -> (SenderContext, ReceiverContext) {
    gen_ctx_pair_with_rng(&mut StdRng::seed_from_u64(seed))
}

#[cfg(feature = "x25519")]
fn gen_ctx_pair_with_rng(csprng: &mut StdRng) -> (SenderContext, ReceiverContext) {
    let suite = test_suite();
    let (sk_recip, pk_recip) = suite.kem().generate_key_pair(csprng).unwrap();

    let (enc, sender) = setup_base_s(&suite, csprng, &pk_recip, SEED_INFO).unwrap();
    let receiver = setup_base_r(&suite, &sk_recip, &enc, SEED_INFO).unwrap();

    (sender, receiver)
}
