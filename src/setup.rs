//! The eight `Setup` entry points of RFC 9180 §5.1: `{Base, PSK, Auth, AuthPSK} × {S, R}`.
//! Each sender variant runs the KEM's (Auth)Encap, feeds the shared secret through the key
//! schedule, and returns the encapsulated key alongside a [`SenderContext`]. Each receiver
//! variant mirrors it with (Auth)Decap and returns the twin [`ReceiverContext`].

use crate::{
    context::{ReceiverContext, Role, SenderContext},
    kem::{KemPrivateKey, KemPublicKey},
    key_schedule::key_schedule,
    suite::{CipherSuite, Mode},
    HpkeError,
};

use alloc::vec::Vec;

use rand_core::{CryptoRng, RngCore};

// def SetupBaseS(pkR, info):
//   shared_secret, enc = Encap(pkR)
//   return enc, KeyScheduleS(mode_base, shared_secret, info,
//                            default_psk, default_psk_id)
/// Initiates an encryption context to the holder of the given public key
///
/// Return Value
/// ============
/// Returns an encapsulated key (intended to be sent to the recipient) and a sender context.
pub fn setup_base_s<R: CryptoRng + RngCore>(
    suite: &CipherSuite,
    csprng: &mut R,
    pk_recip: &KemPublicKey,
    info: &[u8],
) -> Result<(Vec<u8>, SenderContext), HpkeError> {
    let (shared_secret, enc) = suite.kem.encap(csprng, pk_recip)?;
    let ctx = key_schedule(
        *suite,
        Role::Sender,
        Mode::Base,
        shared_secret,
        enc.clone(),
        info,
        b"",
        b"",
    )?;
    Ok((enc, SenderContext::new(ctx)))
}

// def SetupBaseR(enc, skR, info):
//   shared_secret = Decap(enc, skR)
//   return KeyScheduleR(mode_base, shared_secret, info,
//                       default_psk, default_psk_id)
/// Initiates a decryption context from an encapsulated key produced for `sk_recip`'s public key
pub fn setup_base_r(
    suite: &CipherSuite,
    sk_recip: &KemPrivateKey,
    enc: &[u8],
    info: &[u8],
) -> Result<ReceiverContext, HpkeError> {
    let shared_secret = suite.kem.decap(enc, sk_recip)?;
    let ctx = key_schedule(
        *suite,
        Role::Receiver,
        Mode::Base,
        shared_secret,
        enc.to_vec(),
        info,
        b"",
        b"",
    )?;
    Ok(ReceiverContext::new(ctx))
}

// def SetupPSKS(pkR, info, psk, psk_id):
//   shared_secret, enc = Encap(pkR)
//   return enc, KeyScheduleS(mode_psk, shared_secret, info, psk, psk_id)
/// The PSK variant of [`setup_base_s`]: the preshared key and its identifier are folded into the
/// key schedule, binding the context to their knowledge
///
/// Return Value
/// ============
/// Fails with `InconsistentPsk` if `psk` or `psk_id` is empty.
pub fn setup_psk_s<R: CryptoRng + RngCore>(
    suite: &CipherSuite,
    csprng: &mut R,
    pk_recip: &KemPublicKey,
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
) -> Result<(Vec<u8>, SenderContext), HpkeError> {
    let (shared_secret, enc) = suite.kem.encap(csprng, pk_recip)?;
    let ctx = key_schedule(
        *suite,
        Role::Sender,
        Mode::Psk,
        shared_secret,
        enc.clone(),
        info,
        psk,
        psk_id,
    )?;
    Ok((enc, SenderContext::new(ctx)))
}

/// The PSK variant of [`setup_base_r`]
pub fn setup_psk_r(
    suite: &CipherSuite,
    sk_recip: &KemPrivateKey,
    enc: &[u8],
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
) -> Result<ReceiverContext, HpkeError> {
    let shared_secret = suite.kem.decap(enc, sk_recip)?;
    let ctx = key_schedule(
        *suite,
        Role::Receiver,
        Mode::Psk,
        shared_secret,
        enc.to_vec(),
        info,
        psk,
        psk_id,
    )?;
    Ok(ReceiverContext::new(ctx))
}

// def SetupAuthS(pkR, info, skS):
//   shared_secret, enc = AuthEncap(pkR, skS)
//   return enc, KeyScheduleS(mode_auth, shared_secret, info,
//                            default_psk, default_psk_id)
/// The authenticated variant of [`setup_base_s`]: the sender's identity key is tied into the
/// shared secret via AuthEncap
///
/// Return Value
/// ============
/// Fails with `ModeNotSupported` if the suite's KEM has no authenticated variant.
pub fn setup_auth_s<R: CryptoRng + RngCore>(
    suite: &CipherSuite,
    csprng: &mut R,
    pk_recip: &KemPublicKey,
    info: &[u8],
    sk_sender: &KemPrivateKey,
) -> Result<(Vec<u8>, SenderContext), HpkeError> {
    let kem = suite.kem.auth().ok_or(HpkeError::ModeNotSupported)?;
    let (shared_secret, enc) = kem.auth_encap(csprng, pk_recip, sk_sender)?;
    let ctx = key_schedule(
        *suite,
        Role::Sender,
        Mode::Auth,
        shared_secret,
        enc.clone(),
        info,
        b"",
        b"",
    )?;
    Ok((enc, SenderContext::new(ctx)))
}

// def SetupAuthR(enc, skR, info, pkS):
//   shared_secret = AuthDecap(enc, skR, pkS)
//   return KeyScheduleR(mode_auth, shared_secret, info,
//                       default_psk, default_psk_id)
/// The authenticated variant of [`setup_base_r`]: decapsulation only agrees with the sender if
/// `enc` was produced under `pk_sender`'s private key
pub fn setup_auth_r(
    suite: &CipherSuite,
    sk_recip: &KemPrivateKey,
    enc: &[u8],
    info: &[u8],
    pk_sender: &KemPublicKey,
) -> Result<ReceiverContext, HpkeError> {
    let kem = suite.kem.auth().ok_or(HpkeError::ModeNotSupported)?;
    let shared_secret = kem.auth_decap(enc, sk_recip, pk_sender)?;
    let ctx = key_schedule(
        *suite,
        Role::Receiver,
        Mode::Auth,
        shared_secret,
        enc.to_vec(),
        info,
        b"",
        b"",
    )?;
    Ok(ReceiverContext::new(ctx))
}

// def SetupAuthPSKS(pkR, info, psk, psk_id, skS):
//   shared_secret, enc = AuthEncap(pkR, skS)
//   return enc, KeyScheduleS(mode_auth_psk, shared_secret, info,
//                            psk, psk_id)
/// The combination of [`setup_psk_s`] and [`setup_auth_s`]
pub fn setup_auth_psk_s<R: CryptoRng + RngCore>(
    suite: &CipherSuite,
    csprng: &mut R,
    pk_recip: &KemPublicKey,
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
    sk_sender: &KemPrivateKey,
) -> Result<(Vec<u8>, SenderContext), HpkeError> {
    let kem = suite.kem.auth().ok_or(HpkeError::ModeNotSupported)?;
    let (shared_secret, enc) = kem.auth_encap(csprng, pk_recip, sk_sender)?;
    let ctx = key_schedule(
        *suite,
        Role::Sender,
        Mode::AuthPsk,
        shared_secret,
        enc.clone(),
        info,
        psk,
        psk_id,
    )?;
    Ok((enc, SenderContext::new(ctx)))
}

/// The combination of [`setup_psk_r`] and [`setup_auth_r`]
pub fn setup_auth_psk_r(
    suite: &CipherSuite,
    sk_recip: &KemPrivateKey,
    enc: &[u8],
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
    pk_sender: &KemPublicKey,
) -> Result<ReceiverContext, HpkeError> {
    let kem = suite.kem.auth().ok_or(HpkeError::ModeNotSupported)?;
    let shared_secret = kem.auth_decap(enc, sk_recip, pk_sender)?;
    let ctx = key_schedule(
        *suite,
        Role::Receiver,
        Mode::AuthPsk,
        shared_secret,
        enc.to_vec(),
        info,
        psk,
        psk_id,
    )?;
    Ok(ReceiverContext::new(ctx))
}

/// The deterministic sender setup used to reproduce known-answer vectors: identical to the
/// public functions except that the KEM's ephemeral key is an input rather than freshly sampled
pub(crate) fn setup_s_deterministic(
    suite: &CipherSuite,
    mode: Mode,
    pk_recip: &KemPublicKey,
    sk_sender: Option<&KemPrivateKey>,
    sk_eph: &KemPrivateKey,
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
) -> Result<(Vec<u8>, SenderContext), HpkeError> {
    let (shared_secret, enc) = match mode {
        Mode::Base | Mode::Psk => suite.kem.encap_deterministic(pk_recip, sk_eph)?,
        Mode::Auth | Mode::AuthPsk => {
            let kem = suite.kem.auth().ok_or(HpkeError::ModeNotSupported)?;
            let sk_sender = sk_sender.ok_or(HpkeError::InvalidKey)?;
            kem.auth_encap_deterministic(pk_recip, sk_sender, sk_eph)?
        }
    };
    let ctx = key_schedule(
        *suite,
        Role::Sender,
        mode,
        shared_secret,
        enc.clone(),
        info,
        psk,
        psk_id,
    )?;
    Ok((enc, SenderContext::new(ctx)))
}
