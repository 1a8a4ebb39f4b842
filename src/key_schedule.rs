use crate::{
    context::{EncryptionContext, Role},
    kdf::{labeled_expand, labeled_extract},
    kem::SharedSecret,
    suite::{CipherSuite, Mode},
    HpkeError,
};

use alloc::vec::Vec;

use zeroize::Zeroizing;

/// The public inputs that fed the key schedule, retained on the context for serialization and
/// for test-vector inspection
pub(crate) struct SetupParams {
    pub(crate) psk_id_hash: Vec<u8>,
    pub(crate) info_hash: Vec<u8>,
    pub(crate) shared_secret: SharedSecret,
    pub(crate) enc: Vec<u8>,
}

/// The intermediate key-schedule transcript, retained for the same reasons
pub(crate) struct ContextParams {
    pub(crate) key_schedule_context: Vec<u8>,
    pub(crate) secret: Zeroizing<Vec<u8>>,
}

// def VerifyPSKInputs(mode, psk, psk_id):
//   got_psk = (psk != default_psk)
//   got_psk_id = (psk_id != default_psk_id)
//   if got_psk != got_psk_id:
//     raise Exception("Inconsistent PSK inputs")
//   if got_psk and (mode in [mode_base, mode_auth]):
//     raise Exception("PSK input provided when not needed")
//   if (not got_psk) and (mode in [mode_psk, mode_auth_psk]):
//     raise Exception("Missing required PSK input")
/// Checks that the PSK inputs are present exactly when the mode calls for them
pub(crate) fn verify_psk_inputs(mode: Mode, psk: &[u8], psk_id: &[u8]) -> Result<(), HpkeError> {
    let got_psk = !psk.is_empty();
    let got_psk_id = !psk_id.is_empty();

    if got_psk != got_psk_id {
        return Err(HpkeError::InconsistentPsk);
    }
    if got_psk && matches!(mode, Mode::Base | Mode::Auth) {
        return Err(HpkeError::InconsistentPsk);
    }
    if !got_psk && matches!(mode, Mode::Psk | Mode::AuthPsk) {
        return Err(HpkeError::InconsistentPsk);
    }

    Ok(())
}

// RFC 9180 §5.1
// def KeySchedule<ROLE>(mode, shared_secret, info, psk, psk_id):
//   VerifyPSKInputs(mode, psk, psk_id)
//
//   psk_id_hash = LabeledExtract("", "psk_id_hash", psk_id)
//   info_hash = LabeledExtract("", "info_hash", info)
//   key_schedule_context = concat(mode, psk_id_hash, info_hash)
//
//   secret = LabeledExtract(shared_secret, "secret", psk)
//
//   key = LabeledExpand(secret, "key", key_schedule_context, Nk)
//   base_nonce = LabeledExpand(secret, "base_nonce", key_schedule_context, Nn)
//   exporter_secret = LabeledExpand(secret, "exp", key_schedule_context, Nh)
//
//   return Context<ROLE>(key, base_nonce, 0, exporter_secret)
/// Runs the key schedule over the KEM shared secret and the mode-dependent inputs, producing a
/// live encryption context for the given role. The shared secret and the intermediate `secret`
/// PRK move into the context; every other temporary is dropped (and zeroed) here.
pub(crate) fn key_schedule(
    suite: CipherSuite,
    role: Role,
    mode: Mode,
    shared_secret: SharedSecret,
    enc: Vec<u8>,
    info: &[u8],
    psk: &[u8],
    psk_id: &[u8],
) -> Result<EncryptionContext, HpkeError> {
    verify_psk_inputs(mode, psk, psk_id)?;

    let kdf = suite.kdf;
    let suite_id = &suite.suite_id;

    let psk_id_hash = labeled_extract(kdf, suite_id, b"", b"psk_id_hash", psk_id);
    let info_hash = labeled_extract(kdf, suite_id, b"", b"info_hash", info);

    // key_schedule_context = mode || psk_id_hash || info_hash
    let key_schedule_context = {
        let mut buf = Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len());
        buf.push(mode as u8);
        buf.extend_from_slice(&psk_id_hash);
        buf.extend_from_slice(&info_hash);
        buf
    };

    let secret = labeled_extract(kdf, suite_id, &shared_secret, b"secret", psk);

    // An export-only AEAD has no key or nonce to derive
    let (key, base_nonce) = if suite.is_export_only() {
        (Zeroizing::new(Vec::new()), Zeroizing::new(Vec::new()))
    } else {
        let key = labeled_expand(
            kdf,
            suite_id,
            &secret,
            b"key",
            &key_schedule_context,
            suite.aead.nk(),
        )?;
        let base_nonce = labeled_expand(
            kdf,
            suite_id,
            &secret,
            b"base_nonce",
            &key_schedule_context,
            suite.aead.nn(),
        )?;
        (Zeroizing::new(key), Zeroizing::new(base_nonce))
    };

    let exporter_secret = Zeroizing::new(labeled_expand(
        kdf,
        suite_id,
        &secret,
        b"exp",
        &key_schedule_context,
        kdf.nh(),
    )?);

    Ok(EncryptionContext {
        suite,
        role,
        key,
        base_nonce,
        exporter_secret,
        seq: 0,
        setup_params: SetupParams {
            psk_id_hash: psk_id_hash.to_vec(),
            info_hash: info_hash.to_vec(),
            shared_secret,
            enc,
        },
        context_params: ContextParams {
            key_schedule_context,
            secret,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::verify_psk_inputs;
    use crate::{suite::Mode, HpkeError};

    /// Tests every cell of the mode × psk-presence matrix
    #[test]
    fn test_verify_psk_inputs() {
        let psk = [0u8; 32];
        let psk_id = b"preshared key attempt #5, take 2";

        // Non-PSK modes must have neither input; PSK modes must have both
        for mode in [Mode::Base, Mode::Auth] {
            assert!(verify_psk_inputs(mode, b"", b"").is_ok());
            assert_eq!(
                verify_psk_inputs(mode, &psk, psk_id).unwrap_err(),
                HpkeError::InconsistentPsk
            );
        }
        for mode in [Mode::Psk, Mode::AuthPsk] {
            assert!(verify_psk_inputs(mode, &psk, psk_id).is_ok());
            assert_eq!(
                verify_psk_inputs(mode, b"", b"").unwrap_err(),
                HpkeError::InconsistentPsk
            );
        }

        // A PSK without an ID (and vice versa) is inconsistent in every mode
        for mode in [Mode::Base, Mode::Psk, Mode::Auth, Mode::AuthPsk] {
            assert_eq!(
                verify_psk_inputs(mode, &psk, b"").unwrap_err(),
                HpkeError::InconsistentPsk
            );
            assert_eq!(
                verify_psk_inputs(mode, b"", psk_id).unwrap_err(),
                HpkeError::InconsistentPsk
            );
        }
    }
}
