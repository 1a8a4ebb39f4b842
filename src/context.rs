use crate::{
    kdf::labeled_expand,
    key_schedule::{ContextParams, SetupParams},
    suite::CipherSuite,
    util::{write_lp, write_u16, write_u64, ByteReader},
    HpkeError,
};

use alloc::vec::Vec;

use zeroize::Zeroizing;

// A version prefix for the serialized context layout, bumped on any change to the format
const SERIALIZED_CONTEXT_VERSION: u8 = 0x01;

/// Which side of the exchange a context belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Role {
    Sender = 0x00,
    Receiver = 0x01,
}

impl Role {
    fn from_u8(val: u8) -> Result<Role, HpkeError> {
        match val {
            0x00 => Ok(Role::Sender),
            0x01 => Ok(Role::Receiver),
            _ => Err(HpkeError::MalformedSerialization),
        }
    }
}

/// The state shared by both context types: the key schedule outputs, the sequence counter, and
/// the retained schedule inputs. A context is a single-writer object; every mutating operation
/// takes `&mut self`, so concurrent use of one context is rejected at compile time.
pub(crate) struct EncryptionContext {
    pub(crate) suite: CipherSuite,
    pub(crate) role: Role,
    pub(crate) key: Zeroizing<Vec<u8>>,
    pub(crate) base_nonce: Zeroizing<Vec<u8>>,
    pub(crate) exporter_secret: Zeroizing<Vec<u8>>,
    pub(crate) seq: u64,
    pub(crate) setup_params: SetupParams,
    pub(crate) context_params: ContextParams,
}

impl EncryptionContext {
    // def Context<ROLE>.ComputeNonce(seq):
    //   seq_bytes = I2OSP(seq, Nn)
    //   return xor(self.base_nonce, seq_bytes)
    /// XORs the big-endian sequence number into the low-order bytes of the base nonce
    fn compute_nonce(&self) -> Vec<u8> {
        let mut nonce = self.base_nonce.to_vec();
        for (nonce_byte, seq_byte) in nonce.iter_mut().rev().zip(self.seq.to_be_bytes().iter().rev())
        {
            *nonce_byte ^= seq_byte;
        }
        nonce
    }

    /// The largest usable `seq` value, i.e., `2^(8·Nn) - 2`. Anything at or past
    /// `2^(8·Nn) - 1` is out of range. Capped at `u64::MAX` so the 12-byte nonces of the
    /// registered AEADs never overflow the counter itself.
    fn message_limit(&self) -> u64 {
        let nonce_bits = 8 * self.suite.aead.nn() as u32;
        match 1u64.checked_shl(nonce_bits) {
            Some(bound) => bound - 1,
            None => u64::MAX,
        }
    }

    // def Context.Seal(aad, pt):
    //   ct = Seal(self.key, self.ComputeNonce(self.seq), aad, pt)
    //   self.IncrementSeq()
    //   return ct
    fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, HpkeError> {
        if self.suite.is_export_only() {
            return Err(HpkeError::OperationNotSupported);
        }
        if self.seq >= self.message_limit() {
            return Err(HpkeError::MessageLimitReached);
        }

        let nonce = self.compute_nonce();
        let ciphertext = self.suite.aead.seal(&self.key, &nonce, aad, plaintext)?;

        // Only advance the counter once the encryption has succeeded
        self.seq += 1;
        Ok(ciphertext)
    }

    // def Context.Open(aad, ct):
    //   pt = Open(self.key, self.ComputeNonce(self.seq), aad, ct)
    //   if pt == OpenError:
    //     raise OpenError
    //   self.IncrementSeq()
    //   return pt
    fn open(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, HpkeError> {
        if self.suite.is_export_only() {
            return Err(HpkeError::OperationNotSupported);
        }
        if self.seq >= self.message_limit() {
            return Err(HpkeError::MessageLimitReached);
        }

        let nonce = self.compute_nonce();
        // A failed open leaves seq untouched, so the caller can drop the packet and continue
        let plaintext = self.suite.aead.open(&self.key, &nonce, aad, ciphertext)?;

        self.seq += 1;
        Ok(plaintext)
    }

    // def Context.Export(exporter_context, L):
    //   return LabeledExpand(self.exporter_secret, "sec", exporter_context, L)
    /// Derives `out_len` bytes of keying material bound to `exporter_context`. Deterministic,
    /// independent of the AEAD state, and never touches `seq`.
    fn export(&self, exporter_context: &[u8], out_len: usize) -> Result<Vec<u8>, HpkeError> {
        labeled_expand(
            self.suite.kdf,
            &self.suite.suite_id,
            &self.exporter_secret,
            b"sec",
            exporter_context,
            out_len,
        )
    }

    /// Serializes every field a restored context needs to be indistinguishable from this one
    fn marshal(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(SERIALIZED_CONTEXT_VERSION);
        buf.push(self.role as u8);
        write_u16(&mut buf, self.suite.kem_id());
        write_u16(&mut buf, self.suite.kdf_id());
        write_u16(&mut buf, self.suite.aead_id());
        write_lp(&mut buf, &self.exporter_secret);
        write_lp(&mut buf, &self.key);
        write_lp(&mut buf, &self.base_nonce);
        write_u64(&mut buf, self.seq);
        write_lp(&mut buf, &self.setup_params.psk_id_hash);
        write_lp(&mut buf, &self.setup_params.info_hash);
        write_lp(&mut buf, &self.setup_params.shared_secret);
        write_lp(&mut buf, &self.setup_params.enc);
        write_lp(&mut buf, &self.context_params.key_schedule_context);
        write_lp(&mut buf, &self.context_params.secret);
        buf
    }

    /// The inverse of `marshal`. Checks that the embedded role matches `expected_role` and that
    /// every field has the length its suite says it should.
    fn unmarshal(bytes: &[u8], expected_role: Role) -> Result<EncryptionContext, HpkeError> {
        let mut reader = ByteReader::new(bytes);

        if reader.read_u8()? != SERIALIZED_CONTEXT_VERSION {
            return Err(HpkeError::MalformedSerialization);
        }
        let role = Role::from_u8(reader.read_u8()?)?;
        if role != expected_role {
            return Err(HpkeError::MalformedSerialization);
        }

        let kem_id = reader.read_u16()?;
        let kdf_id = reader.read_u16()?;
        let aead_id = reader.read_u16()?;
        let suite = CipherSuite::new(kem_id, kdf_id, aead_id)?;

        let exporter_secret = Zeroizing::new(reader.read_lp()?);
        let key = Zeroizing::new(reader.read_lp()?);
        let base_nonce = Zeroizing::new(reader.read_lp()?);
        let seq = reader.read_u64()?;
        let psk_id_hash = reader.read_lp()?;
        let info_hash = reader.read_lp()?;
        let shared_secret = Zeroizing::new(reader.read_lp()?);
        let enc = reader.read_lp()?;
        let key_schedule_context = reader.read_lp()?;
        let secret = Zeroizing::new(reader.read_lp()?);
        reader.finish()?;

        // The schedule outputs must be consistent with the suite they claim to come from
        let nh = suite.kdf.nh();
        let (expected_nk, expected_nn) = if suite.is_export_only() {
            (0, 0)
        } else {
            (suite.aead.nk(), suite.aead.nn())
        };
        if exporter_secret.len() != nh
            || key.len() != expected_nk
            || base_nonce.len() != expected_nn
        {
            return Err(HpkeError::MalformedSerialization);
        }

        Ok(EncryptionContext {
            suite,
            role,
            key,
            base_nonce,
            exporter_secret,
            seq,
            setup_params: SetupParams {
                psk_id_hash,
                info_hash,
                shared_secret,
                enc,
            },
            context_params: ContextParams {
                key_schedule_context,
                secret,
            },
        })
    }
}

/// The sender side of an HPKE exchange, produced by the `setup_*_s` functions. Encrypts messages
/// in strict sequence: the `n`-th `seal` pairs with the `n`-th `open` on the matching receiver.
pub struct SenderContext {
    pub(crate) context: EncryptionContext,
}

impl SenderContext {
    pub(crate) fn new(context: EncryptionContext) -> SenderContext {
        SenderContext { context }
    }

    /// Encrypts `plaintext` with associated data `aad`, returning the ciphertext (with
    /// appended tag) and advancing the sequence counter
    ///
    /// Return Value
    /// ============
    /// Returns `Err(HpkeError::MessageLimitReached)` (without advancing) once the nonce space is
    /// exhausted, and `Err(HpkeError::OperationNotSupported)` on an export-only context.
    pub fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.context.seal(aad, plaintext)
    }

    /// Derives `out_len` bytes of keying material bound to `exporter_context`. Repeat calls with
    /// the same inputs return the same bytes; `seal` state is unaffected.
    pub fn export(&self, exporter_context: &[u8], out_len: usize) -> Result<Vec<u8>, HpkeError> {
        self.context.export(exporter_context, out_len)
    }

    /// Serializes this context so that encryption can resume in another process. The output
    /// contains the symmetric key material and must be protected accordingly.
    pub fn marshal(&self) -> Vec<u8> {
        self.context.marshal()
    }

    /// The sequence number of the next message to be sealed
    pub fn seq(&self) -> u64 {
        self.context.seq
    }
}

/// The receiver side of an HPKE exchange, produced by the `setup_*_r` functions
pub struct ReceiverContext {
    pub(crate) context: EncryptionContext,
}

impl ReceiverContext {
    pub(crate) fn new(context: EncryptionContext) -> ReceiverContext {
        ReceiverContext { context }
    }

    /// Decrypts `ciphertext` with associated data `aad`, advancing the sequence counter on
    /// success
    ///
    /// Return Value
    /// ============
    /// Returns `Err(HpkeError::AuthenticationFailure)` if the tag does not verify; the counter
    /// does not advance, so the caller may discard the packet and continue. The limit and
    /// export-only failures are as in [`SenderContext::seal`].
    pub fn open(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, HpkeError> {
        self.context.open(aad, ciphertext)
    }

    /// Derives `out_len` bytes of keying material bound to `exporter_context`. Repeat calls with
    /// the same inputs return the same bytes; `open` state is unaffected.
    pub fn export(&self, exporter_context: &[u8], out_len: usize) -> Result<Vec<u8>, HpkeError> {
        self.context.export(exporter_context, out_len)
    }

    /// Serializes this context so that decryption can resume in another process. The output
    /// contains the symmetric key material and must be protected accordingly.
    pub fn marshal(&self) -> Vec<u8> {
        self.context.marshal()
    }

    /// The sequence number of the next message to be opened
    pub fn seq(&self) -> u64 {
        self.context.seq
    }
}

// Neither context type leaks key material through its Debug representation
impl core::fmt::Debug for SenderContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SenderContext({:?}, seq={})", self.context.suite, self.context.seq)
    }
}

impl core::fmt::Debug for ReceiverContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ReceiverContext({:?}, seq={})", self.context.suite, self.context.seq)
    }
}

/// Reconstructs a [`SenderContext`] from its `marshal` output. The restored context behaves
/// identically to the original, picking up at the serialized sequence number.
pub fn unmarshal_sender_context(bytes: &[u8]) -> Result<SenderContext, HpkeError> {
    EncryptionContext::unmarshal(bytes, Role::Sender).map(SenderContext::new)
}

/// Reconstructs a [`ReceiverContext`] from its `marshal` output
pub fn unmarshal_receiver_context(bytes: &[u8]) -> Result<ReceiverContext, HpkeError> {
    EncryptionContext::unmarshal(bytes, Role::Receiver).map(ReceiverContext::new)
}

// Inspection accessors for out-of-crate test harnesses that verify or generate test vectors.
// These mirror the fields a vector records beyond the wire outputs.
#[doc(hidden)]
impl SenderContext {
    pub fn key(&self) -> &[u8] {
        &self.context.key
    }
    pub fn base_nonce(&self) -> &[u8] {
        &self.context.base_nonce
    }
    pub fn exporter_secret(&self) -> &[u8] {
        &self.context.exporter_secret
    }
    pub fn shared_secret(&self) -> &[u8] {
        &self.context.setup_params.shared_secret
    }
    pub fn key_schedule_context(&self) -> &[u8] {
        &self.context.context_params.key_schedule_context
    }
    pub fn key_schedule_secret(&self) -> &[u8] {
        &self.context.context_params.secret
    }
    pub fn encapped_key(&self) -> &[u8] {
        &self.context.setup_params.enc
    }
}

#[doc(hidden)]
impl ReceiverContext {
    pub fn key(&self) -> &[u8] {
        &self.context.key
    }
    pub fn base_nonce(&self) -> &[u8] {
        &self.context.base_nonce
    }
    pub fn exporter_secret(&self) -> &[u8] {
        &self.context.exporter_secret
    }
    pub fn shared_secret(&self) -> &[u8] {
        &self.context.setup_params.shared_secret
    }
    pub fn key_schedule_context(&self) -> &[u8] {
        &self.context.context_params.key_schedule_context
    }
    pub fn key_schedule_secret(&self) -> &[u8] {
        &self.context.context_params.secret
    }
    pub fn encapped_key(&self) -> &[u8] {
        &self.context.setup_params.enc
    }
}
