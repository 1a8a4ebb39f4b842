use crate::{
    aead::{Aead, AesGcm128, AesGcm256, ChaCha20Poly1305, ExportOnlyAead},
    kdf::{HkdfSha256, HkdfSha384, HkdfSha512, Kdf},
    kem::Kem,
    util::{full_suite_id, FullSuiteId},
    HpkeError,
};

/// The operation mode of HPKE. This determines what authentication inputs are folded into the
/// key schedule: a preshared key, the identity key of the sender, both, or neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    /// No extra information included
    Base = 0x00,
    /// A preshared key known to the sender and receiver
    Psk = 0x01,
    /// The identity key of the sender
    Auth = 0x02,
    /// Both of the above
    AuthPsk = 0x03,
}

impl Mode {
    pub(crate) fn from_u8(val: u8) -> Result<Mode, HpkeError> {
        match val {
            0x00 => Ok(Mode::Base),
            0x01 => Ok(Mode::Psk),
            0x02 => Ok(Mode::Auth),
            0x03 => Ok(Mode::AuthPsk),
            _ => Err(HpkeError::MalformedSerialization),
        }
    }
}

/// An assembled `(KEM, KDF, AEAD)` triple. This is the object every setup and context operation
/// dispatches through. It is `Copy` (three `&'static` handles plus the precomputed `suite_id`
/// domain separator) and freely shareable.
#[derive(Clone, Copy)]
pub struct CipherSuite {
    pub(crate) kem: &'static dyn Kem,
    pub(crate) kdf: &'static dyn Kdf,
    pub(crate) aead: &'static dyn Aead,
    pub(crate) suite_id: FullSuiteId,
}

impl CipherSuite {
    /// Assembles a ciphersuite from its three wire identifiers
    ///
    /// Return Value
    /// ============
    /// Returns `Err(HpkeError::UnknownSuite)` if any identifier is not in the registry.
    pub fn new(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<CipherSuite, HpkeError> {
        let kem = kem_from_id(kem_id).ok_or(HpkeError::UnknownSuite)?;
        let kdf = kdf_from_id(kdf_id).ok_or(HpkeError::UnknownSuite)?;
        let aead = aead_from_id(aead_id).ok_or(HpkeError::UnknownSuite)?;

        Ok(CipherSuite {
            kem,
            kdf,
            aead,
            suite_id: full_suite_id(kem_id, kdf_id, aead_id),
        })
    }

    /// The KEM of this suite
    pub fn kem(&self) -> &'static dyn Kem {
        self.kem
    }

    /// The KDF of this suite
    pub fn kdf(&self) -> &'static dyn Kdf {
        self.kdf
    }

    /// The AEAD of this suite
    pub fn aead(&self) -> &'static dyn Aead {
        self.aead
    }

    /// The KEM algorithm identifier
    pub fn kem_id(&self) -> u16 {
        self.kem.id()
    }

    /// The KDF algorithm identifier
    pub fn kdf_id(&self) -> u16 {
        self.kdf.id()
    }

    /// The AEAD algorithm identifier
    pub fn aead_id(&self) -> u16 {
        self.aead.id()
    }

    /// Whether this suite's AEAD is the export-only sentinel, i.e., whether `seal`/`open` are
    /// unavailable on its contexts
    pub fn is_export_only(&self) -> bool {
        self.aead.id() == ExportOnlyAead::AEAD_ID
    }
}

impl PartialEq for CipherSuite {
    fn eq(&self, other: &CipherSuite) -> bool {
        self.suite_id == other.suite_id
    }
}

impl Eq for CipherSuite {}

impl core::fmt::Debug for CipherSuite {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "CipherSuite(kem={:#06x}, kdf={:#06x}, aead={:#06x})",
            self.kem_id(),
            self.kdf_id(),
            self.aead_id()
        )
    }
}

// The registry. Each table maps a wire identifier to the static instance of the algorithm. The
// instances are zero-sized, so the tables are vtables and nothing more.

fn kem_from_id(kem_id: u16) -> Option<&'static dyn Kem> {
    match kem_id {
        #[cfg(feature = "p256")]
        crate::kem::DhP256HkdfSha256::KEM_ID => Some(&crate::kem::DhP256HkdfSha256),
        #[cfg(feature = "p384")]
        crate::kem::DhP384HkdfSha384::KEM_ID => Some(&crate::kem::DhP384HkdfSha384),
        #[cfg(feature = "x25519")]
        crate::kem::X25519HkdfSha256::KEM_ID => Some(&crate::kem::X25519HkdfSha256),
        _ => None,
    }
}

fn kdf_from_id(kdf_id: u16) -> Option<&'static dyn Kdf> {
    match kdf_id {
        HkdfSha256::KDF_ID => Some(&HkdfSha256),
        HkdfSha384::KDF_ID => Some(&HkdfSha384),
        HkdfSha512::KDF_ID => Some(&HkdfSha512),
        _ => None,
    }
}

fn aead_from_id(aead_id: u16) -> Option<&'static dyn Aead> {
    match aead_id {
        AesGcm128::AEAD_ID => Some(&AesGcm128),
        AesGcm256::AEAD_ID => Some(&AesGcm256),
        ChaCha20Poly1305::AEAD_ID => Some(&ChaCha20Poly1305),
        ExportOnlyAead::AEAD_ID => Some(&ExportOnlyAead),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{CipherSuite, Mode};
    use crate::{
        aead::{AesGcm128, ChaCha20Poly1305, ExportOnlyAead},
        kdf::HkdfSha256,
        HpkeError,
    };

    /// Tests that every registered triple assembles and that the suite_id is well-formed
    #[cfg(feature = "x25519")]
    #[test]
    fn test_assemble_known_suite() {
        use crate::kem::X25519HkdfSha256;

        let suite = CipherSuite::new(
            X25519HkdfSha256::KEM_ID,
            HkdfSha256::KDF_ID,
            ChaCha20Poly1305::AEAD_ID,
        )
        .unwrap();

        assert_eq!(suite.kem_id(), 0x0020);
        assert_eq!(suite.kdf_id(), 0x0001);
        assert_eq!(suite.aead_id(), 0x0003);
        assert_eq!(&suite.suite_id, b"HPKE\x00\x20\x00\x01\x00\x03");
        assert!(!suite.is_export_only());

        let export_only = CipherSuite::new(
            X25519HkdfSha256::KEM_ID,
            HkdfSha256::KDF_ID,
            ExportOnlyAead::AEAD_ID,
        )
        .unwrap();
        assert!(export_only.is_export_only());
    }

    /// Tests that unknown identifiers are rejected in every position
    #[test]
    fn test_assemble_unknown_suite() {
        // X448 and P-521 are real IANA codepoints, but not in the registry
        for kem_id in [0x0000u16, 0x0012, 0x0021, 0xBEEF] {
            assert_eq!(
                CipherSuite::new(kem_id, HkdfSha256::KDF_ID, AesGcm128::AEAD_ID).unwrap_err(),
                HpkeError::UnknownSuite
            );
        }
        assert_eq!(
            CipherSuite::new(0x0020, 0x0004, AesGcm128::AEAD_ID).unwrap_err(),
            HpkeError::UnknownSuite
        );
        assert_eq!(
            CipherSuite::new(0x0020, HkdfSha256::KDF_ID, 0x0004).unwrap_err(),
            HpkeError::UnknownSuite
        );
    }

    #[test]
    fn test_mode_round_trip() {
        for mode in [Mode::Base, Mode::Psk, Mode::Auth, Mode::AuthPsk] {
            assert_eq!(Mode::from_u8(mode as u8).unwrap(), mode);
        }
        assert!(Mode::from_u8(0x04).is_err());
    }
}
