use crate::HpkeError;

use alloc::vec::Vec;

use byteorder::{BigEndian, ByteOrder};
use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

// RFC 9180 §4: the version label that domain-separates HPKE from everything else that uses HKDF
const VERSION_LABEL: &[u8] = b"HPKE-v1";

/// Represents key derivation functionality. The trait is object-safe: a ciphersuite holds a
/// `&'static dyn Kdf` and dispatches at runtime.
pub trait Kdf: Send + Sync {
    /// The algorithm identifier for this KDF
    fn id(&self) -> u16;

    /// The output size of the underlying hash function, called `Nh` in the RFC
    fn nh(&self) -> usize;

    /// HKDF-Extract. Returns a pseudorandom key of `Nh` bytes.
    fn extract(&self, salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>>;

    /// HKDF-Expand. Fails with `InvalidKdfLength` if `out_len > 255·Nh`.
    fn expand(&self, prk: &[u8], info: &[u8], out_len: usize) -> Result<Vec<u8>, HpkeError>;
}

// Implements a Kdf for HKDF over the given hash function
macro_rules! impl_hkdf {
    ($kdf_name:ident, $hash:ty, $kdf_id:literal, $nh:literal, $doc_str:expr) => {
        #[doc = $doc_str]
        pub struct $kdf_name;

        impl $kdf_name {
            // RFC 9180 §7.2
            /// The algorithm identifier for this KDF
            pub const KDF_ID: u16 = $kdf_id;
        }

        impl Kdf for $kdf_name {
            fn id(&self) -> u16 {
                Self::KDF_ID
            }

            fn nh(&self) -> usize {
                $nh
            }

            fn extract(&self, salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
                let (prk, _) = Hkdf::<$hash>::extract(Some(salt), ikm);
                Zeroizing::new(prk.to_vec())
            }

            fn expand(
                &self,
                prk: &[u8],
                info: &[u8],
                out_len: usize,
            ) -> Result<Vec<u8>, HpkeError> {
                // from_prk only fails if the PRK is shorter than Nh. Everything we feed it is an
                // Nh-byte Extract output or a validated exporter secret.
                let hkdf =
                    Hkdf::<$hash>::from_prk(prk).map_err(|_| HpkeError::InvalidKdfLength)?;
                let mut okm = vec![0u8; out_len];
                hkdf.expand(info, &mut okm)
                    .map_err(|_| HpkeError::InvalidKdfLength)?;
                Ok(okm)
            }
        }
    };
}

impl_hkdf!(HkdfSha256, Sha256, 0x0001, 32, "The implementation of HKDF-SHA256");
impl_hkdf!(HkdfSha384, Sha384, 0x0002, 48, "The implementation of HKDF-SHA384");
impl_hkdf!(HkdfSha512, Sha512, 0x0003, 64, "The implementation of HKDF-SHA512");

// def LabeledExtract(salt, label, ikm):
//   labeled_ikm = concat("HPKE-v1", suite_id, label, ikm)
//   return Extract(salt, labeled_ikm)
/// Runs `Extract` over the domain-separated transcript `"HPKE-v1" || suite_id || label || ikm`
pub(crate) fn labeled_extract(
    kdf: &dyn Kdf,
    suite_id: &[u8],
    salt: &[u8],
    label: &[u8],
    ikm: &[u8],
) -> Zeroizing<Vec<u8>> {
    // The concatenation carries the IKM, which may be secret
    let labeled_ikm = Zeroizing::new([VERSION_LABEL, suite_id, label, ikm].concat());
    kdf.extract(salt, &labeled_ikm)
}

// def LabeledExpand(prk, label, info, L):
//   labeled_info = concat(I2OSP(L, 2), "HPKE-v1", suite_id, label, info)
//   return Expand(prk, labeled_info, L)
/// Runs `Expand` with the domain-separated info string
/// `I2OSP(L, 2) || "HPKE-v1" || suite_id || label || info`
pub(crate) fn labeled_expand(
    kdf: &dyn Kdf,
    suite_id: &[u8],
    prk: &[u8],
    label: &[u8],
    info: &[u8],
    out_len: usize,
) -> Result<Vec<u8>, HpkeError> {
    // The length is encoded as a u16, so that's the hard ceiling. The 255·Nh HKDF bound is
    // enforced by expand() itself.
    if out_len > usize::from(u16::MAX) {
        return Err(HpkeError::InvalidKdfLength);
    }
    let mut len_buf = [0u8; 2];
    BigEndian::write_u16(&mut len_buf, out_len as u16);

    let labeled_info = [&len_buf, VERSION_LABEL, suite_id, label, info].concat();
    kdf.expand(prk, &labeled_info, out_len)
}

// def ExtractAndExpand(dh, kem_context):
//   eae_prk = LabeledExtract("", "eae_prk", dh)
//   shared_secret = LabeledExpand(eae_prk, "shared_secret", kem_context, Nsecret)
//   return shared_secret
/// Derives a KEM shared secret from a raw DH result and the KEM context transcript
pub(crate) fn extract_and_expand(
    kdf: &dyn Kdf,
    suite_id: &[u8],
    dh: &[u8],
    kem_context: &[u8],
    n_secret: usize,
) -> Result<Zeroizing<Vec<u8>>, HpkeError> {
    let eae_prk = labeled_extract(kdf, suite_id, b"", b"eae_prk", dh);
    labeled_expand(kdf, suite_id, &eae_prk, b"shared_secret", kem_context, n_secret)
        .map(Zeroizing::new)
}
