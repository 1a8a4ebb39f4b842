use crate::HpkeError;

use alloc::vec::Vec;

use byteorder::{BigEndian, ByteOrder};

/// Represents a KEM-local ciphersuite context. That's "KEMXX", where `XX` is the KEM ID
pub(crate) type KemSuiteId = [u8; 5];

/// Represents a full ciphersuite context. That's "HPKEXXYYZZ", where `XX` is the KEM ID, `YY` is
/// the KDF ID, and `ZZ` is the AEAD ID
pub(crate) type FullSuiteId = [u8; 10];

// RFC 9180 §5.1
// suite_id = concat(
//   "HPKE",
//   I2OSP(kem_id, 2),
//   I2OSP(kdf_id, 2),
//   I2OSP(aead_id, 2)
// )

/// Constructs the `suite_id` used as binding context in all functions in `key_schedule` and
/// `context`
pub(crate) fn full_suite_id(kem_id: u16, kdf_id: u16, aead_id: u16) -> FullSuiteId {
    // XX is the KEM ID, YY is the KDF ID, ZZ is the AEAD ID
    let mut suite_id = *b"HPKEXXYYZZ";

    BigEndian::write_u16(&mut suite_id[4..6], kem_id);
    BigEndian::write_u16(&mut suite_id[6..8], kdf_id);
    BigEndian::write_u16(&mut suite_id[8..10], aead_id);

    suite_id
}

// RFC 9180 §4.1
// suite_id = concat("KEM", I2OSP(kem_id, 2))

/// Constructs the `suite_id` used as binding context in all functions in `kem`
pub(crate) fn kem_suite_id(kem_id: u16) -> KemSuiteId {
    // XX is the KEM ID
    let mut suite_id = *b"KEMXX";

    BigEndian::write_u16(&mut suite_id[3..5], kem_id);

    suite_id
}

/// Appends a big-endian `u16` to the buffer
pub(crate) fn write_u16(buf: &mut Vec<u8>, val: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, val);
    buf.extend_from_slice(&bytes);
}

/// Appends a big-endian `u64` to the buffer
pub(crate) fn write_u64(buf: &mut Vec<u8>, val: u64) {
    let mut bytes = [0u8; 8];
    BigEndian::write_u64(&mut bytes, val);
    buf.extend_from_slice(&bytes);
}

/// Appends a length-prefixed bytestring to the buffer. The prefix is a big-endian `u16`, which is
/// plenty for every field we serialize (hashes, keys, and encapped keys are all well under 64KiB).
pub(crate) fn write_lp(buf: &mut Vec<u8>, bytes: &[u8]) {
    debug_assert!(bytes.len() <= usize::from(u16::MAX));
    write_u16(buf, bytes.len() as u16);
    buf.extend_from_slice(bytes);
}

/// A cursor over a serialized context. Every read checks the remaining length, so a truncated
/// input surfaces as `MalformedSerialization` rather than a panic.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> ByteReader<'a> {
        ByteReader { bytes }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], HpkeError> {
        if self.bytes.len() < n {
            return Err(HpkeError::MalformedSerialization);
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, HpkeError> {
        self.take(1).map(|b| b[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, HpkeError> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, HpkeError> {
        self.take(8).map(BigEndian::read_u64)
    }

    /// Reads a length-prefixed bytestring written by `write_lp`
    pub(crate) fn read_lp(&mut self) -> Result<Vec<u8>, HpkeError> {
        let len = self.read_u16()?;
        self.take(usize::from(len)).map(Vec::from)
    }

    /// Asserts that the input was consumed exactly
    pub(crate) fn finish(self) -> Result<(), HpkeError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(HpkeError::MalformedSerialization)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{full_suite_id, kem_suite_id, write_lp, ByteReader};

    use alloc::vec::Vec;

    #[test]
    fn test_suite_id_encoding() {
        assert_eq!(&full_suite_id(0x0020, 0x0001, 0x0003), b"HPKE\x00\x20\x00\x01\x00\x03");
        assert_eq!(&kem_suite_id(0x0010), b"KEM\x00\x10");
    }

    /// Tests that truncated and over-long inputs are rejected by the reader
    #[test]
    fn test_byte_reader_bounds() {
        let mut buf = Vec::new();
        write_lp(&mut buf, b"hello");

        // A clean read consumes everything
        let mut reader = ByteReader::new(&buf);
        assert_eq!(reader.read_lp().unwrap(), b"hello");
        reader.finish().unwrap();

        // Truncating the payload makes read_lp fail
        let mut reader = ByteReader::new(&buf[..buf.len() - 1]);
        assert!(reader.read_lp().is_err());

        // Trailing garbage makes finish fail
        buf.push(0x00);
        let mut reader = ByteReader::new(&buf);
        reader.read_lp().unwrap();
        assert!(reader.finish().is_err());
    }
}
