use bytes::{Buf, BufMut};
use tracing::warn;

use crate::domain::error::DomainError;

/// A 64-bit varint never spans more than ten 7-bit groups.
pub const MAX_VARINT_GROUPS: usize = 10;

/// Reads `end - start` bytes of `buf` as a big-endian unsigned integer.
///
/// Widths 1, 2, 4 and 8 are the ones the protocol uses. Other widths up to 8
/// are folded big-endian as well but are logged, since nothing in the formats
/// we read should produce them.
pub fn read_uint(buf: &[u8], start: usize, end: usize) -> Result<u64, DomainError> {
    if end <= start || end - start > 8 {
        return Err(DomainError::UnsupportedFeature(format!(
            "integer width {} bytes",
            end.saturating_sub(start)
        )));
    }
    if end > buf.len() {
        return Err(DomainError::InsufficientData {
            needed: end - start,
            remaining: buf.len().saturating_sub(start),
        });
    }

    let mut bytes = &buf[start..end];
    let value = match bytes.len() {
        1 => u64::from(bytes.get_u8()),
        2 => u64::from(bytes.get_u16()),
        4 => u64::from(bytes.get_u32()),
        8 => bytes.get_u64(),
        width => {
            warn!(width, "reading integer with non-standard width");
            bytes.get_uint(width)
        }
    };
    Ok(value)
}

/// Inverse of [`read_uint`]: `value` truncated to `width` big-endian bytes.
pub fn write_uint(value: u64, width: usize) -> Result<Vec<u8>, DomainError> {
    if width == 0 || width > 8 {
        return Err(DomainError::UnsupportedFeature(format!(
            "integer width {} bytes",
            width
        )));
    }
    let mut out = Vec::with_capacity(width);
    out.put_uint(value, width);
    Ok(out)
}

pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode(raw: u64) -> i64 {
    ((raw >> 1) as i64) ^ -((raw & 1) as i64)
}

/// Decodes a base-128 varint (little-endian groups, high bit = continuation).
/// Returns the raw value and the number of bytes consumed.
pub fn read_unsigned_varint(buf: &[u8]) -> Result<(u64, usize), DomainError> {
    let mut value = 0u64;
    for (i, &byte) in buf.iter().take(MAX_VARINT_GROUPS).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DomainError::TruncatedVarint)
}

/// Decodes a zigzag-encoded signed varint.
pub fn read_varint(buf: &[u8]) -> Result<(i64, usize), DomainError> {
    let (raw, consumed) = read_unsigned_varint(buf)?;
    Ok((zigzag_decode(raw), consumed))
}

/// Actual element count for a stored compact length. A stored 0 (null) is an
/// empty sequence, never -1.
pub fn compact_len(stored: u64) -> usize {
    stored.saturating_sub(1) as usize
}

pub trait PutVarint {
    fn put_unsigned_varint(&mut self, num: u64);
    fn put_varint(&mut self, num: i64);
    fn put_compact_len(&mut self, len: usize);
}

impl<B: BufMut> PutVarint for B {
    fn put_unsigned_varint(&mut self, mut num: u64) {
        while (num & !0x7F) != 0 {
            self.put_u8(((num & 0x7F) | 0x80) as u8);
            num >>= 7;
        }
        self.put_u8(num as u8);
    }

    fn put_varint(&mut self, num: i64) {
        self.put_unsigned_varint(zigzag_encode(num));
    }

    fn put_compact_len(&mut self, len: usize) {
        self.put_unsigned_varint(len as u64 + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uint_standard_widths() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_uint(&buf, 0, 1).unwrap(), 0x01);
        assert_eq!(read_uint(&buf, 0, 2).unwrap(), 0x0102);
        assert_eq!(read_uint(&buf, 4, 8).unwrap(), 0x05060708);
        assert_eq!(read_uint(&buf, 0, 8).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_read_uint_odd_width_is_big_endian() {
        let buf = [0x01, 0x02, 0x03];
        assert_eq!(read_uint(&buf, 0, 3).unwrap(), 0x010203);
    }

    #[test]
    fn test_read_uint_rejects_bad_ranges() {
        let buf = [0u8; 4];
        assert!(matches!(
            read_uint(&buf, 2, 6),
            Err(DomainError::InsufficientData { needed: 4, remaining: 2 })
        ));
        assert!(matches!(
            read_uint(&buf, 0, 0),
            Err(DomainError::UnsupportedFeature(_))
        ));
        assert!(matches!(
            read_uint(&[0u8; 16], 0, 9),
            Err(DomainError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_write_uint() {
        assert_eq!(write_uint(7, 4).unwrap(), vec![0, 0, 0, 7]);
        assert_eq!(write_uint(0x4b, 2).unwrap(), vec![0x00, 0x4b]);
        assert_eq!(write_uint(0x1ff, 1).unwrap(), vec![0xff]);
        assert!(write_uint(1, 9).is_err());
    }

    #[test]
    fn test_read_varint_zigzag() {
        // 0x3c -> 60 -> 30
        assert_eq!(read_varint(&[0x3c]).unwrap(), (30, 1));
        // 0x01 -> -1 (no key)
        assert_eq!(read_varint(&[0x01]).unwrap(), (-1, 1));
        // 0x90 0x01 -> 144 -> 72
        assert_eq!(read_varint(&[0x90, 0x01, 0xff]).unwrap(), (72, 2));
        // 0x82 0x01 -> 130 -> 65
        assert_eq!(read_varint(&[0x82, 0x01]).unwrap(), (65, 2));
    }

    #[test]
    fn test_read_varint_truncated() {
        assert_eq!(read_varint(&[]), Err(DomainError::TruncatedVarint));
        assert_eq!(read_varint(&[0x80, 0x80]), Err(DomainError::TruncatedVarint));
        assert_eq!(read_varint(&[0xff; 11]), Err(DomainError::TruncatedVarint));
    }

    #[test]
    fn test_put_varint_matches_reader() {
        let mut buf = Vec::new();
        buf.put_varint(-1);
        buf.put_varint(72);
        buf.put_unsigned_varint(300);
        assert_eq!(buf, vec![0x01, 0x90, 0x01, 0xac, 0x02]);
    }

    #[test]
    fn test_compact_len() {
        assert_eq!(compact_len(0), 0);
        assert_eq!(compact_len(1), 0);
        assert_eq!(compact_len(4), 3);

        let mut buf = Vec::new();
        buf.put_compact_len(3);
        assert_eq!(buf, vec![4]);
    }
}
