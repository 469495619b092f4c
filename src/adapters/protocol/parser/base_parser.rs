use bytes::{Buf, Bytes};
use uuid::Uuid;

use super::traits::*;
use super::varint::{compact_len, read_unsigned_varint, zigzag_decode};
use crate::domain::error::DomainError;

/// 기본 파서 구현을 제공하는 구조체
#[derive(Debug, Default, Clone)]
pub struct BaseParser;

impl ByteParser for BaseParser {}

impl PrimitiveParser for BaseParser {
    fn parse_i8(&self, buf: &mut Bytes) -> Result<i8, DomainError> {
        self.ensure_remaining(buf, 1)?;
        Ok(buf.get_i8())
    }

    fn parse_i16(&self, buf: &mut Bytes) -> Result<i16, DomainError> {
        self.ensure_remaining(buf, 2)?;
        Ok(buf.get_i16())
    }

    fn parse_i32(&self, buf: &mut Bytes) -> Result<i32, DomainError> {
        self.ensure_remaining(buf, 4)?;
        Ok(buf.get_i32())
    }

    fn parse_i64(&self, buf: &mut Bytes) -> Result<i64, DomainError> {
        self.ensure_remaining(buf, 8)?;
        Ok(buf.get_i64())
    }

    fn parse_u8(&self, buf: &mut Bytes) -> Result<u8, DomainError> {
        self.ensure_remaining(buf, 1)?;
        Ok(buf.get_u8())
    }

    fn parse_u32(&self, buf: &mut Bytes) -> Result<u32, DomainError> {
        self.ensure_remaining(buf, 4)?;
        Ok(buf.get_u32())
    }

    fn parse_uuid(&self, buf: &mut Bytes) -> Result<Uuid, DomainError> {
        self.ensure_remaining(buf, 16)?;
        let mut id = [0u8; 16];
        buf.copy_to_slice(&mut id);
        Ok(Uuid::from_bytes(id))
    }
}

impl CompactStringParser for BaseParser {
    fn parse_compact_string(&self, buf: &mut Bytes) -> Result<String, DomainError> {
        let len = self.parse_unsigned_varint(buf)?;
        let string_len = compact_len(len);

        self.ensure_remaining(buf, string_len)?;
        let bytes = buf.split_to(string_len);

        String::from_utf8(bytes.to_vec())
            .map_err(|e| DomainError::InvalidEncoding(format!("invalid UTF-8 sequence: {}", e)))
    }
}

impl CompactArrayParser for BaseParser {
    fn parse_compact_array<T, F>(&self, buf: &mut Bytes, parser: F) -> Result<Vec<T>, DomainError>
    where
        F: Fn(&mut Bytes) -> Result<T, DomainError>,
    {
        let len = self.parse_unsigned_varint(buf)?;
        let items_len = compact_len(len);

        // 버퍼에 실제로 담길 수 있는 만큼만 미리 할당
        let mut items = Vec::with_capacity(items_len.min(buf.remaining()));
        for _ in 0..items_len {
            items.push(parser(buf)?);
        }

        Ok(items)
    }
}

impl VarIntParser for BaseParser {
    fn parse_varint(&self, buf: &mut Bytes) -> Result<i64, DomainError> {
        self.parse_unsigned_varint(buf).map(zigzag_decode)
    }

    fn parse_unsigned_varint(&self, buf: &mut Bytes) -> Result<u64, DomainError> {
        let (value, consumed) = read_unsigned_varint(buf.chunk())?;
        buf.advance(consumed);
        Ok(value)
    }
}
