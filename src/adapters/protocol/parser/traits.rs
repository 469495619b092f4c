use bytes::{Buf, Bytes};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// 바이트 스트림으로부터 데이터를 파싱하는 trait
pub trait ByteParser {
    /// 남은 바이트가 충분한지 확인
    fn ensure_remaining(&self, buf: &Bytes, required: usize) -> Result<(), DomainError> {
        if buf.remaining() < required {
            return Err(DomainError::InsufficientData {
                needed: required,
                remaining: buf.remaining(),
            });
        }
        Ok(())
    }

    fn skip(&self, buf: &mut Bytes, count: usize) -> Result<(), DomainError> {
        self.ensure_remaining(buf, count)?;
        buf.advance(count);
        Ok(())
    }
}

/// 기본 타입들의 파싱을 위한 trait
pub trait PrimitiveParser: ByteParser {
    fn parse_i8(&self, buf: &mut Bytes) -> Result<i8, DomainError>;
    fn parse_i16(&self, buf: &mut Bytes) -> Result<i16, DomainError>;
    fn parse_i32(&self, buf: &mut Bytes) -> Result<i32, DomainError>;
    fn parse_i64(&self, buf: &mut Bytes) -> Result<i64, DomainError>;
    fn parse_u8(&self, buf: &mut Bytes) -> Result<u8, DomainError>;
    fn parse_u32(&self, buf: &mut Bytes) -> Result<u32, DomainError>;
    fn parse_uuid(&self, buf: &mut Bytes) -> Result<Uuid, DomainError>;
}

/// 컴팩트 문자열 타입 파싱을 위한 trait
pub trait CompactStringParser: ByteParser {
    fn parse_compact_string(&self, buf: &mut Bytes) -> Result<String, DomainError>;
}

/// 컴팩트 배열 타입 파싱을 위한 trait
pub trait CompactArrayParser: ByteParser {
    fn parse_compact_array<T, F>(&self, buf: &mut Bytes, parser: F) -> Result<Vec<T>, DomainError>
    where
        F: Fn(&mut Bytes) -> Result<T, DomainError>;
}

/// 가변 정수 타입 파싱을 위한 trait
pub trait VarIntParser: ByteParser {
    /// 지그재그 인코딩된 부호 있는 가변 정수
    fn parse_varint(&self, buf: &mut Bytes) -> Result<i64, DomainError>;
    /// 부호 없는 가변 정수 (최대 10 그룹)
    fn parse_unsigned_varint(&self, buf: &mut Bytes) -> Result<u64, DomainError>;
}
