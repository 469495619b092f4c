use bytes::{Buf, Bytes};
use tracing::{debug, info, warn};

use crate::adapters::protocol::parser::BaseParser;
use crate::adapters::protocol::parser::{
    ByteParser, CompactArrayParser, CompactStringParser, PrimitiveParser, VarIntParser,
};
use crate::domain::error::DomainError;
use crate::domain::metadata::{
    ClusterMetadataLog, FeatureLevelValue, PartitionValue, Record, RecordBatch, RecordValue,
    TopicValue, ValueTypeHeader, FEATURE_LEVEL_RECORD_TYPE, PARTITION_RECORD_TYPE,
    TOPIC_RECORD_TYPE,
};

/// A log shorter than a base offset cannot hold a single batch.
pub const MIN_LOG_SIZE: usize = 8;

/// baseOffset (8) + batchLength (4); batchLength counts the bytes after these.
pub const BATCH_LENGTH_OFFSET: usize = 12;

/// Tracks the absolute position and collects recoverable diagnostics while a
/// log is being parsed.
struct ParseContext {
    total: usize,
    batch: usize,
    /// Absolute offset one past the current batch.
    batch_end: usize,
    diagnostics: Vec<DomainError>,
}

impl ParseContext {
    /// Absolute offset of `body`, a cursor bounded by the current batch.
    fn position(&self, body: &Bytes) -> usize {
        self.batch_end - body.remaining()
    }
}

#[derive(Debug, Default, Clone)]
pub struct KraftRecordParser {
    base: BaseParser,
}

impl KraftRecordParser {
    pub fn new() -> Self {
        Self {
            base: BaseParser,
        }
    }

    /// Parses a complete cluster metadata log file.
    ///
    /// Batches are read until the buffer is exhausted; the file has no batch
    /// count of its own.
    pub fn parse(&self, data: &[u8]) -> Result<ClusterMetadataLog, DomainError> {
        if data.len() < MIN_LOG_SIZE {
            return Err(DomainError::InsufficientData {
                needed: MIN_LOG_SIZE,
                remaining: data.len(),
            });
        }

        let mut src = Bytes::copy_from_slice(data);
        let mut ctx = ParseContext {
            total: data.len(),
            batch: 0,
            batch_end: 0,
            diagnostics: Vec::new(),
        };

        let mut batches = Vec::new();
        while src.has_remaining() {
            ctx.batch = batches.len();
            batches.push(self.parse_record_batch(&mut src, &mut ctx)?);
        }

        let log = ClusterMetadataLog {
            batches,
            diagnostics: ctx.diagnostics,
        };
        info!(
            batches = log.batches.len(),
            records = log.records().count(),
            diagnostics = log.diagnostics.len(),
            "parsed cluster metadata log"
        );
        Ok(log)
    }

    fn parse_record_batch(
        &self,
        src: &mut Bytes,
        ctx: &mut ParseContext,
    ) -> Result<RecordBatch, DomainError> {
        let start_position = ctx.total - src.remaining();
        let available = src.remaining();

        let base_offset = self.base.parse_i64(src)?;
        let batch_length = self.base.parse_i32(src)?;
        let body_len = usize::try_from(batch_length).map_err(|_| {
            DomainError::UnsupportedFeature(format!("negative batch length {}", batch_length))
        })?;
        if BATCH_LENGTH_OFFSET + body_len > available {
            return Err(DomainError::InsufficientData {
                needed: BATCH_LENGTH_OFFSET + body_len,
                remaining: available,
            });
        }

        // everything below reads from the declared batch only
        let mut body = src.split_to(body_len);
        ctx.batch_end = start_position + BATCH_LENGTH_OFFSET + body_len;

        let partition_leader_epoch = self.base.parse_i32(&mut body)?;
        let magic_byte = self.base.parse_i8(&mut body)?;
        let crc = self.base.parse_u32(&mut body)?;
        let attributes = self.base.parse_i16(&mut body)?;
        let last_offset_delta = self.base.parse_i32(&mut body)?;
        let base_timestamp = self.base.parse_i64(&mut body)?;
        let max_timestamp = self.base.parse_i64(&mut body)?;
        let producer_id = self.base.parse_i64(&mut body)?;
        let producer_epoch = self.base.parse_i16(&mut body)?;
        let base_sequence = self.base.parse_i32(&mut body)?;
        let records_count = self.base.parse_i32(&mut body)?.max(0) as usize;

        debug!(
            batch = ctx.batch,
            base_offset, batch_length, records_count, "parsing record batch"
        );

        let mut records = Vec::with_capacity(records_count.min(body.remaining()));
        for index in 0..records_count {
            records.push(self.parse_record(&mut body, ctx, index)?);
        }

        if body.has_remaining() {
            warn!(
                batch = ctx.batch,
                offset = start_position,
                trailing = body.remaining(),
                "batch length exceeds decoded records, skipping to declared end"
            );
        }

        Ok(RecordBatch {
            base_offset,
            partition_leader_epoch,
            magic_byte,
            crc,
            attributes,
            last_offset_delta,
            base_timestamp,
            max_timestamp,
            producer_id,
            producer_epoch,
            base_sequence,
            records,
        })
    }

    fn parse_record(
        &self,
        src: &mut Bytes,
        ctx: &mut ParseContext,
        index: usize,
    ) -> Result<Record, DomainError> {
        let record_start = src.clone();
        let start_position = ctx.position(src);

        let length = self.base.parse_varint(src)?;
        let length_size = record_start.remaining() - src.remaining();

        let attributes = self.base.parse_i8(src)?;
        let timestamp_delta = self.base.parse_varint(src)?;
        let _offset_delta = self.base.parse_varint(src)?;

        let key_size = self.base.parse_varint(src)?;
        let key = match usize::try_from(key_size) {
            Ok(len) => {
                self.base.ensure_remaining(src, len)?;
                Some(src.split_to(len))
            }
            Err(_) => None,
        };

        let value_length = self.base.parse_varint(src)?;
        let value = if value_length > 0 {
            let value_start = src.clone();
            let header = self.parse_value_header(src)?;
            let value = self.parse_record_value(src, header)?;

            if let RecordValue::Unrecognized { type_code } = value {
                // unknown payloads are skipped by their declared length
                let consumed = value_start.remaining() - src.remaining();
                let rest = (value_length as usize).saturating_sub(consumed);
                debug!(type_code, skipped = rest, "skipping unrecognized record value");
                self.base.skip(src, rest)?;
            }
            Some(value)
        } else {
            None
        };

        let headers_count = self.base.parse_u8(src)?;
        if headers_count != 0 {
            return Err(DomainError::UnsupportedFeature(format!(
                "record headers (count byte {:#04x}) in batch {}, record {}",
                headers_count, ctx.batch, index
            )));
        }

        let expected = length_size + usize::try_from(length).unwrap_or(0);
        let actual = record_start.remaining() - src.remaining();
        if actual != expected {
            let mismatch = DomainError::RecordBoundaryMismatch {
                batch: ctx.batch,
                record: index,
                expected: start_position + expected,
                actual: start_position + actual,
            };
            warn!(%mismatch, "realigning record cursor");
            ctx.diagnostics.push(mismatch);

            if expected > record_start.remaining() {
                return Err(DomainError::InsufficientData {
                    needed: expected,
                    remaining: record_start.remaining(),
                });
            }
            *src = record_start.slice(expected..);
        }

        Ok(Record {
            attributes,
            timestamp_delta,
            key_size,
            key,
            value_type: value.as_ref().map_or(0, RecordValue::value_type),
            value,
        })
    }

    fn parse_value_header(&self, src: &mut Bytes) -> Result<ValueTypeHeader, DomainError> {
        Ok(ValueTypeHeader {
            frame_version: self.base.parse_i8(src)?,
            value_type: self.base.parse_i8(src)?,
            version: self.base.parse_i8(src)?,
        })
    }

    /// Decodes the payload following `header`. Unknown types consume nothing.
    pub fn parse_record_value(
        &self,
        src: &mut Bytes,
        header: ValueTypeHeader,
    ) -> Result<RecordValue, DomainError> {
        match header.value_type {
            TOPIC_RECORD_TYPE => self.parse_topic_value(src, header),
            PARTITION_RECORD_TYPE => self.parse_partition_value(src, header),
            FEATURE_LEVEL_RECORD_TYPE => self.parse_feature_level_value(src, header),
            type_code => Ok(RecordValue::Unrecognized { type_code }),
        }
    }

    fn parse_topic_value(
        &self,
        src: &mut Bytes,
        header: ValueTypeHeader,
    ) -> Result<RecordValue, DomainError> {
        let topic_name = self.base.parse_compact_string(src)?;
        let topic_id = self.base.parse_uuid(src)?;
        self.base.skip(src, 1)?; // tagged fields

        Ok(RecordValue::Topic(TopicValue {
            header,
            topic_name,
            topic_id,
        }))
    }

    fn parse_partition_value(
        &self,
        src: &mut Bytes,
        header: ValueTypeHeader,
    ) -> Result<RecordValue, DomainError> {
        let partition_id = self.base.parse_i32(src)?;
        let topic_id = self.base.parse_uuid(src)?;

        let replicas = self.parse_broker_ids(src)?;
        let in_sync_replicas = self.parse_broker_ids(src)?;
        let removing_replicas = self.parse_broker_ids(src)?;
        let adding_replicas = self.parse_broker_ids(src)?;

        let leader_id = self.base.parse_i32(src)?;
        let leader_epoch = self.base.parse_i32(src)?;
        let partition_epoch = self.base.parse_i32(src)?;

        let directories = self
            .base
            .parse_compact_array(src, |src| self.base.parse_uuid(src))?;
        self.base.skip(src, 1)?; // tagged fields

        Ok(RecordValue::Partition(PartitionValue {
            header,
            partition_id,
            topic_id,
            replicas,
            in_sync_replicas,
            removing_replicas,
            adding_replicas,
            leader_id,
            leader_epoch,
            partition_epoch,
            directories,
        }))
    }

    fn parse_feature_level_value(
        &self,
        src: &mut Bytes,
        header: ValueTypeHeader,
    ) -> Result<RecordValue, DomainError> {
        let name = self.base.parse_compact_string(src)?;
        let feature_level = self.base.parse_i16(src)?;
        self.base.skip(src, 1)?; // tagged fields

        Ok(RecordValue::FeatureLevel(FeatureLevelValue {
            header,
            name,
            feature_level,
        }))
    }

    fn parse_broker_ids(&self, src: &mut Bytes) -> Result<Vec<i32>, DomainError> {
        self.base
            .parse_compact_array(src, |src| self.base.parse_i32(src))
    }
}
