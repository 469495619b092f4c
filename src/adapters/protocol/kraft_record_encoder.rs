use bytes::{BufMut, BytesMut};

use crate::adapters::protocol::parser::varint::PutVarint;
use crate::domain::metadata::{ClusterMetadataLog, Record, RecordBatch, RecordValue};

/// Serializes record batches in the cluster metadata log format.
///
/// The CRC field is written as stored; it is never recomputed.
#[derive(Debug, Default, Clone)]
pub struct KraftRecordEncoder;

impl KraftRecordEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, log: &ClusterMetadataLog) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for batch in &log.batches {
            self.encode_record_batch(batch, &mut buf);
        }
        buf.to_vec()
    }

    pub fn encode_record_batch(&self, batch: &RecordBatch, buf: &mut BytesMut) {
        let mut body = BytesMut::new();
        body.put_i32(batch.partition_leader_epoch);
        body.put_i8(batch.magic_byte);
        body.put_u32(batch.crc);
        body.put_i16(batch.attributes);
        body.put_i32(batch.last_offset_delta);
        body.put_i64(batch.base_timestamp);
        body.put_i64(batch.max_timestamp);
        body.put_i64(batch.producer_id);
        body.put_i16(batch.producer_epoch);
        body.put_i32(batch.base_sequence);
        body.put_i32(batch.records.len() as i32);
        for (offset_delta, record) in batch.records.iter().enumerate() {
            self.encode_record(record, offset_delta as i64, &mut body);
        }

        buf.put_i64(batch.base_offset);
        buf.put_i32(body.len() as i32);
        buf.put_slice(&body);
    }

    fn encode_record(&self, record: &Record, offset_delta: i64, buf: &mut BytesMut) {
        let mut body = BytesMut::new();
        body.put_i8(record.attributes);
        body.put_varint(record.timestamp_delta);
        body.put_varint(offset_delta);

        match &record.key {
            Some(key) => {
                body.put_varint(key.len() as i64);
                body.put_slice(key);
            }
            None => body.put_varint(-1),
        }

        match &record.value {
            Some(value) => {
                let mut encoded = BytesMut::new();
                self.encode_value(value, &mut encoded);
                body.put_varint(encoded.len() as i64);
                body.put_slice(&encoded);
            }
            None => body.put_varint(-1),
        }

        body.put_u8(0); // headers

        buf.put_varint(body.len() as i64);
        buf.put_slice(&body);
    }

    fn encode_value(&self, value: &RecordValue, buf: &mut BytesMut) {
        match value {
            RecordValue::Topic(topic) => {
                buf.put_i8(topic.header.frame_version);
                buf.put_i8(topic.header.value_type);
                buf.put_i8(topic.header.version);
                buf.put_compact_len(topic.topic_name.len());
                buf.put_slice(topic.topic_name.as_bytes());
                buf.put_slice(topic.topic_id.as_bytes());
                buf.put_u8(0); // tagged fields
            }
            RecordValue::Partition(partition) => {
                buf.put_i8(partition.header.frame_version);
                buf.put_i8(partition.header.value_type);
                buf.put_i8(partition.header.version);
                buf.put_i32(partition.partition_id);
                buf.put_slice(partition.topic_id.as_bytes());
                for ids in [
                    &partition.replicas,
                    &partition.in_sync_replicas,
                    &partition.removing_replicas,
                    &partition.adding_replicas,
                ] {
                    buf.put_compact_len(ids.len());
                    ids.iter().for_each(|id| buf.put_i32(*id));
                }
                buf.put_i32(partition.leader_id);
                buf.put_i32(partition.leader_epoch);
                buf.put_i32(partition.partition_epoch);
                buf.put_compact_len(partition.directories.len());
                for directory in &partition.directories {
                    buf.put_slice(directory.as_bytes());
                }
                buf.put_u8(0); // tagged fields
            }
            RecordValue::FeatureLevel(feature) => {
                buf.put_i8(feature.header.frame_version);
                buf.put_i8(feature.header.value_type);
                buf.put_i8(feature.header.version);
                buf.put_compact_len(feature.name.len());
                buf.put_slice(feature.name.as_bytes());
                buf.put_i16(feature.feature_level);
                buf.put_u8(0); // tagged fields
            }
            RecordValue::Unrecognized { type_code } => {
                buf.put_i8(1);
                buf.put_i8(*type_code);
                buf.put_i8(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::protocol::kraft_record_parser::KraftRecordParser;
    use crate::domain::metadata::{PartitionValue, TopicValue, ValueTypeHeader};
    use bytes::Bytes;
    use uuid::Uuid;

    const FIXTURE_HEX: &str = include_str!("../../../tests/fixtures/cluster_metadata.hex");

    fn batch_with(records: Vec<Record>) -> RecordBatch {
        RecordBatch {
            base_offset: 42,
            partition_leader_epoch: 1,
            magic_byte: 2,
            crc: 0x1234_5678,
            attributes: 0,
            last_offset_delta: records.len() as i32 - 1,
            base_timestamp: 1_000,
            max_timestamp: 2_000,
            producer_id: -1,
            producer_epoch: -1,
            base_sequence: -1,
            records,
        }
    }

    fn record(value: Option<RecordValue>, key: Option<&'static [u8]>) -> Record {
        Record {
            attributes: 0,
            timestamp_delta: -3,
            key_size: key.map_or(-1, |k| k.len() as i64),
            key: key.map(Bytes::from_static),
            value_type: value.as_ref().map_or(0, RecordValue::value_type),
            value,
        }
    }

    #[test]
    fn test_fixture_reencodes_byte_for_byte() {
        let data = hex::decode(FIXTURE_HEX.trim()).unwrap();
        let log = KraftRecordParser::new().parse(&data).unwrap();
        assert_eq!(KraftRecordEncoder::new().encode(&log), data);
    }

    #[test]
    fn test_mixed_batch_round_trip() {
        let topic_id = Uuid::new_v4();
        let long_name = "t".repeat(200); // compact length needs two varint bytes
        let records = vec![
            record(
                Some(RecordValue::Topic(TopicValue {
                    header: ValueTypeHeader::new(2, 0),
                    topic_name: long_name,
                    topic_id,
                })),
                None,
            ),
            record(
                Some(RecordValue::Partition(PartitionValue {
                    header: ValueTypeHeader::new(3, 1),
                    partition_id: 7,
                    topic_id,
                    replicas: vec![1, 2, 3],
                    in_sync_replicas: vec![1, 2],
                    removing_replicas: vec![3],
                    adding_replicas: vec![],
                    leader_id: 1,
                    leader_epoch: 4,
                    partition_epoch: 9,
                    directories: vec![Uuid::new_v4(), Uuid::new_v4()],
                })),
                Some(b"partition-key"),
            ),
            record(Some(RecordValue::Unrecognized { type_code: 21 }), None),
            record(None, None),
        ];
        let log = ClusterMetadataLog::new(vec![batch_with(records)]);

        let encoded = KraftRecordEncoder::new().encode(&log);
        let decoded = KraftRecordParser::new().parse(&encoded).unwrap();
        assert_eq!(decoded, log);
    }
}
