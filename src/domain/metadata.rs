use bytes::Bytes;
use uuid::Uuid;

use super::error::DomainError;

pub const TOPIC_RECORD_TYPE: i8 = 2;
pub const PARTITION_RECORD_TYPE: i8 = 3;
pub const FEATURE_LEVEL_RECORD_TYPE: i8 = 12;

/// The whole cluster metadata log, in file order.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterMetadataLog {
    pub batches: Vec<RecordBatch>,
    /// Recoverable problems met while parsing (record boundary mismatches).
    pub diagnostics: Vec<DomainError>,
}

impl ClusterMetadataLog {
    pub fn new(batches: Vec<RecordBatch>) -> Self {
        Self {
            batches,
            diagnostics: Vec::new(),
        }
    }

    /// All records in log order: batch order first, then record order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.batches.iter().flat_map(|batch| batch.records.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &RecordValue> {
        self.records().filter_map(|record| record.value.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordBatch {
    pub base_offset: i64,
    pub partition_leader_epoch: i32,
    pub magic_byte: i8,
    /// Stored as read, never verified.
    pub crc: u32,
    pub attributes: i16,
    pub last_offset_delta: i32,
    pub base_timestamp: i64,
    pub max_timestamp: i64,
    pub producer_id: i64,
    pub producer_epoch: i16,
    pub base_sequence: i32,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub attributes: i8,
    pub timestamp_delta: i64,
    /// -1 means the record has no key.
    pub key_size: i64,
    pub key: Option<Bytes>,
    /// Copied from the value header, 0 when the record carries no value.
    pub value_type: i8,
    pub value: Option<RecordValue>,
}

impl Record {
    pub fn topic(&self) -> Option<&TopicValue> {
        match &self.value {
            Some(RecordValue::Topic(topic)) => Some(topic),
            _ => None,
        }
    }

    pub fn partition(&self) -> Option<&PartitionValue> {
        match &self.value {
            Some(RecordValue::Partition(partition)) => Some(partition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTypeHeader {
    pub frame_version: i8,
    pub value_type: i8,
    pub version: i8,
}

impl ValueTypeHeader {
    pub fn new(value_type: i8, version: i8) -> Self {
        Self {
            frame_version: 1,
            value_type,
            version,
        }
    }
}

/// Typed record payloads. New record types are added as variants here.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Topic(TopicValue),
    Partition(PartitionValue),
    FeatureLevel(FeatureLevelValue),
    Unrecognized { type_code: i8 },
}

impl RecordValue {
    pub fn value_type(&self) -> i8 {
        match self {
            RecordValue::Topic(_) => TOPIC_RECORD_TYPE,
            RecordValue::Partition(_) => PARTITION_RECORD_TYPE,
            RecordValue::FeatureLevel(_) => FEATURE_LEVEL_RECORD_TYPE,
            RecordValue::Unrecognized { type_code } => *type_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicValue {
    pub header: ValueTypeHeader,
    pub topic_name: String,
    pub topic_id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionValue {
    pub header: ValueTypeHeader,
    pub partition_id: i32,
    pub topic_id: Uuid,
    pub replicas: Vec<i32>,
    pub in_sync_replicas: Vec<i32>,
    pub removing_replicas: Vec<i32>,
    pub adding_replicas: Vec<i32>,
    pub leader_id: i32,
    pub leader_epoch: i32,
    pub partition_epoch: i32,
    pub directories: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLevelValue {
    pub header: ValueTypeHeader,
    pub name: String,
    pub feature_level: i16,
}
