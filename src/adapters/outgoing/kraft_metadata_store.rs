use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use tokio::fs::read;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::protocol::kraft_record_parser::KraftRecordParser;
use crate::application::error::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::metadata::{
    ClusterMetadataLog, PartitionValue, Record, RecordValue, TopicValue,
};
use crate::ports::outgoing::metadata_store::MetadataStore;

/// Immutable snapshot of a parsed `__cluster_metadata` log.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct KraftMetadataStore {
    log: ClusterMetadataLog,
}

impl KraftMetadataStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_log(log: ClusterMetadataLog) -> Self {
        let store = Self { log };
        for name in store.duplicate_topic_names() {
            warn!(topic = name, "topic appears more than once in metadata log");
        }
        store
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DomainError> {
        let log = KraftRecordParser::new().parse(data)?;
        Ok(Self::from_log(log))
    }

    /// Reads and parses the metadata log at `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let path = path.as_ref();
        let content = read(path).await?;
        let store = Self::from_bytes(&content)?;
        info!(
            path = %path.display(),
            bytes = content.len(),
            topics = store.topics().count(),
            "loaded cluster metadata"
        );
        Ok(store)
    }

    /// Like [`load`](Self::load), but a missing file yields an empty store.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let path = path.as_ref();
        match Self::load(path).await {
            Err(ApplicationError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "metadata log not found, starting with empty metadata");
                Ok(Self::empty())
            }
            other => other,
        }
    }

    pub fn log(&self) -> &ClusterMetadataLog {
        &self.log
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicValue> {
        self.log.records().filter_map(Record::topic)
    }

    pub fn feature_level(&self, name: &str) -> Option<i16> {
        self.log.values().find_map(|value| match value {
            RecordValue::FeatureLevel(feature) if feature.name == name => {
                Some(feature.feature_level)
            }
            _ => None,
        })
    }

    /// Names carried by more than one TopicValue, in order of first appearance.
    pub fn duplicate_topic_names(&self) -> Vec<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = Vec::new();
        for topic in self.topics() {
            let count = counts.entry(topic.topic_name.as_str()).or_insert(0);
            if *count == 0 {
                order.push(topic.topic_name.as_str());
            }
            *count += 1;
        }
        order.retain(|name| counts[name] > 1);
        order
    }

    /// Recoverable problems found while parsing the log.
    pub fn diagnostics(&self) -> &[DomainError] {
        &self.log.diagnostics
    }
}

impl MetadataStore for KraftMetadataStore {
    fn find_topic_by_name(&self, name: &str) -> Option<&TopicValue> {
        self.topics().find(|topic| topic.topic_name == name)
    }

    fn partitions_for_topic(&self, topic_id: &Uuid) -> Vec<&PartitionValue> {
        self.log
            .records()
            .filter_map(Record::partition)
            .filter(|partition| partition.topic_id == *topic_id)
            .collect()
    }
}
