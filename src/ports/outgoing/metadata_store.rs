use uuid::Uuid;

use crate::domain::metadata::{PartitionValue, TopicValue};

/// Read-only view over the cluster metadata snapshot.
///
/// Built once before the listener starts and shared by every connection, so
/// lookups are plain synchronous borrows.
pub trait MetadataStore: Send + Sync {
    /// The first TopicValue named `name`, scanning batches then records in
    /// log order.
    fn find_topic_by_name(&self, name: &str) -> Option<&TopicValue>;

    /// PartitionValues belonging to `topic_id`, in log order.
    fn partitions_for_topic(&self, topic_id: &Uuid) -> Vec<&PartitionValue>;
}
