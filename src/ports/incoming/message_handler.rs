use async_trait::async_trait;

use crate::adapters::protocol::dto::{KafkaRequest, KafkaResponse};
use crate::Result;

/// 디코딩된 요청 하나를 받아 응답 하나를 돌려주는 trait
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_request(&self, request: KafkaRequest) -> Result<KafkaResponse>;
}
