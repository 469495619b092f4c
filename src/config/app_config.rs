use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::adapters::incoming::tcp_adapter::{TcpAdapter, UnknownApiKeyPolicy};
use crate::adapters::outgoing::kraft_metadata_store::KraftMetadataStore;
use crate::adapters::protocol::dto::RequestParsing;
use crate::adapters::protocol::KafkaProtocolParser;
use crate::application::broker::{KafkaBroker, TopicLookup};
use crate::application::error::ApplicationError;
use crate::ports::incoming::message_handler::MessageHandler;
use crate::Result;

pub const DEFAULT_ADDR: &str = "127.0.0.1:9092";
pub const DEFAULT_METADATA_LOG: &str =
    "/tmp/kraft-combined-logs/__cluster_metadata-0/00000000000000000000.log";

pub const ADDR_VAR: &str = "KRAFT_BROKER_ADDR";
pub const METADATA_LOG_VAR: &str = "KRAFT_METADATA_LOG";
pub const TOPIC_LOOKUP_VAR: &str = "KRAFT_TOPIC_LOOKUP";
pub const UNKNOWN_API_KEY_VAR: &str = "KRAFT_UNKNOWN_API_KEY";
pub const REQUEST_PARSING_VAR: &str = "KRAFT_REQUEST_PARSING";

/// 환경 변수에서 읽어 오는 서버 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub addr: String,
    pub metadata_log: PathBuf,
    pub topic_lookup: TopicLookup,
    pub unknown_api_key: UnknownApiKeyPolicy,
    pub request_parsing: RequestParsing,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            metadata_log: PathBuf::from(DEFAULT_METADATA_LOG),
            topic_lookup: TopicLookup::default(),
            unknown_api_key: UnknownApiKeyPolicy::default(),
            request_parsing: RequestParsing::default(),
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키/값 조회 함수로 설정을 만듦. 값이 없는 키는 기본값을 유지
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            addr: lookup(ADDR_VAR).unwrap_or(defaults.addr),
            metadata_log: lookup(METADATA_LOG_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.metadata_log),
            topic_lookup: parse_var(&lookup, TOPIC_LOOKUP_VAR, defaults.topic_lookup)?,
            unknown_api_key: parse_var(&lookup, UNKNOWN_API_KEY_VAR, defaults.unknown_api_key)?,
            request_parsing: parse_var(&lookup, REQUEST_PARSING_VAR, defaults.request_parsing)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ApplicationError::Config(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}

pub struct AppConfig {
    pub settings: ServerSettings,
    pub broker: Arc<dyn MessageHandler>,
    pub protocol_parser: KafkaProtocolParser,
}

impl AppConfig {
    /// 메타데이터 스냅샷을 읽고 브로커를 구성함
    /// 로그 파일이 없으면 빈 저장소로 시작하고, 손상된 로그는 에러를 반환
    pub async fn load(settings: ServerSettings) -> Result<Self> {
        let store = KraftMetadataStore::load_or_empty(&settings.metadata_log).await?;
        info!(
            topic_lookup = ?settings.topic_lookup,
            request_parsing = ?settings.request_parsing,
            unknown_api_key = ?settings.unknown_api_key,
            diagnostics = store.diagnostics().len(),
            "broker configured"
        );

        let broker = Arc::new(KafkaBroker::with_topic_lookup(
            Arc::new(store),
            settings.topic_lookup,
        ));
        let protocol_parser = KafkaProtocolParser::with_mode(settings.request_parsing);

        Ok(Self::with_custom_components(settings, broker, protocol_parser))
    }

    pub fn with_custom_components(
        settings: ServerSettings,
        broker: Arc<dyn MessageHandler>,
        protocol_parser: KafkaProtocolParser,
    ) -> Self {
        Self {
            settings,
            broker,
            protocol_parser,
        }
    }

    pub async fn tcp_adapter(&self) -> Result<TcpAdapter> {
        let adapter = TcpAdapter::new(
            &self.settings.addr,
            Arc::clone(&self.broker),
            self.protocol_parser.clone(),
        )
        .await?;
        Ok(adapter.with_unknown_api_key_policy(self.settings.unknown_api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = ServerSettings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, ServerSettings::default());
        assert_eq!(settings.addr, "127.0.0.1:9092");
        assert_eq!(settings.topic_lookup, TopicLookup::FirstMatchOnly);
        assert_eq!(settings.unknown_api_key, UnknownApiKeyPolicy::Continue);
        assert_eq!(settings.request_parsing, RequestParsing::Lenient);
    }

    #[test]
    fn test_overrides() {
        let settings = ServerSettings::from_lookup(lookup_from(&[
            (ADDR_VAR, "0.0.0.0:19092"),
            (METADATA_LOG_VAR, "/var/lib/kraft/meta.log"),
            (TOPIC_LOOKUP_VAR, "per-topic"),
            (UNKNOWN_API_KEY_VAR, "shutdown"),
            (REQUEST_PARSING_VAR, " strict "),
        ]))
        .unwrap();

        assert_eq!(settings.addr, "0.0.0.0:19092");
        assert_eq!(settings.metadata_log, PathBuf::from("/var/lib/kraft/meta.log"));
        assert_eq!(settings.topic_lookup, TopicLookup::PerTopic);
        assert_eq!(settings.unknown_api_key, UnknownApiKeyPolicy::ShutdownServer);
        assert_eq!(settings.request_parsing, RequestParsing::Strict);
    }

    #[test]
    fn test_invalid_value() {
        let result = ServerSettings::from_lookup(lookup_from(&[(TOPIC_LOOKUP_VAR, "everything")]));
        match result {
            Err(ApplicationError::Config(message)) => assert!(message.contains(TOPIC_LOOKUP_VAR)),
            other => panic!("Expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_load_without_metadata_log() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let settings = ServerSettings {
            addr: "127.0.0.1:0".to_string(),
            metadata_log: dir.path().join("missing.log"),
            ..ServerSettings::default()
        };

        let config = AppConfig::load(settings).await?;
        let adapter = config.tcp_adapter().await?;
        assert!(adapter.local_addr()?.port() > 0);
        Ok(())
    }
}
