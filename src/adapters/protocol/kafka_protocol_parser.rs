use crate::adapters::protocol::dto::{KafkaRequest, KafkaResponse, RequestParsing};
use crate::application::error::ApplicationError;

use super::parser::request_parser::RequestParser;
use super::parser::response_encoder::ResponseEncoder;

/// Ties request decoding and response encoding together for the TCP adapter.
#[derive(Debug, Clone, Default)]
pub struct KafkaProtocolParser {
    request_parser: RequestParser,
    response_encoder: ResponseEncoder,
}

impl KafkaProtocolParser {
    pub fn new() -> Self {
        Self::with_mode(RequestParsing::default())
    }

    pub fn with_mode(mode: RequestParsing) -> Self {
        Self {
            request_parser: RequestParser::with_mode(mode),
            response_encoder: ResponseEncoder::new(),
        }
    }

    /// `data` is the whole frame, size prefix included.
    pub fn parse_request(&self, data: &[u8]) -> Result<KafkaRequest, ApplicationError> {
        Ok(self.request_parser.parse(data)?)
    }

    pub fn encode_response(&self, response: &KafkaResponse) -> Vec<u8> {
        self.response_encoder.encode(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::protocol::constants::{API_VERSIONS_KEY, DESCRIBE_TOPIC_PARTITIONS_KEY};
    use crate::adapters::protocol::dto::{
        DescribeTopicPartitionsResponse, RequestPayload, ResponsePayload, TopicResponse,
    };
    use crate::domain::error::DomainError;

    #[test]
    fn test_parse_api_versions_request() {
        let mut data = Vec::new();

        // Message size (4 bytes)
        data.extend_from_slice(&11i32.to_be_bytes());

        // Header
        data.extend_from_slice(&API_VERSIONS_KEY.to_be_bytes()); // API Key
        data.extend_from_slice(&3i16.to_be_bytes()); // API Version
        data.extend_from_slice(&123i32.to_be_bytes()); // Correlation ID
        data.extend_from_slice(&(-1i16).to_be_bytes()); // Client ID (null)
        data.push(0); // tag buffer

        let parser = KafkaProtocolParser::new();
        let request = parser.parse_request(&data).unwrap();

        assert_eq!(request.header.message_size, 11);
        assert_eq!(request.header.api_key, API_VERSIONS_KEY);
        assert_eq!(request.header.api_version, 3);
        assert_eq!(request.header.correlation_id, 123);
        assert!(request.header.is_supported_version());
        assert!(matches!(request.payload, RequestPayload::ApiVersions));
    }

    #[test]
    fn test_parse_short_frame_is_domain_error() {
        let parser = KafkaProtocolParser::new();
        let result = parser.parse_request(&[0, 0, 0, 4]);
        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::TooShort { .. }))
        ));
    }

    #[test]
    fn test_cli_request_to_response() {
        let data =
            hex::decode("00000023004b00000000000700096b61666b612d636c69000204666f6f0000000064ff00")
                .unwrap();
        let parser = KafkaProtocolParser::new();
        let request = parser.parse_request(&data).unwrap();
        assert_eq!(request.header.api_key, DESCRIBE_TOPIC_PARTITIONS_KEY);

        let topics = match request.payload {
            RequestPayload::DescribeTopicPartitions(req) => req
                .topics
                .into_iter()
                .map(|t| TopicResponse::unknown(t.topic_name))
                .collect(),
            other => panic!("Expected DescribeTopicPartitions payload, got {:?}", other),
        };
        let response = KafkaResponse::new(
            request.header.correlation_id,
            ResponsePayload::DescribeTopicPartitions(DescribeTopicPartitionsResponse::new(topics)),
        );

        let encoded = parser.encode_response(&response);
        assert_eq!(
            hex::encode(&encoded),
            concat!(
                "0000002a",                         // size
                "00000007",                         // correlation id
                "00",                               // tag buffer
                "00000000",                         // throttle time
                "02",                               // topics
                "0003",                             // unknown topic or partition
                "04666f6f",                         // "foo"
                "00",                               // tag buffer
                "00000000000000000000000000000000", // topic id
                "00",                               // is internal
                "01",                               // partitions
                "00000000",                         // authorized operations
                "00",                               // tag buffer
                "00",                               // next cursor
                "00",                               // tag buffer
            )
        );
    }
}
