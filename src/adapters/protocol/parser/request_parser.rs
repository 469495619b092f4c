use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use super::varint::{compact_len, read_uint};
use super::{BaseParser, ByteParser, CompactStringParser, PrimitiveParser, VarIntParser};
use crate::adapters::protocol::constants::{
    API_VERSIONS_KEY, DESCRIBE_TOPIC_PARTITIONS_KEY, MINIMAL_HEADER_SIZE,
};
use crate::adapters::protocol::dto::{
    DescribeTopicPartitionsRequest, KafkaRequest, RequestHeader, RequestParsing, RequestPayload,
    TopicRequest,
};
use crate::domain::error::DomainError;

/// Decodes inbound request frames. The frame handed in still carries its
/// 4-byte size prefix.
#[derive(Debug, Clone, Default)]
pub struct RequestParser {
    base: BaseParser,
    mode: RequestParsing,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::with_mode(RequestParsing::default())
    }

    pub fn with_mode(mode: RequestParsing) -> Self {
        Self {
            base: BaseParser,
            mode,
        }
    }

    pub fn parse(&self, data: &[u8]) -> Result<KafkaRequest, DomainError> {
        trace!(bytes = %hex::encode(data), "decoding request frame");
        let header = self.decode_minimal_header(data)?;

        let payload = match header.api_key {
            API_VERSIONS_KEY => RequestPayload::ApiVersions,
            DESCRIBE_TOPIC_PARTITIONS_KEY => RequestPayload::DescribeTopicPartitions(
                self.decode_describe_topic_partitions_request(data)?,
            ),
            _ => RequestPayload::Unsupported,
        };

        Ok(KafkaRequest::new(header, payload))
    }

    pub fn decode_minimal_header(&self, data: &[u8]) -> Result<RequestHeader, DomainError> {
        if data.len() < MINIMAL_HEADER_SIZE {
            return Err(DomainError::TooShort {
                needed: MINIMAL_HEADER_SIZE,
                actual: data.len(),
            });
        }

        let header = RequestHeader {
            message_size: read_uint(data, 0, 4)? as u32 as i32,
            api_key: read_uint(data, 4, 6)? as u16 as i16,
            api_version: read_uint(data, 6, 8)? as u16 as i16,
            correlation_id: read_uint(data, 8, 12)? as u32 as i32,
        };
        debug!(
            api_key = header.api_key,
            api_version = header.api_version,
            correlation_id = header.correlation_id,
            message_size = header.message_size,
            "decoded request header"
        );
        Ok(header)
    }

    /// Decodes the body of a DescribeTopicPartitions v0 request.
    ///
    /// In lenient mode a frame that ends early yields every field decoded
    /// before the cut; in strict mode it is rejected with `TooShort`.
    pub fn decode_describe_topic_partitions_request(
        &self,
        data: &[u8],
    ) -> Result<DescribeTopicPartitionsRequest, DomainError> {
        self.decode_minimal_header(data)?;

        let mut buf = Bytes::copy_from_slice(&data[MINIMAL_HEADER_SIZE..]);
        let mut request = DescribeTopicPartitionsRequest::default();

        match self.fill_describe_topic_partitions(&mut buf, &mut request) {
            Ok(()) => Ok(request),
            Err(e @ (DomainError::InsufficientData { .. } | DomainError::TruncatedVarint)) => {
                let position = data.len() - buf.remaining();
                match self.mode {
                    RequestParsing::Lenient => {
                        debug!(
                            error = %e,
                            position,
                            topics = request.topics.len(),
                            "request ended early, keeping parsed prefix"
                        );
                        Ok(request)
                    }
                    RequestParsing::Strict => {
                        let missing = match e {
                            DomainError::InsufficientData { needed, remaining } => {
                                needed - remaining
                            }
                            _ => 1,
                        };
                        Err(DomainError::TooShort {
                            needed: data.len() + missing,
                            actual: data.len(),
                        })
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    fn fill_describe_topic_partitions(
        &self,
        buf: &mut Bytes,
        request: &mut DescribeTopicPartitionsRequest,
    ) -> Result<(), DomainError> {
        request.client_id = self.parse_client_id(buf)?;
        self.base.skip(buf, 1)?; // tag buffer

        let topics_count = compact_len(self.base.parse_unsigned_varint(buf)?);
        for _ in 0..topics_count {
            let topic_name = self.base.parse_compact_string(buf)?;
            request.topics.push(TopicRequest { topic_name });
            self.base.skip(buf, 1)?; // tag buffer
        }

        request.response_partition_limit = self.base.parse_i32(buf)?;
        request.cursor = self.base.parse_u8(buf)?;
        self.base.skip(buf, 1)?; // tag buffer
        Ok(())
    }

    fn parse_client_id(&self, buf: &mut Bytes) -> Result<Option<String>, DomainError> {
        let len = self.base.parse_i16(buf)?;
        if len <= 0 {
            return Ok(None);
        }
        let len = len as usize;
        self.base.ensure_remaining(buf, len)?;
        let raw = buf.split_to(len);
        Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLI_REQUEST_HEX: &str =
        "00000023004b00000000000700096b61666b612d636c69000204666f6f0000000064ff00";

    fn describe_request(client_id: &str, topics: &[&str], limit: i32) -> Vec<u8> {
        let mut body = Vec::new();
        // Header
        body.extend_from_slice(&DESCRIBE_TOPIC_PARTITIONS_KEY.to_be_bytes()); // API Key
        body.extend_from_slice(&0i16.to_be_bytes()); // API Version
        body.extend_from_slice(&7i32.to_be_bytes()); // Correlation ID

        // Client ID
        body.extend_from_slice(&(client_id.len() as i16).to_be_bytes());
        body.extend_from_slice(client_id.as_bytes());
        body.push(0); // tag buffer

        // Topics (COMPACT_ARRAY of COMPACT_STRING)
        body.push(topics.len() as u8 + 1);
        for topic in topics {
            body.push(topic.len() as u8 + 1);
            body.extend_from_slice(topic.as_bytes());
            body.push(0); // tag buffer
        }

        body.extend_from_slice(&limit.to_be_bytes()); // response partition limit
        body.push(0xff); // cursor
        body.push(0); // tag buffer

        let mut frame = (body.len() as i32).to_be_bytes().to_vec();
        frame.extend_from_slice(&body);
        frame
    }

    #[test]
    fn test_decode_minimal_header() {
        let parser = RequestParser::new();
        let mut data = Vec::new();
        data.extend_from_slice(&8i32.to_be_bytes()); // Message size
        data.extend_from_slice(&API_VERSIONS_KEY.to_be_bytes()); // API Key
        data.extend_from_slice(&4i16.to_be_bytes()); // API Version
        data.extend_from_slice(&(-2i32).to_be_bytes()); // Correlation ID

        let header = parser.decode_minimal_header(&data).unwrap();
        assert_eq!(header.message_size, 8);
        assert_eq!(header.api_key, API_VERSIONS_KEY);
        assert_eq!(header.api_version, 4);
        assert_eq!(header.correlation_id, -2);
    }

    #[test]
    fn test_decode_minimal_header_too_short() {
        let parser = RequestParser::new();
        assert_eq!(
            parser.decode_minimal_header(&[0, 0, 0, 8, 0, 18, 0]),
            Err(DomainError::TooShort {
                needed: 12,
                actual: 7
            })
        );
    }

    #[test]
    fn test_decode_cli_request() {
        let data = hex::decode(CLI_REQUEST_HEX).unwrap();
        let request = RequestParser::new().parse(&data).unwrap();

        assert_eq!(request.header.api_key, DESCRIBE_TOPIC_PARTITIONS_KEY);
        assert_eq!(request.header.correlation_id, 7);
        match request.payload {
            RequestPayload::DescribeTopicPartitions(req) => {
                assert_eq!(req.client_id.as_deref(), Some("kafka-cli"));
                assert_eq!(
                    req.topics,
                    vec![TopicRequest {
                        topic_name: "foo".to_string()
                    }]
                );
                assert_eq!(req.response_partition_limit, 100);
                assert_eq!(req.cursor, 0xff);
            }
            other => panic!("Expected DescribeTopicPartitions payload, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_multiple_topics() {
        let data = describe_request("client", &["foo", "bar", "baz"], 1);
        let req = RequestParser::new()
            .decode_describe_topic_partitions_request(&data)
            .unwrap();

        let names: Vec<&str> = req.topics.iter().map(|t| t.topic_name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar", "baz"]);
        assert_eq!(req.response_partition_limit, 1);
    }

    #[test]
    fn test_null_client_id() {
        let mut data = describe_request("", &["foo"], 1);
        data[12..14].copy_from_slice(&(-1i16).to_be_bytes());

        let req = RequestParser::new()
            .decode_describe_topic_partitions_request(&data)
            .unwrap();
        assert_eq!(req.client_id, None);
        assert_eq!(req.topics.len(), 1);
    }

    #[test]
    fn test_lenient_keeps_parsed_prefix() {
        let mut data = describe_request("cli", &["foo", "bar"], 5);
        // cut inside the second topic name
        let cut = 12 + 2 + 3 + 1 + 1 + 5 + 3;
        data.truncate(cut);

        let req = RequestParser::new()
            .decode_describe_topic_partitions_request(&data)
            .unwrap();
        assert_eq!(req.client_id.as_deref(), Some("cli"));
        assert_eq!(req.topics.len(), 1);
        assert_eq!(req.topics[0].topic_name, "foo");
        assert_eq!(req.response_partition_limit, 0);
    }

    #[test]
    fn test_strict_rejects_short_body() {
        let mut data = describe_request("cli", &["foo"], 5);
        data.truncate(data.len() - 3);

        let parser = RequestParser::with_mode(RequestParsing::Strict);
        assert!(matches!(
            parser.decode_describe_topic_partitions_request(&data),
            Err(DomainError::TooShort { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_unsupported_payload() {
        let mut data = Vec::new();
        data.extend_from_slice(&8i32.to_be_bytes());
        data.extend_from_slice(&1i16.to_be_bytes()); // Fetch
        data.extend_from_slice(&0i16.to_be_bytes());
        data.extend_from_slice(&99i32.to_be_bytes());

        let request = RequestParser::new().parse(&data).unwrap();
        assert_eq!(request.header.api_key, 1);
        assert_eq!(request.payload, RequestPayload::Unsupported);
    }

    #[test]
    fn test_non_utf8_topic_name() {
        let mut data = describe_request("cli", &["foo"], 5);
        let name_start = 12 + 2 + 3 + 1 + 1 + 1;
        data[name_start] = 0xff;

        let result = RequestParser::new().decode_describe_topic_partitions_request(&data);
        assert!(matches!(result, Err(DomainError::InvalidEncoding(_))));
    }
}
