pub mod constants;
pub mod dto;
pub mod kafka_protocol_parser;
pub mod kraft_record_encoder;
pub mod kraft_record_parser;
pub mod parser;

pub use kafka_protocol_parser::KafkaProtocolParser;
pub use kraft_record_encoder::KraftRecordEncoder;
pub use kraft_record_parser::KraftRecordParser;
