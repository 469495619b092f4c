/// ApiVersions API의 키 값
/// 클라이언트가 브로커가 지원하는 API 버전을 조회할 때 사용함
pub const API_VERSIONS_KEY: i16 = 18;
pub const API_VERSIONS_MIN_VERSION: i16 = 0;
pub const API_VERSIONS_MAX_VERSION: i16 = 4;

/// DescribeTopicPartitions API의 키 값
pub const DESCRIBE_TOPIC_PARTITIONS_KEY: i16 = 75;

/// DescribeTopicPartitions API는 버전 0만 지원
pub const DESCRIBE_TOPIC_PARTITIONS_MIN_VERSION: i16 = 0;
pub const DESCRIBE_TOPIC_PARTITIONS_MAX_VERSION: i16 = 0;

/// 요청 헤더의 최소 크기
/// messageSize(4) + apiKey(2) + apiVersion(2) + correlationId(4)
pub const MINIMAL_HEADER_SIZE: usize = 12;

/// 크기 필드를 제외한 요청 본문의 최대 크기 (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// 토픽에 허용된 작업 비트마스크
/// READ, WRITE, CREATE, DELETE, ALTER, DESCRIBE, DESCRIBE_CONFIGS, ALTER_CONFIGS
pub const TOPIC_AUTHORIZED_OPERATIONS: i32 = 0x0DF8;

/// 비어 있는 태그 필드 구간
pub const TAG_BUFFER: u8 = 0;

/// 다음 페이지가 없음을 뜻하는 nextCursor 값
pub const NO_CURSOR: u8 = 0;
