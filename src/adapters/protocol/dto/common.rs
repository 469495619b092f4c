#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i16)]
pub enum ErrorCode {
    None = 0,
    UnknownTopicOrPartition = 3,
    UnsupportedVersion = 35,
}

impl From<ErrorCode> for i16 {
    fn from(error_code: ErrorCode) -> Self {
        error_code as i16
    }
}

/// How short DescribeTopicPartitions request bodies are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RequestParsing {
    /// Keep whatever prefix of the request parsed cleanly.
    #[default]
    Lenient,
    /// Reject the request with `TooShort`.
    Strict,
}

impl std::str::FromStr for RequestParsing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown request parsing mode '{}', expected lenient or strict",
                other
            )),
        }
    }
}
