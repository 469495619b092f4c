use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapters::protocol::constants::MAX_FRAME_SIZE;
use crate::adapters::protocol::KafkaProtocolParser;
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::ports::incoming::message_handler::MessageHandler;
use crate::Result;

/// 처리할 수 없는 API 키를 가진 요청을 받았을 때의 서버 동작
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownApiKeyPolicy {
    /// 경고만 남기고 같은 연결에서 다음 요청을 계속 읽음.
    ///
    /// 해당 correlation id에 대한 응답은 보내지 않으므로, 응답을 기다리는
    /// 클라이언트는 자체 타임아웃이 날 때까지 대기함. 디코딩에 실패한
    /// 요청도 같은 방식으로 응답 없이 넘어감.
    #[default]
    Continue,
    /// 새 연결 수락을 멈추고 [`TcpAdapter::run`]에서 에러를 반환함.
    ShutdownServer,
}

impl FromStr for UnknownApiKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "continue" => Ok(Self::Continue),
            "shutdown" => Ok(Self::ShutdownServer),
            other => Err(format!(
                "unknown api key policy '{}', expected continue or shutdown",
                other
            )),
        }
    }
}

pub struct TcpAdapter {
    listener: TcpListener,
    message_handler: Arc<dyn MessageHandler>,
    protocol_parser: KafkaProtocolParser,
    unknown_api_key: UnknownApiKeyPolicy,
}

impl TcpAdapter {
    pub async fn new(
        addr: &str,
        message_handler: Arc<dyn MessageHandler>,
        protocol_parser: KafkaProtocolParser,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(ApplicationError::Io)?;
        Ok(Self {
            listener,
            message_handler,
            protocol_parser,
            unknown_api_key: UnknownApiKeyPolicy::default(),
        })
    }

    pub fn with_unknown_api_key_policy(mut self, policy: UnknownApiKeyPolicy) -> Self {
        self.unknown_api_key = policy;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(&self) -> Result<()> {
        info!(addr = %self.local_addr()?, "broker listening");
        let (shutdown_tx, mut shutdown_rx) = watch::channel(None::<i16>);

        loop {
            tokio::select! {
                result = self.listener.accept() => match result {
                    Ok((stream, peer)) => {
                        let connection = Connection {
                            message_handler: Arc::clone(&self.message_handler),
                            protocol_parser: self.protocol_parser.clone(),
                            unknown_api_key: self.unknown_api_key,
                            shutdown_tx: shutdown_tx.clone(),
                        };

                        tokio::spawn(async move {
                            debug!(%peer, "accepted connection");
                            if let Err(e) = connection.serve(stream).await {
                                warn!(%peer, error = %e, "connection closed with error");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                },
                Ok(()) = shutdown_rx.changed() => {
                    if let Some(api_key) = *shutdown_rx.borrow() {
                        error!(api_key, "unsupported api key, shutting down");
                        return Err(DomainError::UnsupportedApiKey(api_key).into());
                    }
                }
            }
        }
    }
}

/// 크기 필드를 포함한 요청 프레임 하나를 파싱, 처리, 인코딩함
pub async fn process_frame(
    message_handler: &dyn MessageHandler,
    protocol_parser: &KafkaProtocolParser,
    frame: &[u8],
) -> Result<Vec<u8>> {
    let request = protocol_parser.parse_request(frame)?;
    let response = message_handler.handle_request(request).await?;
    Ok(protocol_parser.encode_response(&response))
}

struct Connection {
    message_handler: Arc<dyn MessageHandler>,
    protocol_parser: KafkaProtocolParser,
    unknown_api_key: UnknownApiKeyPolicy,
    shutdown_tx: watch::Sender<Option<i16>>,
}

impl Connection {
    async fn serve(&self, mut stream: TcpStream) -> Result<()> {
        loop {
            // 1. 요청 크기 읽기
            let mut size_bytes = [0u8; 4];
            if let Err(e) = stream.read_exact(&mut size_bytes).await {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    debug!("client closed connection");
                    return Ok(());
                }
                return Err(ApplicationError::Io(e));
            }
            let message_size = i32::from_be_bytes(size_bytes);
            let body_len = usize::try_from(message_size).map_err(|_| {
                DomainError::InvalidEncoding(format!("negative message size {}", message_size))
            })?;
            // 상한을 넘는 크기는 할당 전에 연결을 끊음
            if body_len > MAX_FRAME_SIZE {
                return Err(DomainError::InvalidEncoding(format!(
                    "message size {} exceeds limit {}",
                    body_len, MAX_FRAME_SIZE
                ))
                .into());
            }

            // 2. 요청 데이터 읽기
            let mut frame = vec![0u8; 4 + body_len];
            frame[..4].copy_from_slice(&size_bytes);
            stream
                .read_exact(&mut frame[4..])
                .await
                .map_err(ApplicationError::Io)?;

            // 3. 파싱, 처리, 인코딩
            match process_frame(self.message_handler.as_ref(), &self.protocol_parser, &frame).await
            {
                Ok(encoded) => {
                    // 4. 응답 전송
                    stream.write_all(&encoded).await.map_err(ApplicationError::Io)?;
                }
                Err(ApplicationError::Domain(DomainError::UnsupportedApiKey(api_key))) => {
                    match self.unknown_api_key {
                        UnknownApiKeyPolicy::Continue => {
                            warn!(api_key, "unsupported api key, no response sent");
                        }
                        UnknownApiKeyPolicy::ShutdownServer => {
                            self.shutdown_tx.send_replace(Some(api_key));
                            return Err(DomainError::UnsupportedApiKey(api_key).into());
                        }
                    }
                }
                Err(ApplicationError::Io(e)) => return Err(ApplicationError::Io(e)),
                Err(e) => warn!(error = %e, "failed to handle request"),
            }
        }
    }
}
