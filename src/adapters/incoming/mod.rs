pub mod tcp_adapter;

pub use tcp_adapter::{process_frame, TcpAdapter, UnknownApiKeyPolicy};
