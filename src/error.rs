use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemuxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown track: stream id 0x{0:02X}")]
    UnknownTrack(u8),

    #[error("Frame parser error: {0}")]
    Parser(String),
}

pub type Result<T> = std::result::Result<T, DemuxError>;
