// ===============================
// src/error.rs
// ===============================
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure failures. Business results travel as `Outcome`, never here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("engine stopped: inbound queue closed")]
    EngineStopped,

    #[error("engine dropped the reply slot")]
    ReplyDropped,

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
