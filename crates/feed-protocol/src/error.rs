use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("truncated record: need {needed} bytes, got {got}")]
    TruncatedRecord { needed: usize, got: usize },

    #[error("malformed subscription ack: {0}")]
    MalformedAck(String),

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shared memory segment error: {0}")]
    Segment(String),

    #[error("config error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
