use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("credential store error: {0}")]
    Store(String),
    #[error("session failed: {0}")]
    Session(String),
    #[error("console event queue closed")]
    QueueClosed,
}
