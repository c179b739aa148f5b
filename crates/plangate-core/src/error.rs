use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("unknown subscription status: {0}")]
    UnknownStatus(String),
}
