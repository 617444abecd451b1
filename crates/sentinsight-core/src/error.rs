use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown label: {0}")]
    Label(String),

    #[error("unknown dimension: {0}")]
    Dimension(String),
}
