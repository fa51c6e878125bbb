use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid field path: {0}")]
    InvalidField(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),
}
