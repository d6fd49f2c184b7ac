use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImpactError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("{0} is outside the project root")]
    OutsideRoot(String),
}
