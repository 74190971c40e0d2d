use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Model domain error: {0}")]
    DomainError(String),

    #[error("Curve fitting failed: {0}")]
    FitError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Distribution error: {0}")]
    DistributionError(#[from] statrs::StatsError),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
