/// Error types shared across the application
use thiserror::Error;

/// Failures talking to the tabular store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot connect to the sheet store: {0}")]
    Connection(String),

    #[error("Worksheet '{worksheet}' is missing column '{column}'")]
    MissingColumn { worksheet: String, column: String },

    #[error("Row has {found} cells but worksheet '{worksheet}' has {expected} columns")]
    RowWidth {
        worksheet: String,
        expected: usize,
        found: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Form input the user has to correct and resubmit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields.")]
    MissingRequired,

    #[error("Please fill in both Title and Description.")]
    MissingFeedback,

    #[error("Column names of new feedback data do not match existing feedback data.")]
    FeedbackSchema,

    #[error("Year must be between {min} and {max}.")]
    YearOutOfRange { min: i32, max: i32 },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Incorrect code")]
    WrongCode,

    #[error("Enter a username or password.")]
    MissingCredentials,

    #[error("Please check your credentials and try again.")]
    BadCredentials,
}

/// Problems loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
