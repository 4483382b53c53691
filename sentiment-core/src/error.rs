use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Price API error: {0}")]
    PriceApi(#[from] PriceApiError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("Data shape error: {0}")]
    DataShape(#[from] DataShapeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum PriceApiError {
    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("No price history for {symbol} in the requested range")]
    EmptyHistory { symbol: String },

    #[error("Invalid price response for {symbol}: {details}")]
    InvalidResponse { symbol: String, details: String },

    #[error("Price server error {status_code} for {symbol}")]
    ServerError { symbol: String, status_code: u16 },

    #[error("Price request timeout for {symbol}")]
    RequestTimeout { symbol: String },
}

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Failed to open workbook {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Sheet not found in {path}: {sheet}")]
    SheetNotFound { path: String, sheet: String },

    #[error("Failed to read sheet {sheet}: {reason}")]
    ReadFailed { sheet: String, reason: String },

    #[error("Invalid sheet name: {sheet}")]
    InvalidSheetName { sheet: String },

    #[error("Failed to write workbook {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Xlsx writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataShapeError {
    #[error("Sheet {sheet} is missing column {column}")]
    MissingColumn { sheet: String, column: String },

    #[error("Sheet {sheet} has no header row")]
    MissingHeader { sheet: String },

    #[error("Sheet {sheet}, row {row}, column {column}: expected {expected}, found {found}")]
    InvalidCell {
        sheet: String,
        row: usize,
        column: String,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to plot for {ticker}")]
    EmptySeries { ticker: String },

    #[error("Drawing failed for {ticker}: {reason}")]
    DrawingFailed { ticker: String, reason: String },
}
