use crate::error::*;
use tracing::{debug, error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    /// Whether a stage may record this failure against one item and move on.
    fn is_skippable(&self) -> bool;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::PriceApi(e) => {
                error!("Price API error details: {:?}", e);
            }
            CoreError::Workbook(e) => {
                error!("Workbook error details: {:?}", e);
            }
            CoreError::DataShape(e) => {
                error!("Data shape error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_skippable(),
            CoreError::PriceApi(e) => e.is_skippable(),
            CoreError::Workbook(e) => e.is_skippable(),
            CoreError::DataShape(e) => e.is_skippable(),
            CoreError::Render(e) => e.is_skippable(),
            CoreError::Network(_) => true,
            CoreError::InvalidInput { .. } => true,
            _ => false,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::PriceApi(e) => e.user_friendly_message(),
            CoreError::Workbook(e) => e.user_friendly_message(),
            CoreError::DataShape(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Render(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Io(e) => format!("File system error: {}", e),
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            _ => "An unexpected error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::PriceApi(_) => "PRICE_API".to_string(),
            CoreError::Workbook(_) => "WORKBOOK".to_string(),
            CoreError::DataShape(_) => "DATA_SHAPE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Render(_) => "RENDER".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        // Credential problems affect every request, so no further search can succeed.
        !matches!(
            self,
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Reddit asked to wait {} seconds.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. The subreddit may be private or quarantined.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => "Request to Reddit timed out.".to_string(),
            _ => "Reddit API error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for PriceApiError {
    fn log_error(&self) -> &Self {
        error!("PriceApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("PriceApiError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        true
    }

    fn user_friendly_message(&self) -> String {
        match self {
            PriceApiError::UnknownSymbol { symbol } => {
                format!("No price data exists for symbol '{}'.", symbol)
            }
            PriceApiError::EmptyHistory { symbol } => {
                format!("No trading days found for '{}' in the configured range.", symbol)
            }
            PriceApiError::RequestTimeout { symbol } => {
                format!("Price request for '{}' timed out.", symbol)
            }
            _ => "Price service error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            PriceApiError::UnknownSymbol { .. } => "PRICE_UNKNOWN_SYMBOL".to_string(),
            PriceApiError::EmptyHistory { .. } => "PRICE_EMPTY_HISTORY".to_string(),
            PriceApiError::InvalidResponse { .. } => "PRICE_INVALID_RESPONSE".to_string(),
            PriceApiError::ServerError { .. } => "PRICE_SERVER_ERROR".to_string(),
            PriceApiError::RequestTimeout { .. } => "PRICE_TIMEOUT".to_string(),
        }
    }
}

impl ErrorExt for WorkbookError {
    fn log_error(&self) -> &Self {
        error!("WorkbookError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("WorkbookError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        matches!(
            self,
            WorkbookError::SheetNotFound { .. } | WorkbookError::ReadFailed { .. }
        )
    }

    fn user_friendly_message(&self) -> String {
        match self {
            WorkbookError::OpenFailed { path, .. } => format!(
                "Could not open '{}'. Run the previous pipeline stage first.",
                path
            ),
            WorkbookError::SheetNotFound { sheet, .. } => {
                format!("Sheet '{}' is missing from the workbook.", sheet)
            }
            WorkbookError::InvalidSheetName { sheet } => {
                format!("'{}' cannot be used as a sheet name.", sheet)
            }
            WorkbookError::WriteFailed { path, .. } => {
                format!("Could not write '{}'. Is it open in another program?", path)
            }
            _ => "Workbook error occurred.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            WorkbookError::OpenFailed { .. } => "WORKBOOK_OPEN_FAILED".to_string(),
            WorkbookError::SheetNotFound { .. } => "WORKBOOK_SHEET_NOT_FOUND".to_string(),
            WorkbookError::ReadFailed { .. } => "WORKBOOK_READ_FAILED".to_string(),
            WorkbookError::InvalidSheetName { .. } => "WORKBOOK_INVALID_SHEET_NAME".to_string(),
            WorkbookError::WriteFailed { .. } => "WORKBOOK_WRITE_FAILED".to_string(),
            WorkbookError::Xlsx(_) => "WORKBOOK_XLSX".to_string(),
        }
    }
}

impl ErrorExt for DataShapeError {
    fn log_error(&self) -> &Self {
        error!("DataShapeError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DataShapeError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        true
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DataShapeError::MissingColumn { sheet, column } => {
                format!("Sheet '{}' has no '{}' column.", sheet, column)
            }
            DataShapeError::MissingHeader { sheet } => {
                format!("Sheet '{}' is empty.", sheet)
            }
            DataShapeError::InvalidCell {
                sheet, row, column, ..
            } => format!(
                "Sheet '{}' has an unreadable '{}' value in row {}.",
                sheet, column, row
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            DataShapeError::MissingColumn { .. } => "SHAPE_MISSING_COLUMN".to_string(),
            DataShapeError::MissingHeader { .. } => "SHAPE_MISSING_HEADER".to_string(),
            DataShapeError::InvalidCell { .. } => "SHAPE_INVALID_CELL".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        false
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            _ => "Configuration error occurred. Please check your settings.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

impl ErrorExt for RenderError {
    fn log_error(&self) -> &Self {
        error!("RenderError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RenderError (warning): {}", self);
        self
    }

    fn is_skippable(&self) -> bool {
        true
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RenderError::EmptySeries { ticker } => {
                format!("No merged rows to chart for {}.", ticker)
            }
            RenderError::DrawingFailed { ticker, .. } => {
                format!("Could not draw the dashboard for {}.", ticker)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            RenderError::EmptySeries { .. } => "RENDER_EMPTY_SERIES".to_string(),
            RenderError::DrawingFailed { .. } => "RENDER_DRAWING_FAILED".to_string(),
        }
    }
}

/// Logs a stage failure with its code and user-facing message.
pub struct ErrorReporter {
    stage: String,
    verbose: bool,
}

impl ErrorReporter {
    pub fn for_stage(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            verbose: false,
        }
    }

    /// Also log the debug representation of the error.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        error!(
            "[{}] {} ({})",
            self.stage,
            error.user_friendly_message(),
            error.error_code()
        );
        if self.verbose {
            debug!("[{}] {:?}", self.stage, error);
        }
    }

    pub fn report_skip(&self, item: &str, error: &CoreError) {
        warn!(
            "[{}] skipping {}: {} ({})",
            self.stage,
            item,
            error.user_friendly_message(),
            error.error_code()
        );
    }
}
