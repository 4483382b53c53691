use sentiment_core::{
    ConfigError, CoreError, DataShapeError, ErrorExt, ErrorReporter, PriceApiError,
    RedditApiError, WorkbookError,
};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let price_error = CoreError::PriceApi(PriceApiError::EmptyHistory {
        symbol: "GME".to_string(),
    });
    assert_eq!(price_error.error_code(), "PRICE_API");

    let workbook_error = CoreError::Workbook(WorkbookError::SheetNotFound {
        path: "sentiment analysis.xlsx".to_string(),
        sheet: "GME".to_string(),
    });
    assert_eq!(workbook_error.error_code(), "WORKBOOK");

    let shape_error = CoreError::DataShape(DataShapeError::MissingColumn {
        sheet: "GME".to_string(),
        column: "Score".to_string(),
    });
    assert_eq!(shape_error.error_code(), "DATA_SHAPE");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "tickers".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_skippable_errors() {
    let per_item = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "privatesub".to_string(),
    });
    assert!(per_item.is_skippable());

    let missing_sheet = CoreError::Workbook(WorkbookError::SheetNotFound {
        path: "x.xlsx".to_string(),
        sheet: "AMC".to_string(),
    });
    assert!(missing_sheet.is_skippable());

    let bad_credentials = CoreError::RedditApi(RedditApiError::AuthenticationFailed {
        reason: "invalid_client".to_string(),
    });
    assert!(!bad_credentials.is_skippable());

    let unreadable_input = CoreError::Workbook(WorkbookError::OpenFailed {
        path: "reddit_data.xlsx".to_string(),
        reason: "No such file".to_string(),
    });
    assert!(!unreadable_input.is_skippable());

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_ID".to_string(),
    });
    assert!(!config_error.is_skippable());
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_SECRET".to_string(),
    });
    assert!(config_error
        .user_friendly_message()
        .contains("REDDIT_CLIENT_SECRET"));

    let open_error = CoreError::Workbook(WorkbookError::OpenFailed {
        path: "reddit_data.xlsx".to_string(),
        reason: "missing".to_string(),
    });
    assert!(open_error
        .user_friendly_message()
        .contains("Run the previous pipeline stage first"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::for_stage("collect").verbose(true);
    let error = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "pennystocks".to_string(),
    });

    reporter.report_error(&error);
    reporter.report_skip("GME in r/pennystocks", &error);
}
