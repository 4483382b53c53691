use chrono::NaiveDate;
use sentiment_core::sheets::{
    merged_sheet_name, read_correlations, read_merged, read_raw_posts, read_weekly,
    write_correlations, write_merged, write_raw_posts, write_weekly, CORRELATION_SHEET,
};
use sentiment_core::workbook::{WorkbookReader, WorkbookWriter};
use sentiment_core::{
    CorrelationResult, DataShapeError, MergedRecord, PriceMetric, RawPost, SentimentFeature,
    WeeklySentiment, WorkbookError,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_raw_posts_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reddit_data.xlsx");

    let posts = vec![
        RawPost {
            title: "gamestop share moon".to_string(),
            score: 120,
            date: day(2024, 1, 3).and_hms_opt(14, 5, 9).unwrap(),
            comments: 33,
            body: String::new(),
            subreddit: "wallstreetbets".to_string(),
        },
        RawPost {
            title: "gme earnings".to_string(),
            score: -2,
            date: day(2024, 1, 7).and_hms_opt(0, 0, 0).unwrap(),
            comments: 0,
            body: "thought earnings".to_string(),
            subreddit: "stocks".to_string(),
        },
    ];

    let mut writer = WorkbookWriter::new();
    write_raw_posts(&mut writer, "GME", &posts).unwrap();
    writer.save(&path).unwrap();
    assert!(!dir.path().join("reddit_data.xlsx.partial").exists());

    let mut reader = WorkbookReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["GME".to_string()]);
    let loaded = read_raw_posts(&reader.sheet("GME").unwrap()).unwrap();
    assert_eq!(loaded, posts);
}

#[test]
fn test_weekly_and_merged_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xlsx");

    let weeks = vec![WeeklySentiment {
        date: day(2024, 1, 7),
        compound_sentiment: 0.25,
        weighted_sentiment: 3.5,
        mentions: 4,
        engagement_metrics: 12.0,
    }];
    let merged = vec![
        MergedRecord {
            date: day(2024, 1, 7),
            adjusted_date: day(2024, 1, 5),
            compound_sentiment: 0.25,
            weighted_sentiment: 3.5,
            mentions: 4,
            engagement_metrics: 12.0,
            close: 10.0,
            returns: None,
        },
        MergedRecord {
            date: day(2024, 1, 14),
            adjusted_date: day(2024, 1, 12),
            compound_sentiment: -0.1,
            weighted_sentiment: -1.0,
            mentions: 1,
            engagement_metrics: 5.0,
            close: 11.0,
            returns: Some(10.0),
        },
    ];
    let correlations = vec![CorrelationResult {
        stock: "GME".to_string(),
        sentiment_component: SentimentFeature::Mentions,
        stock_price_metric: PriceMetric::Returns,
        correlation: -0.5,
        p_value: 0.25,
    }];

    let mut writer = WorkbookWriter::new();
    write_weekly(&mut writer, "GME", &weeks).unwrap();
    write_merged(&mut writer, &merged_sheet_name("GME"), &merged).unwrap();
    write_correlations(&mut writer, &correlations).unwrap();
    writer.save(&path).unwrap();

    let mut reader = WorkbookReader::open(&path).unwrap();
    assert_eq!(read_weekly(&reader.sheet("GME").unwrap()).unwrap(), weeks);
    assert_eq!(
        read_merged(&reader.sheet("GME_Merged_Data").unwrap()).unwrap(),
        merged
    );
    assert_eq!(
        read_correlations(&reader.sheet(CORRELATION_SHEET).unwrap()).unwrap(),
        correlations
    );
}

#[test]
fn test_missing_column_is_data_shape_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weekly.xlsx");

    let mut writer = WorkbookWriter::new();
    {
        let mut sheet = writer
            .add_sheet("AMC", &["Date", "Compound_Sentiment", "Mentions"])
            .unwrap();
        sheet
            .write_row(&[
                sentiment_core::workbook::Cell::Date(day(2024, 1, 7)),
                sentiment_core::workbook::Cell::Number(0.1),
                sentiment_core::workbook::Cell::Integer(2),
            ])
            .unwrap();
    }
    writer.save(&path).unwrap();

    let mut reader = WorkbookReader::open(&path).unwrap();
    let err = read_weekly(&reader.sheet("AMC").unwrap()).unwrap_err();
    assert_eq!(
        err,
        DataShapeError::MissingColumn {
            sheet: "AMC".to_string(),
            column: "Weighted_Sentiment".to_string(),
        }
    );
}

#[test]
fn test_missing_sheet_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.xlsx");
    assert!(matches!(
        WorkbookReader::open(&missing),
        Err(WorkbookError::OpenFailed { .. })
    ));

    let path = dir.path().join("one.xlsx");
    let mut writer = WorkbookWriter::new();
    write_weekly(&mut writer, "GME", &[]).unwrap();
    writer.save(&path).unwrap();

    let mut reader = WorkbookReader::open(&path).unwrap();
    assert!(matches!(
        reader.sheet("TSLA"),
        Err(WorkbookError::SheetNotFound { .. })
    ));
    assert!(read_weekly(&reader.sheet("GME").unwrap()).unwrap().is_empty());
}

#[test]
fn test_save_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("weekly.xlsx");

    let mut first = WorkbookWriter::new();
    write_weekly(&mut first, "GME", &[]).unwrap();
    write_weekly(&mut first, "AMC", &[]).unwrap();
    first.save(&path).unwrap();

    let mut second = WorkbookWriter::new();
    write_weekly(&mut second, "TSLA", &[]).unwrap();
    second.save(&path).unwrap();

    let reader = WorkbookReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["TSLA".to_string()]);
}
