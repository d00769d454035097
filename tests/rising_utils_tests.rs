// rising_utils_tests.rs
use footfall::csv_utils::CsvBuilder;
use footfall::rising_utils::{
    available_feature_columns, feature_matrix, label_rising, merge_search_and_ranking,
    HYBRID_SCORE_COLUMN, RISING_FEATURE_COLUMNS,
};

fn strings(cells: Vec<&str>) -> Vec<String> {
    cells.into_iter().map(String::from).collect()
}

fn search_table() -> CsvBuilder {
    CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR", "하이브리드_점수"]),
        vec![
            strings(vec!["성수동", "0.41", "91.2"]),
            strings(vec!["연남동", "0.28", "88.4"]),
            strings(vec!["망원동", "0.19", "77.0"]),
        ],
    )
}

fn ranking_table() -> CsvBuilder {
    CsvBuilder::from_raw_data(
        strings(vec!["행정동_코드_명", "MZ_매출_비중", "하이브리드_점수"]),
        vec![
            strings(vec!["성수동", "0.55", "89.0"]),
            strings(vec!["망원동", "0.37", "75.5"]),
            strings(vec!["한남동", "0.44", "81.3"]),
        ],
    )
}

#[test]
fn merge_keeps_only_districts_present_in_both_tables() {
    let merged = merge_search_and_ranking(search_table(), ranking_table()).expect("merge failed");

    let rows = merged.get_data().expect("merged rows");
    let districts: Vec<&str> = rows.iter().map(|row| row[0].as_str()).collect();
    // 연남동 is search-only and 한남동 is ranking-only
    assert_eq!(districts, vec!["성수동", "망원동"]);
}

#[test]
fn merge_collapses_the_duplicated_score_column() {
    let merged = merge_search_and_ranking(search_table(), ranking_table()).expect("merge failed");

    let headers = merged.get_headers().expect("merged headers");
    let score_columns = headers
        .iter()
        .filter(|h| h.contains(HYBRID_SCORE_COLUMN))
        .count();
    assert_eq!(score_columns, 1);
    assert!(headers.iter().any(|h| h == HYBRID_SCORE_COLUMN));
    assert!(headers.iter().any(|h| h == "CAGR"));
    assert!(headers.iter().any(|h| h == "MZ_매출_비중"));

    // the collapsed score keeps the search-side values
    let rows = merged.get_data().expect("merged rows");
    let score_idx = headers.iter().position(|h| h == HYBRID_SCORE_COLUMN).unwrap();
    assert_eq!(rows[0][score_idx], "91.2");
}

#[test]
fn merge_surfaces_load_failures() {
    let failed = CsvBuilder::from_csv("/no/such/dir/search.csv");

    assert!(merge_search_and_ranking(failed, ranking_table()).is_err());
}

#[test]
fn label_rising_marks_the_top_n_after_sorting() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "하이브리드_점수"]),
        vec![
            strings(vec!["망원동", "10"]),
            strings(vec!["성수동", "50"]),
            strings(vec!["연남동", "30"]),
            strings(vec!["한남동", "20"]),
        ],
    );

    let labeled =
        label_rising(builder, HYBRID_SCORE_COLUMN, 2, "라이징여부").expect("labeling failed");

    assert_eq!(
        labeled.get_headers().unwrap().last().map(String::as_str),
        Some("라이징여부")
    );

    let rows = labeled.get_data().expect("labeled rows");
    let ordered: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| (row[0].as_str(), row[2].as_str()))
        .collect();
    assert_eq!(
        ordered,
        vec![
            ("성수동", "1"),
            ("연남동", "1"),
            ("한남동", "0"),
            ("망원동", "0"),
        ]
    );
}

#[test]
fn label_rising_with_a_large_n_marks_everything() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "하이브리드_점수"]),
        vec![strings(vec!["성수동", "50"]), strings(vec!["연남동", "30"])],
    );

    let labeled =
        label_rising(builder, HYBRID_SCORE_COLUMN, 10, "라이징여부").expect("labeling failed");

    let rows = labeled.get_data().expect("labeled rows");
    assert!(rows.iter().all(|row| row[2] == "1"));
}

#[test]
fn label_rising_requires_the_score_column() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동"]),
        vec![strings(vec!["성수동"])],
    );

    assert!(label_rising(builder, HYBRID_SCORE_COLUMN, 2, "라이징여부").is_err());
}

#[test]
fn available_feature_columns_filters_to_the_header() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "MZ_매출_비중", "CAGR"]),
        vec![],
    );

    let available = available_feature_columns(&builder, &RISING_FEATURE_COLUMNS);
    // candidate order, not header order
    assert_eq!(available, strings(vec!["CAGR", "MZ_매출_비중"]));

    let empty = CsvBuilder::new();
    assert!(available_feature_columns(&empty, &RISING_FEATURE_COLUMNS).is_empty());
}

#[test]
fn feature_matrix_extracts_selected_columns_row_major() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR", "MZ_매출_비중"]),
        vec![
            strings(vec!["성수동", "0.41", "0.55"]),
            strings(vec!["망원동", "0.19", "0.37"]),
        ],
    );

    let columns = strings(vec!["CAGR", "MZ_매출_비중"]);
    let matrix = feature_matrix(&builder, &columns).expect("extraction failed");

    assert_eq!(matrix, vec![vec![0.41, 0.55], vec![0.19, 0.37]]);
}

#[test]
fn feature_matrix_is_strict_about_numbers() {
    let builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR"]),
        vec![strings(vec!["성수동", "높음"])],
    );

    let columns = strings(vec!["CAGR"]);
    let err = feature_matrix(&builder, &columns).expect_err("expected strict parse failure");
    assert!(err.to_string().contains("CAGR"));

    let missing = strings(vec!["카페_밀집도"]);
    assert!(feature_matrix(&builder, &missing).is_err());
}
