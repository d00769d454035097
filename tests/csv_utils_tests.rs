// csv_utils_tests.rs
use csv::Writer;
use footfall::clustering_utils::KMeansConfig;
use footfall::csv_utils::CsvBuilder;
use std::io::Write as IoWrite;

fn strings(cells: Vec<&str>) -> Vec<String> {
    cells.into_iter().map(String::from).collect()
}

#[test]
fn from_csv_reads_headers_and_rows() {
    let tmp_file = tempfile::Builder::new()
        .prefix("csv_test")
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temporary file");

    let mut writer = Writer::from_path(tmp_file.path()).expect("csv writer");
    writer.write_record(["행정동", "CAGR"]).expect("header");
    writer.write_record(["성수동", "0.41"]).expect("row");
    writer.write_record(["연남동", "0.28"]).expect("row");
    writer.flush().expect("flush");

    let builder = CsvBuilder::from_csv(tmp_file.path().to_str().unwrap());

    assert!(builder.get_error().is_none());
    assert_eq!(builder.get_headers().unwrap(), &strings(vec!["행정동", "CAGR"]));
    assert_eq!(builder.get_data().unwrap().len(), 2);
}

#[test]
fn from_csv_on_a_missing_file_parks_an_error() {
    let builder = CsvBuilder::from_csv("/no/such/dir/table.csv");

    assert!(builder.get_error().is_some());
    assert!(builder.get_headers().is_none());
    assert!(builder.get_data().is_none());
}

#[test]
fn from_csv_with_encoding_reads_euc_kr() {
    let content = "행정동,점수\n성수동,91.2\n연남동,88.4\n";
    let (encoded, _, had_errors) = encoding_rs::EUC_KR.encode(content);
    assert!(!had_errors);

    let mut tmp_file = tempfile::Builder::new()
        .prefix("csv_euckr")
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temporary file");
    tmp_file.write_all(&encoded).expect("write fixture");
    tmp_file.flush().expect("flush fixture");
    let path = tmp_file.path().to_str().unwrap();

    let builder = CsvBuilder::from_csv_with_encoding(path, "euc-kr");
    assert!(builder.get_error().is_none());
    assert_eq!(builder.get_data().unwrap()[0][0], "성수동");

    // strict decode: the same bytes are not valid utf-8
    let wrong = CsvBuilder::from_csv_with_encoding(path, "utf-8");
    assert!(wrong.get_error().is_some());

    // unknown labels are rejected up front
    let unknown = CsvBuilder::from_csv_with_encoding(path, "klingon-8");
    assert!(unknown.get_error().is_some());
}

#[test]
fn from_csv_auto_probes_to_the_working_encoding() {
    let content = "행정동,점수\n망원동,77.0\n";
    let (encoded, _, _) = encoding_rs::EUC_KR.encode(content);

    let mut tmp_file = tempfile::Builder::new()
        .prefix("csv_auto")
        .suffix(".csv")
        .tempfile()
        .expect("failed to create temporary file");
    tmp_file.write_all(&encoded).expect("write fixture");
    tmp_file.flush().expect("flush fixture");

    let builder = CsvBuilder::from_csv_auto(
        tmp_file.path().to_str().unwrap(),
        vec!["utf-8", "euc-kr"],
    );

    assert!(builder.get_error().is_none());
    assert_eq!(builder.get_data().unwrap()[0][0], "망원동");

    let exhausted = CsvBuilder::from_csv_auto(tmp_file.path().to_str().unwrap(), vec!["utf-8"]);
    assert!(exhausted.get_error().is_some());
}

#[test]
fn rename_drop_and_retain_reshape_columns() {
    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동_코드_명", "점수", "비고"]),
        vec![strings(vec!["성수동", "91.2", "x"])],
    );

    builder
        .rename_columns(vec![("행정동_코드_명", "행정동")])
        .drop_columns(vec!["비고"]);
    assert_eq!(builder.get_headers().unwrap(), &strings(vec!["행정동", "점수"]));
    assert_eq!(builder.get_data().unwrap()[0], strings(vec!["성수동", "91.2"]));

    builder.retain_columns(vec!["점수"]);
    assert_eq!(builder.get_headers().unwrap(), &strings(vec!["점수"]));
    assert_eq!(builder.get_data().unwrap()[0], strings(vec!["91.2"]));
}

#[test]
fn cascade_sort_orders_numerically_then_by_string() {
    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "점수"]),
        vec![
            strings(vec!["연남동", "88.4"]),
            strings(vec!["성수동", "91.2"]),
            strings(vec!["망원동", "88.4"]),
        ],
    );

    builder.cascade_sort(vec![
        ("점수".to_string(), "DESC".to_string()),
        ("행정동".to_string(), "ASC".to_string()),
    ]);

    let names: Vec<&str> = builder
        .get_data()
        .unwrap()
        .iter()
        .map(|row| row[0].as_str())
        .collect();
    assert_eq!(names, vec!["성수동", "망원동", "연남동"]);
}

#[test]
fn limit_truncates_rows() {
    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["n"]),
        vec![strings(vec!["1"]), strings(vec!["2"]), strings(vec!["3"])],
    );

    builder.limit(2);
    assert_eq!(builder.get_data().unwrap().len(), 2);
}

#[test]
fn inner_join_keeps_shared_keys_and_suffixes_collisions() {
    let mut search = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR", "점수"]),
        vec![
            strings(vec!["성수동", "0.41", "91.2"]),
            strings(vec!["연남동", "0.28", "88.4"]),
            strings(vec!["망원동", "0.19", "77.0"]),
        ],
    );
    let ranking = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "MZ_매출_비중", "점수"]),
        vec![
            strings(vec!["성수동", "0.55", "89.0"]),
            strings(vec!["연남동", "0.48", "85.5"]),
            strings(vec!["연남동", "0.50", "86.0"]),
            strings(vec!["을지로동", "0.33", "70.1"]),
        ],
    );

    search.inner_join_with(&ranking, "행정동", "행정동", "_검색", "_하이브리드");

    assert!(search.get_error().is_none());
    assert_eq!(
        search.get_headers().unwrap(),
        &strings(vec!["행정동", "CAGR", "점수_검색", "MZ_매출_비중", "점수_하이브리드"])
    );

    // 망원동 and 을지로동 appear on one side only; the duplicated 연남동
    // ranking rows cross-product with the single search row
    let rows = search.get_data().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], strings(vec!["성수동", "0.41", "91.2", "0.55", "89.0"]));
    assert_eq!(rows[1], strings(vec!["연남동", "0.28", "88.4", "0.48", "85.5"]));
    assert_eq!(rows[2], strings(vec!["연남동", "0.28", "88.4", "0.50", "86.0"]));
}

#[test]
fn inner_join_with_a_missing_key_parks_an_error() {
    let mut left = CsvBuilder::from_raw_data(
        strings(vec!["행정동"]),
        vec![strings(vec!["성수동"])],
    );
    let right = CsvBuilder::from_raw_data(
        strings(vec!["다른키"]),
        vec![strings(vec!["성수동"])],
    );

    left.inner_join_with(&right, "행정동", "행정동", "_a", "_b");
    assert!(left.get_error().is_some());
}

#[test]
fn append_kmeans_cluster_column_labels_every_row() {
    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR", "MZ_매출_비중"]),
        vec![
            strings(vec!["a1", "0.1", "0.2"]),
            strings(vec!["a2", "0.2", "0.1"]),
            strings(vec!["a3", "0.15", "0.15"]),
            strings(vec!["b1", "9.8", "10.1"]),
            strings(vec!["b2", "10.0", "9.9"]),
            strings(vec!["b3", "10.2", "10.0"]),
        ],
    );

    builder.append_kmeans_cluster_column(
        vec!["CAGR", "MZ_매출_비중"],
        "클러스터",
        KMeansConfig {
            n_clusters: 2,
            standardize: true,
        },
    );

    assert!(builder.get_error().is_none());
    assert_eq!(
        builder.get_headers().unwrap().last().map(String::as_str),
        Some("클러스터")
    );

    let rows = builder.get_data().unwrap();
    let labels: Vec<&str> = rows.iter().map(|row| row[3].as_str()).collect();
    assert_eq!(labels.len(), 6);
    // the two planar blobs land in different clusters
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[1], labels[2]);
    assert_eq!(labels[3], labels[4]);
    assert_eq!(labels[4], labels[5]);
    assert_ne!(labels[0], labels[3]);
}

#[test]
fn append_kmeans_cluster_column_rejects_non_numeric_features() {
    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "CAGR"]),
        vec![strings(vec!["성수동", "많음"])],
    );

    builder.append_kmeans_cluster_column(
        vec!["CAGR"],
        "클러스터",
        KMeansConfig::default(),
    );

    assert!(builder.get_error().is_some());
    // the failed append leaves the table unchanged
    assert_eq!(builder.get_headers().unwrap().len(), 2);
}

#[test]
fn save_as_round_trips_through_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("merged.csv");
    let path_str = path.to_str().unwrap();

    let mut builder = CsvBuilder::from_raw_data(
        strings(vec!["행정동", "점수"]),
        vec![
            strings(vec!["성수동", "91.2"]),
            strings(vec!["연남동", "88.4"]),
        ],
    );
    builder.save_as(path_str).expect("save failed");

    let reloaded = CsvBuilder::from_csv(path_str);
    assert_eq!(reloaded.get_headers(), builder.get_headers());
    assert_eq!(reloaded.get_data(), builder.get_data());
}

#[test]
fn chained_calls_after_an_error_are_no_ops() {
    let mut builder = CsvBuilder::from_csv("/no/such/dir/table.csv");

    builder
        .set_header(vec!["a", "b"])
        .add_row(vec!["1", "2"])
        .rename_columns(vec![("a", "c")]);

    assert!(builder.get_error().is_some());
    assert!(builder.get_headers().is_none());
    assert!(builder.get_data().is_none());
}

#[test]
fn from_copy_clears_the_error_slot() {
    let failed = CsvBuilder::from_csv("/no/such/dir/table.csv");
    let copy = failed.from_copy();

    assert!(copy.get_error().is_none());
    assert!(!copy.has_data());
}
