// rising_utils.rs
use crate::csv_utils::CsvBuilder;
use anyhow::{anyhow, Result as AnyhowResult};

/// Shared district-name key the merged table is joined on.
pub const DISTRICT_KEY: &str = "행정동";
/// District-name column as the hybrid-ranking table spells it; renamed to
/// [`DISTRICT_KEY`] before joining.
pub const RANKING_DISTRICT_COLUMN: &str = "행정동_코드_명";
/// Canonical hybrid-score column name in the merged table.
pub const HYBRID_SCORE_COLUMN: &str = "하이브리드_점수";
/// Suffix applied to search-trend columns that collide during the join.
pub const SEARCH_SUFFIX: &str = "_검색";
/// Suffix applied to hybrid-ranking columns that collide during the join.
pub const RANKING_SUFFIX: &str = "_하이브리드";

/// The nine engineered feature columns the rising-district pipeline looks
/// for in the merged table. Individual exports may carry only a subset;
/// filter with [`available_feature_columns`] before extracting a matrix.
pub const RISING_FEATURE_COLUMNS: [&str; 9] = [
    "CAGR",
    "avg_naver",
    "blog_post",
    "Model2_점수",
    "핫플_유사도_점수",
    "MZ_매출_비중",
    "상권_유입_강도",
    "주말_매출_비중",
    "카페_밀집도",
];

/// Joins the search-trend table with the hybrid-ranking table on the
/// district name, keeping only districts present in both.
///
/// The two tables come from different export pipelines and disagree on the
/// key column's name, so the ranking side's `행정동_코드_명` is renamed to
/// `행정동` first; reconciling that drift is this caller's job, not the
/// join's. Both tables also carry a hybrid-score column, which the join
/// suffixes apart; the search side's copy is collapsed back to the
/// canonical [`HYBRID_SCORE_COLUMN`] name and the other copy dropped, so
/// the merged table carries the score exactly once.
pub fn merge_search_and_ranking(
    search: CsvBuilder,
    mut ranking: CsvBuilder,
) -> AnyhowResult<CsvBuilder> {
    if let Some(e) = search.get_error() {
        return Err(anyhow!("search-trend table failed to load: {}", e));
    }
    if let Some(e) = ranking.get_error() {
        return Err(anyhow!("hybrid-ranking table failed to load: {}", e));
    }

    ranking.rename_columns(vec![(RANKING_DISTRICT_COLUMN, DISTRICT_KEY)]);

    let mut merged = search;
    merged.inner_join_with(
        &ranking,
        DISTRICT_KEY,
        DISTRICT_KEY,
        SEARCH_SUFFIX,
        RANKING_SUFFIX,
    );
    if let Some(e) = merged.get_error() {
        return Err(anyhow!("district merge failed: {}", e));
    }

    let suffixed_search_score = format!("{}{}", HYBRID_SCORE_COLUMN, SEARCH_SUFFIX);
    let suffixed_ranking_score = format!("{}{}", HYBRID_SCORE_COLUMN, RANKING_SUFFIX);
    let has_suffixed_score = merged
        .get_headers()
        .map(|headers| headers.iter().any(|h| h == &suffixed_search_score))
        .unwrap_or(false);
    if has_suffixed_score {
        merged
            .rename_columns(vec![(suffixed_search_score.as_str(), HYBRID_SCORE_COLUMN)])
            .drop_columns(vec![suffixed_ranking_score.as_str()]);
    }

    Ok(merged)
}

/// Sorts the table descending by `score_column` and appends `label_column`
/// marking the first `top_n` rows `1` and the rest `0`.
///
/// This is the labeling rule of the rising-district study: the districts
/// that already rose are the top of the hybrid ranking, everything else is
/// a candidate.
pub fn label_rising(
    mut builder: CsvBuilder,
    score_column: &str,
    top_n: usize,
    label_column: &str,
) -> AnyhowResult<CsvBuilder> {
    if let Some(e) = builder.get_error() {
        return Err(anyhow!("cannot label a failed table: {}", e));
    }
    let has_score = builder
        .get_headers()
        .map(|headers| headers.iter().any(|h| h == score_column))
        .unwrap_or(false);
    if !has_score {
        return Err(anyhow!("score column '{}' not found", score_column));
    }

    builder.cascade_sort(vec![(score_column.to_string(), "DESC".to_string())]);

    let mut headers: Vec<String> = builder.get_headers().unwrap_or(&[]).to_vec();
    headers.push(label_column.to_string());

    let rows = builder.get_data().cloned().unwrap_or_default();
    let labeled: Vec<Vec<String>> = rows
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.push(if i < top_n { "1" } else { "0" }.to_string());
            row
        })
        .collect();

    Ok(CsvBuilder::from_raw_data(headers, labeled))
}

/// The subset of `candidates` actually present in the table's header, in
/// candidate order.
pub fn available_feature_columns(builder: &CsvBuilder, candidates: &[&str]) -> Vec<String> {
    let headers = match builder.get_headers() {
        Some(headers) => headers,
        None => return Vec::new(),
    };

    candidates
        .iter()
        .filter(|c| headers.iter().any(|h| h == *c))
        .map(|c| c.to_string())
        .collect()
}

/// Extracts the named columns as a row-major `f64` matrix.
///
/// Parsing is strict: a cell that does not parse fails the whole
/// extraction, naming the row and column, rather than coercing to zero.
pub fn feature_matrix(builder: &CsvBuilder, columns: &[String]) -> AnyhowResult<Vec<Vec<f64>>> {
    let headers = builder
        .get_headers()
        .ok_or_else(|| anyhow!("table has no headers"))?;

    let mut indices = Vec::with_capacity(columns.len());
    for column in columns {
        let idx = headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| anyhow!("feature column '{}' not found", column))?;
        indices.push(idx);
    }

    let rows = match builder.get_data() {
        Some(rows) => rows,
        None => return Ok(Vec::new()),
    };

    let mut matrix = Vec::with_capacity(rows.len());
    for (row_number, row) in rows.iter().enumerate() {
        let mut features = Vec::with_capacity(indices.len());
        for (&idx, column) in indices.iter().zip(columns) {
            let raw = row.get(idx).map(String::as_str).unwrap_or("");
            let value: f64 = raw.trim().parse().map_err(|_| {
                anyhow!(
                    "row {}, column '{}': '{}' is not numeric",
                    row_number,
                    column,
                    raw
                )
            })?;
            features.push(value);
        }
        matrix.push(features);
    }

    Ok(matrix)
}
