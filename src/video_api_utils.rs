// video_api_utils.rs
use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;

/// YouTube Data API v3 videos endpoint.
pub const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";
/// The API rejects more than 50 video ids per call.
pub const MAX_IDS_PER_CALL: usize = 50;
/// Default `part` selection for a details fetch.
pub const DEFAULT_PARTS: [&str; 3] = ["snippet", "contentDetails", "statistics"];

/// Pagination block of a `youtube#videoListResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "totalResults")]
    pub total_results: usize,
    #[serde(rename = "resultsPerPage")]
    pub results_per_page: usize,
}

/// The artifact envelope a details fetch is persisted as: the same
/// `youtube#videoListResponse` shape the API itself returns, with the items
/// of every batch accumulated into one list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoListArtifact {
    pub kind: String,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    pub items: Vec<Value>,
}

/// Pulls the video ids out of a saved search-result artifact
/// (`items[].id.videoId`). Items without a `videoId` (channel or playlist
/// hits) are skipped.
pub fn extract_video_ids(search_result: &Value) -> Vec<String> {
    search_result
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.get("id")?
                        .get("videoId")?
                        .as_str()
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a search-result JSON file and extracts its video ids.
pub fn extract_video_ids_from_file(path: &str) -> Result<Vec<String>, Box<dyn StdError>> {
    let text = fs::read_to_string(path)?;
    let search_result: Value = serde_json::from_str(&text)?;
    Ok(extract_video_ids(&search_result))
}

/// Splits `video_ids` into request-sized batches, preserving order.
pub fn batch_ids(video_ids: &[String], batch_size: usize) -> Vec<&[String]> {
    video_ids.chunks(batch_size.max(1)).collect()
}

/// Fetches details for `video_ids` from the videos endpoint, one GET per
/// batch of up to [`MAX_IDS_PER_CALL`] ids, and accumulates the items into
/// a single [`VideoListArtifact`].
///
/// A failed batch fails the whole fetch; there is no retry or backoff
/// layer, quota errors surface to the caller as-is.
pub async fn fetch_video_details(
    api_key: &str,
    video_ids: &[String],
    parts: &[&str],
) -> Result<VideoListArtifact, Box<dyn StdError>> {
    let client = Client::new();
    let part_param = parts.join(",");

    let mut all_items: Vec<Value> = Vec::new();
    for batch in batch_ids(video_ids, MAX_IDS_PER_CALL) {
        let id_param = batch.join(",");

        let response = client
            .get(VIDEOS_ENDPOINT)
            .query(&[
                ("key", api_key),
                ("part", part_param.as_str()),
                ("id", id_param.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let mut payload: Value = response.json().await?;
        let batch_count = match payload.get_mut("items").and_then(Value::as_array_mut) {
            Some(items) => {
                let count = items.len();
                all_items.append(items);
                count
            }
            None => 0,
        };
        println!(
            "Fetched {} videos in batch ({} total).",
            batch_count,
            all_items.len()
        );
    }

    let total = all_items.len();
    Ok(VideoListArtifact {
        kind: "youtube#videoListResponse".to_string(),
        page_info: PageInfo {
            total_results: total,
            results_per_page: total,
        },
        items: all_items,
    })
}

/// Writes the artifact as pretty-printed UTF-8 JSON named
/// `{prefix}_{YYYYmmdd_HHMMSS}.json` under `dir`, returning the full path.
pub fn save_timestamped_artifact(
    artifact: &VideoListArtifact,
    dir: &str,
    prefix: &str,
) -> Result<String, Box<dyn StdError>> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let file_name = format!("{}_{}.json", prefix, timestamp);
    let path = Path::new(dir).join(file_name);

    fs::write(&path, serde_json::to_string_pretty(artifact)?)?;

    Ok(path.to_string_lossy().into_owned())
}
