// lib.rs
//! # FOOTFALL
//!
//! A RUST toolkit for Seoul rising-commercial-district research 🚀 It loads,
//! queries, merges, and clusters the floating-population (유동인구) CSV
//! exports that Korean open-data portals publish in legacy CJK encodings, and
//! polls the YouTube Data API for district-related video metadata feeding the
//! same study.
//!
//! ## `population_utils`
//!
//! - **Purpose**: Typed, queryable access to the district floating-population
//!   table.
//! - **Features**:
//!   - **PopulationRecord**: One table row with stable ASCII field names and a
//!     documented mapping back to the source's Korean column headers, plus
//!     derived weekend-average and youth-ratio metrics.
//!   - **PopulationStore**: Write-once, read-many store preserving source row
//!     order, with substring/code lookups, stable top-N ranking, citywide and
//!     per-age-band totals, and indexed access.
//!   - **Strict loading**: The encoding is an explicit caller decision (WHATWG
//!     labels; `euc-kr` covers cp949 exports), decoding and integer parsing
//!     are strict, and a load either fills the whole store or fails with a
//!     typed error naming the offending row and column.
//!
//! ## `csv_utils`
//!
//! - **Purpose**: A slim toolkit for the delimited tables around the core
//!   store.
//! - **Features**:
//!   - **CsvBuilder**: Load CSV files (UTF-8, an explicit legacy encoding, or
//!     probing a list of candidate encodings), rename/drop/retain columns,
//!     cascade-sort, limit, save, and print, with chainable methods and
//!     failures parked in the builder's error slot.
//!   - **Inner joins**: Pandas-style key joins with suffix reconciliation for
//!     colliding column names.
//!   - **Cluster append**: Attach a k-means cluster-id column computed from
//!     named numeric feature columns.
//!
//! ## `rising_utils`
//!
//! - **Purpose**: Data preparation for the rising-district study.
//! - **Features**:
//!   - Reconcile and inner-join the search-trend and hybrid-ranking tables on
//!     the district-name key, collapsing the duplicated hybrid-score column.
//!   - Label the top-N districts by hybrid score as risen.
//!   - Select the available engineered feature columns and extract a strict
//!     `f64` feature matrix for clustering.
//!
//! ## `clustering_utils`
//!
//! - **Purpose**: A thin k-means pass over engineered district features.
//! - **Features**:
//!   - Per-column z-score standardization with zero-variance guards.
//!   - A single smartcore fit-and-predict call returning one cluster id per
//!     row; no cluster-count search machinery.
//!
//! ## `video_api_utils`
//!
//! - **Purpose**: Poll the YouTube Data API for video details referenced by
//!   earlier keyword searches.
//! - **Features**:
//!   - Extract video ids from saved search artifacts.
//!   - Fetch details in API-sized batches of 50 ids and accumulate them into
//!     a single `youtube#videoListResponse` envelope.
//!   - Persist timestamped JSON artifacts alongside the other pipeline
//!     outputs.
//!
//! ## License
//!
//! This project is licensed under the MIT License.

pub mod clustering_utils;
pub mod csv_utils;
pub mod population_utils;
pub mod rising_utils;
pub mod video_api_utils;
