// clustering_utils.rs

use smartcore::cluster::kmeans::{KMeans, KMeansParameters};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::error::Error;

/// Configuration for a k-means pass over a feature matrix.
///
/// `standardize` controls whether columns are z-scored before clustering.
/// The engineered rising-district features mix scales (growth rates against
/// raw post counts), so standardization defaults to on.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    pub standardize: bool,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        KMeansConfig {
            n_clusters: 3,
            standardize: true,
        }
    }
}

/// Z-scores each column of a row-major matrix in place.
///
/// A zero-variance column is centered to all zeros rather than divided by
/// zero, so constant features never poison the distance metric with NaN.
pub fn standardize_columns(matrix: &mut [Vec<f64>]) {
    if matrix.is_empty() {
        return;
    }

    let rows = matrix.len() as f64;
    let columns = matrix[0].len();

    for c in 0..columns {
        let mean = matrix.iter().map(|row| row[c]).sum::<f64>() / rows;
        let variance = matrix
            .iter()
            .map(|row| (row[c] - mean).powi(2))
            .sum::<f64>()
            / rows;
        let std_dev = variance.sqrt();

        for row in matrix.iter_mut() {
            row[c] = if std_dev > 0.0 {
                (row[c] - mean) / std_dev
            } else {
                0.0
            };
        }
    }
}

/// Fits k-means on `matrix` (rows are observations) and returns one cluster
/// id per row.
///
/// This is a single fit-and-predict call into smartcore; there is no
/// cluster-count search or scoring machinery on top of it. An empty matrix
/// yields an empty label vector.
///
/// ```
/// use footfall::clustering_utils::{kmeans_labels, KMeansConfig};
///
/// let matrix = vec![
///     vec![0.0, 0.1],
///     vec![0.2, 0.0],
///     vec![9.8, 10.1],
///     vec![10.0, 9.9],
/// ];
///
/// let config = KMeansConfig { n_clusters: 2, standardize: true };
/// let labels = kmeans_labels(&matrix, &config).expect("clustering failed");
///
/// assert_eq!(labels.len(), 4);
/// assert_eq!(labels[0], labels[1]);
/// assert_eq!(labels[2], labels[3]);
/// assert_ne!(labels[0], labels[2]);
/// ```
pub fn kmeans_labels(
    matrix: &[Vec<f64>],
    config: &KMeansConfig,
) -> Result<Vec<usize>, Box<dyn Error>> {
    if matrix.is_empty() {
        return Ok(Vec::new());
    }

    let mut features = matrix.to_vec();
    if config.standardize {
        standardize_columns(&mut features);
    }

    let observations = DenseMatrix::from_2d_vec(&features);
    let model = KMeans::fit(
        &observations,
        KMeansParameters::default().with_k(config.n_clusters),
    )?;
    let labels: Vec<u8> = model.predict(&observations)?;

    Ok(labels.into_iter().map(|label| label as usize).collect())
}
