// Application state module
// Everything request handlers read; built once at startup, never mutated

use hyper::body::Bytes;
use std::sync::Arc;

use super::types::Config;
use crate::dataset::Dataset;
use crate::http::cache;

/// Application state
pub struct AppState {
    pub config: Config,
    pub dataset: Arc<Dataset>,

    // Pre-rendered responses, identical for every request
    pub dataset_json: Bytes,
    pub dataset_etag: String,
    pub index_page: Bytes,
}

impl AppState {
    /// Create `AppState`, serializing the dataset once up front
    pub fn new(
        config: Config,
        dataset: Arc<Dataset>,
        index_page: String,
    ) -> Result<Self, serde_json::Error> {
        let dataset_json = Bytes::from(serde_json::to_vec(dataset.as_ref())?);
        let dataset_etag = cache::generate_etag(&dataset_json);

        Ok(Self {
            config,
            dataset,
            dataset_json,
            dataset_etag,
            index_page: Bytes::from(index_page),
        })
    }
}
