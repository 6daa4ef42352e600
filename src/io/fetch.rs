//! Download of the raw housing CSV.
//!
//! A single blocking GET; any failure is reported as `RemoteFetch` and the run
//! stops. Retrying is left to whoever launches the pipeline.

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::info;

use crate::error::{HousingError, Result};

pub const DEFAULT_HOUSING_URL: &str =
    "https://raw.githubusercontent.com/ageron/handson-ml/master/datasets/housing/housing.csv";

/// Download `url` into `dest`, creating parent directories as needed.
pub fn fetch_housing_csv(url: &str, dest: &Path) -> Result<u64> {
    let fetch_err = |detail: String| HousingError::RemoteFetch {
        url: url.to_string(),
        detail,
    };

    let client = Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| fetch_err(format!("client setup failed: {e}")))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| fetch_err(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("HTTP {status}")));
    }
    let body = response.bytes().map_err(|e| fetch_err(e.to_string()))?;
    if body.is_empty() {
        return Err(fetch_err("empty response body".to_string()));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| HousingError::io(format!("Failed to create '{}'", parent.display()), e))?;
    }
    fs::write(dest, &body)
        .map_err(|e| HousingError::io(format!("Failed to write '{}'", dest.display()), e))?;

    info!(url, dest = %dest.display(), bytes = body.len(), "housing dataset downloaded");
    Ok(body.len() as u64)
}
