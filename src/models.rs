//! Model listing for the custom inference endpoint.
//!
//! `GET /api/v2/models` answers with a map keyed by numeric model id:
//! `{ "1": { model_name, version, task, description }, ... }`.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const MODELS_PATH: &str = "/api/v2/models";

#[derive(Clone, Debug, Deserialize)]
struct ModelEntry {
    model_name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    task: String,
    #[serde(default)]
    description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub model_id: u32,
    pub model_name: String,
    pub version: String,
    pub task: String,
    pub description: String,
}

/// Resolve the listing URL on the origin of `base`.
pub fn listing_url(base: &str) -> Result<Url> {
    let base = Url::parse(base).with_context(|| format!("parse models url '{}'", base))?;
    base.join(MODELS_PATH)
        .with_context(|| format!("join {} onto {}", MODELS_PATH, base))
}

/// Fetch and parse the model listing.
pub fn fetch_models(url: &Url, timeout: Duration) -> Result<Vec<ModelInfo>> {
    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent.get(url.as_str()).call().map_err(|e| match e {
        ureq::Error::Status(code, response) => anyhow!(
            "Failed to fetch models: {} {}",
            code,
            response.status_text()
        ),
        ureq::Error::Transport(transport) => anyhow!("Failed to fetch models: {}", transport),
    })?;
    let body = response.into_string().context("read models response")?;
    parse_models(&body)
}

/// Parse a listing body, ordered by model id ascending.
///
/// Entries whose key is not a number are skipped.
pub fn parse_models(body: &str) -> Result<Vec<ModelInfo>> {
    let raw: HashMap<String, ModelEntry> =
        serde_json::from_str(body).map_err(|e| anyhow!("invalid models response: {}", e))?;
    let mut models: Vec<ModelInfo> = raw
        .into_iter()
        .filter_map(|(key, entry)| match key.trim().parse::<u32>() {
            Ok(model_id) => Some(ModelInfo {
                model_id,
                model_name: entry.model_name,
                version: entry.version,
                task: entry.task,
                description: entry.description,
            }),
            Err(_) => {
                log::warn!("skipping model with non-numeric id '{}'", key);
                None
            }
        })
        .collect();
    models.sort_by_key(|model| model.model_id);
    Ok(models)
}

/// The model used when none was chosen: the first one listed.
pub fn default_model(models: &[ModelInfo]) -> Option<&ModelInfo> {
    models.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_sorted_by_id() {
        let body = r#"{
            "10": {"model_name": "rtdetr", "version": "2", "task": "detect", "description": "d"},
            "2": {"model_name": "yolov8n", "version": "8", "task": "detect", "description": "small"},
            "x": {"model_name": "bogus"}
        }"#;
        let models = parse_models(body).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.model_name.as_str()).collect();
        assert_eq!(names, vec!["yolov8n", "rtdetr"]);
        assert_eq!(default_model(&models).unwrap().model_id, 2);
    }

    #[test]
    fn listing_url_uses_origin() {
        let url = listing_url("http://10.0.0.5:8080/predict").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/api/v2/models");
    }

    #[test]
    fn rejects_non_object_body() {
        assert!(parse_models("[1,2,3]").is_err());
    }
}
