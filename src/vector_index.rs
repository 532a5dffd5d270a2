//! Pinecone vector index client.
//!
//! Two surfaces, both plain reqwest against the REST API:
//!
//! - **Control plane** — [`ensure_index`] resolves the index's data-plane
//!   host at startup, creating a serverless index when it does not exist
//!   yet. Skipped entirely when `PINECONE_INDEX_HOST` is configured.
//! - **Data plane** — [`upsert`] and [`query`] against the resolved host.
//!
//! Request-path calls are single-shot: failures surface to the route
//! boundary and are never retried.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::PineconeConfig;
use crate::models::{ScoredMatch, VectorRecord};

const API_VERSION: &str = "2025-01";

/// How long to wait for a freshly created index to become ready.
const CREATE_READY_ATTEMPTS: u32 = 30;
const CREATE_READY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

/// Resolve the data-plane host for the configured index.
///
/// Describes the index via the control plane; on 404, creates a serverless
/// index (cosine metric, AWS us-east-1, matching the original deployment)
/// and waits for it to report ready. With `index_host` configured, returns
/// it as-is without any network call.
pub async fn ensure_index(
    client: &reqwest::Client,
    config: &PineconeConfig,
    dimension: usize,
) -> Result<String> {
    if let Some(host) = &config.index_host {
        return Ok(normalize_host(host));
    }

    if let Some(desc) = describe_index(client, config).await? {
        return Ok(normalize_host(&desc.host));
    }

    tracing::info!(index = %config.index_name, "Creating Pinecone index");
    create_index(client, config, dimension).await?;

    // A new serverless index takes a few seconds to come up.
    for _ in 0..CREATE_READY_ATTEMPTS {
        if let Some(desc) = describe_index(client, config).await? {
            if desc.status.ready {
                return Ok(normalize_host(&desc.host));
            }
        }
        tokio::time::sleep(CREATE_READY_DELAY).await;
    }

    bail!(
        "Pinecone index '{}' did not become ready in time",
        config.index_name
    )
}

async fn describe_index(
    client: &reqwest::Client,
    config: &PineconeConfig,
) -> Result<Option<IndexDescription>> {
    let response = client
        .get(format!(
            "{}/indexes/{}",
            config.control_plane_url, config.index_name
        ))
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Ok(None);
    }
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Pinecone describe index error {}: {}", status, body_text);
    }

    Ok(Some(response.json().await?))
}

async fn create_index(
    client: &reqwest::Client,
    config: &PineconeConfig,
    dimension: usize,
) -> Result<()> {
    let body = serde_json::json!({
        "name": config.index_name,
        "dimension": dimension,
        "metric": "cosine",
        "spec": {
            "serverless": { "cloud": "aws", "region": "us-east-1" }
        },
    });

    let response = client
        .post(format!("{}/indexes", config.control_plane_url))
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Pinecone create index error {}: {}", status, body_text);
    }
    Ok(())
}

/// Upsert vector records into the index. Returns the upserted count.
pub async fn upsert(
    client: &reqwest::Client,
    config: &PineconeConfig,
    host: &str,
    vectors: &[VectorRecord],
) -> Result<u64> {
    let body = serde_json::json!({ "vectors": vectors });

    let response = client
        .post(format!("{}/vectors/upsert", host))
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Pinecone upsert error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    Ok(json
        .get("upsertedCount")
        .and_then(|c| c.as_u64())
        .unwrap_or(vectors.len() as u64))
}

/// Similarity search: return the `top_k` nearest records with metadata.
pub async fn query(
    client: &reqwest::Client,
    config: &PineconeConfig,
    host: &str,
    vector: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredMatch>> {
    let body = serde_json::json!({
        "vector": vector,
        "topK": top_k,
        "includeMetadata": true,
    });

    let response = client
        .post(format!("{}/query", host))
        .header("Api-Key", &config.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Pinecone query error {}: {}", status, body_text);
    }

    let parsed: QueryResponse = response.json().await?;
    Ok(parsed.matches)
}

/// Pinecone returns hosts without a scheme; the data-plane is HTTPS-only.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn mock_pinecone(control_plane_url: String, index_host: Option<String>) -> PineconeConfig {
        PineconeConfig {
            api_key: "test-key".to_string(),
            index_name: "test-index".to_string(),
            index_host,
            control_plane_url,
        }
    }

    #[test]
    fn normalize_host_adds_scheme() {
        assert_eq!(
            normalize_host("my-index-abc.svc.pinecone.io"),
            "https://my-index-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:9000/"), "http://localhost:9000");
    }

    #[tokio::test]
    async fn ensure_index_prefers_configured_host() {
        let client = reqwest::Client::new();
        let config = mock_pinecone(
            "https://unreachable.invalid".to_string(),
            Some("my-index.svc.pinecone.io".to_string()),
        );
        let host = ensure_index(&client, &config, 384).await.unwrap();
        assert_eq!(host, "https://my-index.svc.pinecone.io");
    }

    #[tokio::test]
    async fn ensure_index_resolves_host_from_control_plane() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/indexes/test-index")
                    .header("Api-Key", "test-key");
                then.status(200).json_body(serde_json::json!({
                    "name": "test-index",
                    "host": "test-index-abc.svc.pinecone.io",
                    "status": { "ready": true },
                }));
            })
            .await;

        let client = reqwest::Client::new();
        let config = mock_pinecone(server.base_url(), None);
        let host = ensure_index(&client, &config, 384).await.unwrap();
        assert_eq!(host, "https://test-index-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn upsert_posts_vectors_and_reads_count() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200)
                    .json_body(serde_json::json!({"upsertedCount": 2}));
            })
            .await;

        let client = reqwest::Client::new();
        let config = mock_pinecone("https://unused.invalid".to_string(), None);
        let vectors = vec![
            VectorRecord {
                id: "a".to_string(),
                values: vec![0.1, 0.2],
                metadata: serde_json::json!({"filename": "x.pdf", "chunk_index": 0}),
            },
            VectorRecord {
                id: "b".to_string(),
                values: vec![0.3, 0.4],
                metadata: serde_json::json!({"filename": "x.pdf", "chunk_index": 1}),
            },
        ];

        let count = upsert(&client, &config, &server.base_url(), &vectors)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn query_parses_matches() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query")
                    .json_body_includes(r#"{"topK": 3, "includeMetadata": true}"#);
                then.status(200).json_body(serde_json::json!({
                    "matches": [
                        {"id": "a", "score": 0.91, "metadata": {"text": "alpha"}},
                        {"id": "b", "score": 0.42, "metadata": {"text": "beta"}},
                    ],
                }));
            })
            .await;

        let client = reqwest::Client::new();
        let config = mock_pinecone("https://unused.invalid".to_string(), None);
        let matches = query(&client, &config, &server.base_url(), &[0.1, 0.2], 3)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert!((matches[0].score - 0.91).abs() < 1e-6);
        assert_eq!(matches[1].metadata["text"], "beta");
    }

    #[tokio::test]
    async fn query_error_status_surfaces() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/query");
                then.status(500).body("internal");
            })
            .await;

        let client = reqwest::Client::new();
        let config = mock_pinecone("https://unused.invalid".to_string(), None);
        let err = query(&client, &config, &server.base_url(), &[0.1], 5)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
