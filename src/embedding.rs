//! Cohere embedding client.
//!
//! Calls the Cohere `POST /v1/embed` endpoint directly over HTTP rather
//! than through an SDK. Documents and queries use different `input_type`
//! values, which Cohere uses to condition the embedding.
//!
//! Per the error-handling policy, nothing here retries: a failed call
//! surfaces immediately and the route boundary converts it to an HTTP
//! error response.

use anyhow::{bail, Result};

use crate::config::EmbeddingConfig;

/// Embed a batch of document chunks (`input_type=search_document`).
///
/// Returns one vector per input text, in input order. Fails if the API
/// returns an error status, the response is malformed, or any returned
/// vector does not match the configured dimension.
pub async fn embed_documents(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let embeddings = embed(client, config, texts, "search_document").await?;
    if embeddings.len() != texts.len() {
        bail!(
            "Cohere returned {} embeddings for {} texts",
            embeddings.len(),
            texts.len()
        );
    }
    Ok(embeddings)
}

/// Embed a single search query (`input_type=search_query`).
pub async fn embed_query(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let embeddings = embed(client, config, &[text.to_string()], "search_query").await?;
    embeddings
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response from Cohere"))
}

async fn embed(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    texts: &[String],
    input_type: &str,
) -> Result<Vec<Vec<f32>>> {
    let body = serde_json::json!({
        "model": config.model,
        "texts": texts,
        "input_type": input_type,
    });

    let response = client
        .post(format!("{}/v1/embed", config.base_url))
        .header("Authorization", format!("Bearer {}", config.api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Cohere API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    let embeddings = parse_embed_response(&json)?;

    for vec in &embeddings {
        if vec.len() != config.dims {
            bail!(
                "Cohere returned {}-dimensional embedding, expected {}",
                vec.len(),
                config.dims
            );
        }
    }

    Ok(embeddings)
}

/// Parse the Cohere embed response: `{ "embeddings": [[f32, ...], ...] }`.
fn parse_embed_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Cohere response: missing embeddings array"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let vec: Vec<f32> = item
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid Cohere response: embedding is not an array"))?
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    anyhow::anyhow!("Invalid Cohere response: non-numeric embedding value {}", v)
                })
            })
            .collect::<Result<_>>()?;
        embeddings.push(vec);
    }

    Ok(embeddings)
}
