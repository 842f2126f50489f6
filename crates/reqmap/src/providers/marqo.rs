//! Marqo embedding provider
//!
//! Marqo embeds documents itself when they are added to an index, so a batch
//! is embedded by uploading one document per text and reading each document
//! back with its vectors.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::config::MarqoConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::retry::retry_request;

/// Marqo-backed embedding provider
pub struct MarqoEmbedder {
    client: Client,
    config: MarqoConfig,
}

impl MarqoEmbedder {
    /// Create a new Marqo embedder
    pub fn new(config: &MarqoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn index_url(&self) -> String {
        format!(
            "{}/indexes/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.index_name
        )
    }

    /// Create the index unless it already exists.
    async fn ensure_index(&self) -> Result<()> {
        let response = self
            .client
            .post(self.index_url())
            .json(&json!({
                "model": self.config.model,
                "type": "unstructured",
            }))
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Marqo index request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Created Marqo index '{}'", self.config.index_name);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || body.contains("already exists") {
            tracing::debug!("Marqo index '{}' already exists", self.config.index_name);
            return Ok(());
        }

        Err(Error::embedding(format!(
            "Failed to create Marqo index '{}' ({}): {}",
            self.config.index_name, status, body
        )))
    }

    async fn add_documents(&self, documents: &[Value]) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/documents", self.index_url()))
            .json(&json!({
                "documents": documents,
                "tensorFields": [self.config.text_field],
            }))
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Marqo upload failed: {}", e)))?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            Error::embedding(format!("Failed to parse Marqo upload response ({}): {}", status, e))
        })?;

        if !status.is_success() {
            return Err(Error::embedding(format!(
                "Marqo upload failed ({}): {}",
                status, body
            )));
        }
        if body.get("errors").and_then(Value::as_bool).unwrap_or(false) {
            return Err(Error::embedding(format!(
                "Marqo rejected some documents: {}",
                body
            )));
        }

        Ok(())
    }

    async fn fetch_vector(&self, doc_id: &str) -> Result<Vec<f32>> {
        let url = format!("{}/documents/{}", self.index_url(), doc_id);
        let url = url.as_str();

        let document: Value = retry_request(
            "marqo",
            self.config.max_retries,
            Duration::from_millis(500),
            || async move {
                let response = self
                    .client
                    .get(url)
                    .query(&[("show_vectors", "true")])
                    .send()
                    .await
                    .map_err(|e| Error::embedding(format!("Marqo fetch failed: {}", e)))?;

                if !response.status().is_success() {
                    return Err(Error::embedding(format!(
                        "Marqo fetch of {} failed: HTTP {}",
                        doc_id,
                        response.status()
                    )));
                }

                response.json::<Value>().await.map_err(|e| {
                    Error::embedding(format!("Failed to parse Marqo document {}: {}", doc_id, e))
                })
            },
        )
        .await?;

        extract_vector(&document, &self.config.text_field).ok_or_else(|| {
            tracing::warn!("No vector found in Marqo document {}: {}", doc_id, document);
            Error::embedding(format!("No vector found for document {}", doc_id))
        })
    }
}

#[async_trait]
impl EmbeddingProvider for MarqoEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.ensure_index().await?;

        let batch = Uuid::new_v4().simple().to_string();
        let ids: Vec<String> = (0..texts.len()).map(|i| format!("req_{}_{}", batch, i)).collect();
        let documents: Vec<Value> = ids
            .iter()
            .zip(texts)
            .map(|(id, text)| {
                let mut doc = serde_json::Map::new();
                doc.insert("_id".to_string(), Value::String(id.clone()));
                doc.insert(self.config.text_field.clone(), Value::String(text.clone()));
                Value::Object(doc)
            })
            .collect();

        tracing::info!(
            "Sending {} requirements to Marqo index '{}'",
            documents.len(),
            self.config.index_name
        );
        self.add_documents(&documents).await?;

        let vectors = fetch_in_order(ids.as_slice(), self.config.fetch_concurrency, |id| {
            self.fetch_vector(id)
        })
        .await?;

        tracing::info!("Retrieved {} embeddings from Marqo", vectors.len());
        Ok(vectors)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "marqo"
    }
}

/// Run `fetch` over `items` with at most `limit` calls in flight, keeping
/// results in input order. Stops at the first error.
async fn fetch_in_order<'a, I, T, F, Fut>(items: &'a [I], limit: usize, fetch: F) -> Result<Vec<T>>
where
    I: Sync,
    F: Fn(&'a I) -> Fut + Send + 'a,
    Fut: Future<Output = Result<T>> + Send + 'a,
{
    let futures: std::pin::Pin<Box<dyn futures::Stream<Item = Fut> + Send + 'a>> =
        Box::pin(stream::iter(items.iter().map(fetch)));
    futures
        .buffered(limit.max(1))
        .try_collect()
        .await
}

/// Locate the embedding in a Marqo document fetched with `show_vectors=true`.
///
/// Known shapes, by Marqo version:
/// - `_tensor_facets: [{ <field>: .., _embedding: [..] }]`
/// - `_vectors: { <field>: [..] }`
/// - `_vectors: { <field>: { values | value | vector: [..] } }`
/// - `_embedding: [..]`
/// - any array directly under `_vectors`
pub fn extract_vector(document: &Value, field: &str) -> Option<Vec<f32>> {
    let vectors = document.get("_vectors");
    let by_field = vectors.and_then(|v| v.get(field));

    let candidates = [
        document
            .get("_tensor_facets")
            .and_then(Value::as_array)
            .and_then(|facets| facets.iter().find_map(|f| f.get("_embedding"))),
        by_field,
        by_field.and_then(|v| v.get("values")),
        by_field.and_then(|v| v.get("value")),
        by_field.and_then(|v| v.get("vector")),
        document.get("_embedding"),
        vectors
            .and_then(Value::as_object)
            .and_then(|map| map.values().find(|v| v.is_array())),
    ];

    candidates.into_iter().flatten().find_map(as_float_vec)
}

fn as_float_vec(value: &Value) -> Option<Vec<f32>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_f64().map(|x| x as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_in_order_bounds_concurrency() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let items: Vec<u64> = (0..20).collect();
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let results = fetch_in_order(items.as_slice(), 4, |&i| {
            let (in_flight, peak) = (&in_flight, &peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                // Later items finish first.
                tokio::time::sleep(Duration::from_millis(20 - i)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i * 10)
            }
        })
        .await
        .unwrap();

        assert_eq!(results, (0..20).map(|i| i * 10).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_fetch_in_order_stops_on_error() {
        let items = vec!["a", "missing", "c"];
        let result: Result<Vec<&str>> = fetch_in_order(items.as_slice(), 2, |&id| async move {
            if id == "missing" {
                Err(Error::embedding("No vector found for document missing"))
            } else {
                Ok(id)
            }
        })
        .await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_extract_plain_field_array() {
        let doc = json!({ "_id": "a", "_vectors": { "text": [0.1, 0.2, 0.3] } });
        assert_eq!(extract_vector(&doc, "text"), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_extract_nested_values() {
        for key in ["values", "value", "vector"] {
            let doc = json!({ "_vectors": { "text": { key: [1.0, 2.0] } } });
            assert_eq!(extract_vector(&doc, "text"), Some(vec![1.0, 2.0]), "shape {}", key);
        }
    }

    #[test]
    fn test_extract_legacy_embedding() {
        let doc = json!({ "_embedding": [0.5, -0.5] });
        assert_eq!(extract_vector(&doc, "text"), Some(vec![0.5, -0.5]));
    }

    #[test]
    fn test_extract_tensor_facets() {
        let doc = json!({
            "_id": "req_1",
            "text": "Users can log in",
            "_tensor_facets": [{ "text": "Users can log in", "_embedding": [0.25, 0.75] }]
        });
        assert_eq!(extract_vector(&doc, "text"), Some(vec![0.25, 0.75]));
    }

    #[test]
    fn test_extract_first_array_under_vectors() {
        let doc = json!({ "_vectors": { "description": [3.0, 4.0] } });
        assert_eq!(extract_vector(&doc, "text"), Some(vec![3.0, 4.0]));
    }

    #[test]
    fn test_extract_missing_or_malformed() {
        assert_eq!(extract_vector(&json!({ "_id": "x" }), "text"), None);
        assert_eq!(extract_vector(&json!({ "_vectors": { "text": [] } }), "text"), None);
        assert_eq!(extract_vector(&json!({ "_embedding": ["a", "b"] }), "text"), None);
    }
}
