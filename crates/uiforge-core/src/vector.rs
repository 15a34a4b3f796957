//! Optional vector-store adapter (Pinecone REST API).
//!
//! A thin wrapper over a hosted index: finished generations are archived as
//! dense vectors with metadata, and similarity queries pass straight
//! through. When unconfigured the constructor returns `None` and the core
//! operates identically minus the similarity endpoints.
//!
//! Vectors come from a local feature-hash embedding of the description plus
//! stack summary — deterministic, dependency-free, and good enough for
//! coarse similarity over project descriptions.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::config::VectorConfig;
use crate::error::VectorError;

/// Embedding dimensionality.
const DIMENSIONS: usize = 256;

/// A similarity match returned by a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    /// The stored vector's id.
    pub id: String,
    /// Cosine similarity score.
    pub score: f64,
    /// Stored metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Thin client over one Pinecone index.
pub struct PineconeClient {
    client: reqwest::Client,
    api_key: String,
    index_host: String,
    namespace: String,
}

impl PineconeClient {
    /// Build a client when the feature is configured; `None` otherwise.
    pub fn from_config(config: &VectorConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Some(Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            index_host: config.index_host.trim_end_matches('/').to_string(),
            namespace: config.namespace.clone(),
        })
    }

    /// Archive a finished generation under its fingerprint.
    pub async fn upsert_project(
        &self,
        id: &str,
        description: &str,
        stack_summary: &str,
        file_count: usize,
    ) -> Result<(), VectorError> {
        let values = embed(&format!("{description} {stack_summary}"));
        let body = json!({
            "vectors": [{
                "id": id,
                "values": values,
                "metadata": {
                    "kind": "project",
                    "description": description,
                    "stack": stack_summary,
                    "file_count": file_count,
                },
            }],
            "namespace": self.namespace,
        });
        self.post_ok("/vectors/upsert", &body).await
    }

    /// Store a reusable code snippet.
    pub async fn store_snippet(
        &self,
        id: &str,
        text: &str,
        language: &str,
    ) -> Result<(), VectorError> {
        let body = json!({
            "vectors": [{
                "id": id,
                "values": embed(text),
                "metadata": {"kind": "snippet", "language": language, "text": text},
            }],
            "namespace": self.namespace,
        });
        self.post_ok("/vectors/upsert", &body).await
    }

    /// Query for projects similar to a description + stack summary.
    pub async fn search_projects(
        &self,
        description: &str,
        stack_summary: &str,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError> {
        self.query(&format!("{description} {stack_summary}"), "project", top_k)
            .await
    }

    /// Query for snippets similar to a text fragment.
    pub async fn search_snippets(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError> {
        self.query(text, "snippet", top_k).await
    }

    /// Index occupancy statistics, passed through.
    pub async fn stats(&self) -> Result<serde_json::Value, VectorError> {
        let response = self
            .client
            .post(format!("{}/describe_index_stats", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(&json!({}))
            .send()
            .await?;
        Self::check(&response.status())?;
        response
            .json()
            .await
            .map_err(|e| VectorError::Parse(e.to_string()))
    }

    /// Delete one vector by id.
    pub async fn delete_vector(&self, id: &str) -> Result<(), VectorError> {
        let body = json!({"ids": [id], "namespace": self.namespace});
        self.post_ok("/vectors/delete", &body).await
    }

    async fn query(
        &self,
        text: &str,
        kind: &str,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, VectorError> {
        let body = json!({
            "vector": embed(text),
            "topK": top_k,
            "includeMetadata": true,
            "filter": {"kind": {"$eq": kind}},
            "namespace": self.namespace,
        });
        let response = self
            .client
            .post(format!("{}/query", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::check(&response.status())?;

        #[derive(Deserialize)]
        struct QueryResponse {
            #[serde(default)]
            matches: Vec<VectorMatch>,
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorError::Parse(e.to_string()))?;
        Ok(parsed.matches)
    }

    async fn post_ok(&self, path: &str, body: &impl Serialize) -> Result<(), VectorError> {
        let response = self
            .client
            .post(format!("{}{path}", self.index_host))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        Self::check(&response.status())
    }

    fn check(status: &reqwest::StatusCode) -> Result<(), VectorError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(VectorError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            })
        }
    }
}

/// Deterministic feature-hash embedding: each whitespace token hashes into
/// one of [`DIMENSIONS`] buckets with a ±1 sign, then the vector is
/// L2-normalized. Identical text always embeds identically.
fn embed(text: &str) -> Vec<f32> {
    let mut values = vec![0f32; DIMENSIONS];

    for token in text.to_lowercase().split_whitespace() {
        let digest = Sha256::digest(token.as_bytes());
        let bucket = usize::from(digest[0]) << 8 | usize::from(digest[1]);
        let sign = if digest[2] & 1 == 0 { 1.0 } else { -1.0 };
        values[bucket % DIMENSIONS] += sign;
    }

    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut values {
            *v /= norm;
        }
    }
    values
}
