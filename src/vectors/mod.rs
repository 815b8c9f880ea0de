//! Embedding-based duplicate-topic heuristic.
//!
//! Topics are embedded with OpenAI and compared against the user's stored
//! content embeddings by cosine similarity. The check is best-effort: any
//! failure (missing key, HTTP error, no stored vectors) classifies the
//! topic as not-similar so generation can proceed.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ai::{truncate_chars, OpenAiClient};
use crate::db::{self, Database};

/// Cosine-similarity threshold above which a topic counts as a duplicate.
pub const SIMILARITY_THRESHOLD: f32 = 0.75;

/// Maximum number of matches returned by a similarity check.
pub const MATCH_COUNT: usize = 3;

/// Result of a similarity check.
#[derive(Debug, Clone, Default)]
pub struct SimilarityCheck {
    pub is_similar: bool,
    pub similar_items: Vec<SimilarItem>,
}

/// A previously stored content item that resembles the query topic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarItem {
    pub content_id: i64,
    pub topic: String,
    pub similarity: f32,
}

/// Check a topic against the user's stored content embeddings.
///
/// Fails open: errors are logged at debug level and reported as
/// not-similar.
pub async fn check_similarity(
    pool: &SqlitePool,
    openai: &OpenAiClient,
    topic: &str,
    content: &str,
    user_id: i64,
) -> SimilarityCheck {
    match try_check(pool, openai, topic, content, user_id).await {
        Ok(check) => check,
        Err(e) => {
            debug!("Similarity check unavailable, treating as not similar: {e:#}");
            SimilarityCheck::default()
        }
    }
}

async fn try_check(
    pool: &SqlitePool,
    openai: &OpenAiClient,
    topic: &str,
    content: &str,
    user_id: i64,
) -> Result<SimilarityCheck> {
    let query_text = format!("{topic} {}", truncate_chars(content, 500));
    let query = openai
        .embed(&query_text)
        .await
        .context("Failed to embed query topic")?;

    let stored = db::list_embeddings(pool, user_id).await?;

    let mut matches: Vec<SimilarItem> = stored
        .into_iter()
        .filter_map(|row| {
            let vector: Vec<f32> = serde_json::from_str(&row.vector).ok()?;
            Some(SimilarItem {
                content_id: row.content_id,
                topic: row.topic,
                similarity: cosine_similarity(&query, &vector),
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(MATCH_COUNT);

    let is_similar = matches
        .first()
        .is_some_and(|best| best.similarity > SIMILARITY_THRESHOLD);

    Ok(SimilarityCheck {
        is_similar,
        similar_items: matches,
    })
}

/// Cosine similarity of two vectors; 0.0 for mismatched or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// A request to embed and store the text of a generated content item.
#[derive(Debug)]
pub struct EmbeddingTask {
    pub content_id: i64,
    pub user_id: i64,
    pub text: String,
}

/// Handle for enqueueing embedding-storage tasks onto the background
/// worker. Storage is non-blocking for callers; worker failures are
/// logged, never surfaced.
#[derive(Debug, Clone)]
pub struct EmbeddingQueue {
    tx: mpsc::UnboundedSender<EmbeddingTask>,
}

impl EmbeddingQueue {
    pub fn enqueue(&self, task: EmbeddingTask) {
        if self.tx.send(task).is_err() {
            warn!("Embedding worker is not running; dropping task");
        }
    }
}

/// Spawn the embedding-storage worker and return its queue handle.
#[must_use]
pub fn start_embedding_worker(db: Database, openai: OpenAiClient) -> EmbeddingQueue {
    let (tx, mut rx) = mpsc::unbounded_channel::<EmbeddingTask>();

    tokio::spawn(async move {
        while let Some(task) = rx.recv().await {
            if let Err(e) = store_embedding(&db, &openai, &task).await {
                warn!(
                    content_id = task.content_id,
                    "Failed to store content embedding: {e:#}"
                );
            }
        }
    });

    EmbeddingQueue { tx }
}

async fn store_embedding(db: &Database, openai: &OpenAiClient, task: &EmbeddingTask) -> Result<()> {
    let vector = openai
        .embed(&task.text)
        .await
        .context("Failed to embed content text")?;
    let vector_json = serde_json::to_string(&vector).context("Failed to serialize embedding")?;

    db::insert_embedding(db.pool(), task.content_id, task.user_id, &vector_json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.5, 0.3, 0.8];
        let similarity = cosine_similarity(&v, &v);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
