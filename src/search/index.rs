use std::sync::Arc;

use anyhow::Result;
use text_splitter::{ChunkConfig, TextSplitter};

use super::embed::Embedder;

/// Split text into chunks of at most `chunk_size` characters, with
/// neighbouring chunks sharing up to `overlap` characters.
pub fn split_chunks(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    let config = ChunkConfig::new(chunk_size).with_overlap(overlap)?;
    let splitter = TextSplitter::new(config);
    Ok(splitter.chunks(text).map(String::from).collect())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embedded chunks of the context, searched by similarity to a query
pub struct ContextIndex {
    embedder: Option<Arc<dyn Embedder>>,
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl ContextIndex {
    /// An index with nothing in it. Every search returns no matches.
    pub fn empty() -> Self {
        Self {
            embedder: None,
            chunks: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn build(
        text: &str,
        embedder: Arc<dyn Embedder>,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<Self> {
        let chunks = split_chunks(text, chunk_size, overlap)?;
        if chunks.is_empty() {
            return Ok(Self::empty());
        }
        let vectors = embedder.embed(chunks.clone())?;
        anyhow::ensure!(
            vectors.len() == chunks.len(),
            "Expected {} embeddings, got {}",
            chunks.len(),
            vectors.len()
        );
        tracing::debug!("Indexed {} context chunks", chunks.len());

        Ok(Self {
            embedder: Some(embedder),
            chunks,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `top_k` chunks most similar to `query`, best match first
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let Some(embedder) = &self.embedder else {
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = embedder
            .embed(vec![query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned for query"))?;

        let mut scored: Vec<(f32, &String)> = self
            .vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .zip(&self.chunks)
            .collect();
        // Stable so equal scores keep document order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, chunk)| chunk.clone())
            .collect())
    }
}
