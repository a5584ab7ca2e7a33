//! Retrieval over SEC filings
//!
//! A filing is split into overlapping chunks, embedded once, and kept in an
//! in-memory index keyed by `(ticker, form)`. Queries are embedded and
//! answered with the closest chunks by cosine similarity.

use agent_llm::{EmbeddingProvider, EmbeddingRequest};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::api::{FilingType, SecEdgarClient};
use crate::error::{Result, StockError};

/// Separators tried in order, coarsest first
pub const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Chunks per embedding request
const EMBED_BATCH: usize = 96;

/// Recursive character splitter
///
/// Splits on the coarsest separator present, recursing into pieces that are
/// still too long, then merges neighbours back up to `chunk_size`
/// characters with `chunk_overlap` characters carried between chunks.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator present in the text; "" always matches
        let (index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(s.as_str()))
            .map_or((separators.len(), ""), |(i, s)| (i, s.as_str()));
        let finer = separators.get(index + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator).map(String::from).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_with(&piece, finer));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |total: usize, current: &VecDeque<&str>| {
                total + len + if current.is_empty() { 0 } else { sep_len }
            };

            if joined_len(total, &current) > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                // Drop from the front until the carried text fits the overlap
                while total > self.chunk_overlap
                    || (joined_len(total, &current) > self.chunk_size && total > 0)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if current.is_empty() { 0 } else { sep_len };
                }
            }

            current.push_back(piece.as_str());
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, parts: &VecDeque<&str>, separator: &str) {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// Cosine similarity; zero for mismatched or zero-length vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embedded chunks of one document
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    chunks: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(StockError::Other(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                vectors.len()
            )));
        }
        Ok(Self { chunks, vectors })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The `k` chunks most similar to `query`, best first
    ///
    /// Equal scores keep document order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(f32, &str)> {
        let mut scored: Vec<(f32, &str)> = self
            .vectors
            .iter()
            .zip(&self.chunks)
            .map(|(v, c)| (cosine_similarity(query, v), c.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);
        scored
    }
}

/// Where filing text comes from
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Plain text of the latest filing of `form` for `ticker`
    async fn latest_filing_text(&self, ticker: &str, form: FilingType) -> Result<String>;
}

#[async_trait]
impl FilingSource for SecEdgarClient {
    async fn latest_filing_text(&self, ticker: &str, form: FilingType) -> Result<String> {
        SecEdgarClient::latest_filing_text(self, ticker, form).await
    }
}

/// Builds and queries per-filing indexes
///
/// Indexes are kept for the most recently indexed ticker only, so walking a
/// universe of tickers holds one company's embeddings at a time.
pub struct FilingRetriever {
    source: Arc<dyn FilingSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_model: String,
    splitter: TextSplitter,
    top_k: usize,
    indexes: RwLock<HashMap<(String, FilingType), Arc<VectorIndex>>>,
}

impl FilingRetriever {
    pub fn new(
        source: Arc<dyn FilingSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_model: impl Into<String>,
        splitter: TextSplitter,
        top_k: usize,
    ) -> Self {
        Self {
            source,
            embedder,
            embedding_model: embedding_model.into(),
            splitter,
            top_k,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let request = EmbeddingRequest::new(&self.embedding_model, batch.to_vec());
            let response = self.embedder.embed(request).await?;
            if response.vectors.len() != batch.len() {
                return Err(StockError::Other(format!(
                    "embedding count mismatch: sent {}, got {}",
                    batch.len(),
                    response.vectors.len()
                )));
            }
            vectors.extend(response.vectors);
        }
        Ok(vectors)
    }

    /// Index for a filing, building it on first use
    #[instrument(skip(self))]
    pub async fn index(&self, ticker: &str, form: FilingType) -> Result<Arc<VectorIndex>> {
        let key = (ticker.to_uppercase(), form);
        if let Some(index) = self.indexes.read().await.get(&key) {
            return Ok(Arc::clone(index));
        }

        let text = self.source.latest_filing_text(&key.0, form).await?;
        let chunks = self.splitter.split(&text);
        if chunks.is_empty() {
            return Err(StockError::unavailable(ticker, format!("{form} filing has no text")));
        }
        debug!(ticker, chunks = chunks.len(), "Embedding filing");

        let vectors = self.embed(chunks.clone()).await?;
        let index = Arc::new(VectorIndex::new(chunks, vectors)?);
        info!(ticker, form = %form, chunks = index.len(), "Indexed filing");

        let mut indexes = self.indexes.write().await;
        indexes.retain(|(cached, _), _| *cached == key.0);
        indexes.insert(key, Arc::clone(&index));
        Ok(index)
    }

    /// Top chunks for each query, in query order
    pub async fn query(&self, ticker: &str, form: FilingType, queries: &[String]) -> Result<Vec<Vec<String>>> {
        let index = self.index(ticker, form).await?;
        let query_vectors = self.embed(queries.to_vec()).await?;

        Ok(query_vectors
            .iter()
            .map(|q| {
                index
                    .search(q, self.top_k)
                    .into_iter()
                    .map(|(_, chunk)| chunk.to_string())
                    .collect()
            })
            .collect())
    }

    /// Forget the index for one filing
    pub async fn evict(&self, ticker: &str, form: FilingType) {
        self.indexes.write().await.remove(&(ticker.to_uppercase(), form));
    }
}
