use crate::models::*;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

const VOCABULARY_SIZE: usize = 1000;
const MIN_DIMENSIONS: usize = 100;

/// TF-IDF index over document chunks.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    vocabulary: HashMap<String, usize>,
    idf_scores: HashMap<String, f32>,
    entries: Vec<(DocumentChunk, Vec<f32>)>,
}

impl EmbeddingIndex {
    pub fn build(documents: &[Document]) -> Self {
        let chunks: Vec<&DocumentChunk> = documents.iter().flat_map(|d| d.chunks.iter()).collect();
        log::info!("Generating embeddings for {} chunks...", chunks.len());

        let mut word_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let total_chunks = chunks.len();

        for chunk in &chunks {
            let words = tokenize(&chunk.content);
            let unique_words: HashSet<&String> = words.iter().collect();

            for word in unique_words {
                *doc_frequencies.entry(word.clone()).or_insert(0) += 1;
            }
            for word in words {
                *word_counts.entry(word).or_insert(0) += 1;
            }
        }

        // Smoothed so terms present in every chunk still carry weight.
        let idf_scores: HashMap<String, f32> = doc_frequencies
            .iter()
            .map(|(word, df)| {
                let idf = ((1 + total_chunks) as f32 / (1 + *df) as f32).ln() + 1.0;
                (word.clone(), idf)
            })
            .collect();

        let mut word_freq_pairs: Vec<_> = word_counts.into_iter().collect();
        word_freq_pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let vocabulary: HashMap<String, usize> = word_freq_pairs
            .into_iter()
            .take(VOCABULARY_SIZE)
            .enumerate()
            .map(|(idx, (word, _))| (word, idx))
            .collect();

        let mut index = Self {
            vocabulary,
            idf_scores,
            entries: Vec::new(),
        };
        let entries = chunks
            .par_iter()
            .map(|chunk| ((*chunk).clone(), index.embed(&chunk.content)))
            .collect();
        index.entries = entries;
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `max_results` chunks by cosine similarity, best first.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<ScoredChunk> {
        let query_embedding = self.embed(query);

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|(chunk, embedding)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);

        log::info!("Found {} relevant chunks", scored.len());
        scored
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.vocabulary.len().max(MIN_DIMENSIONS)];
        let words = tokenize(text);
        let total_words = words.len() as f32;

        for (word, count) in count_words(&words) {
            if let Some(&idx) = self.vocabulary.get(word) {
                let tf = count as f32 / total_words;
                let idf = self.idf_scores.get(word).copied().unwrap_or(1.0);
                embedding[idx] = tf * idf;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in embedding.iter_mut() {
                *value /= norm;
            }
        }

        embedding
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|word| word.len() > 2)
        .collect()
}

fn count_words(words: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for word in words {
        *counts.entry(word.as_str()).or_insert(0) += 1;
    }
    counts
}

pub fn cosine_similarity(embedding1: &[f32], embedding2: &[f32]) -> f32 {
    let min_len = embedding1.len().min(embedding2.len());

    let dot_product: f32 = embedding1[..min_len]
        .iter()
        .zip(embedding2[..min_len].iter())
        .map(|(a, b)| a * b)
        .sum();

    let norm1: f32 = embedding1[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm2: f32 = embedding2[..min_len].iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm1 == 0.0 || norm2 == 0.0 {
        0.0
    } else {
        dot_product / (norm1 * norm2)
    }
}
