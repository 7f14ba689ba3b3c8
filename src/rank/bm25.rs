// SPDX-License-Identifier: MIT OR Apache-2.0

//! BM25 scoring over a caller-populated corpus
//!
//! The scorer knows nothing about what a document is. File ranking keys
//! documents by path and line ranking keys them by line number; both feed
//! the same [`score`] through a populate callback.

use std::collections::{BTreeMap, BTreeSet};

/// Tuning constants for the BM25+ formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f64,
    /// Length normalization strength
    pub b: f64,
    /// Floor added per contributing term
    pub delta: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.5,
            delta: 1.0,
        }
    }
}

/// Term statistics for one ranking pass
#[derive(Debug, Clone)]
pub struct Corpus<D, T> {
    /// Accumulated weight per (document, term)
    pub term_frequency: BTreeMap<(D, T), f64>,
    /// Documents containing each term at least once
    pub document_frequency: BTreeMap<T, BTreeSet<D>>,
    pub document_length: BTreeMap<D, f64>,
}

impl<D: Ord + Clone, T: Ord + Clone> Default for Corpus<D, T> {
    fn default() -> Self {
        Self {
            term_frequency: BTreeMap::new(),
            document_frequency: BTreeMap::new(),
            document_length: BTreeMap::new(),
        }
    }
}

impl<D: Ord + Clone, T: Ord + Clone> Corpus<D, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `weight` for `term` in `doc`
    pub fn add_term(&mut self, doc: D, term: T, weight: f64) {
        self.document_frequency
            .entry(term.clone())
            .or_default()
            .insert(doc.clone());
        *self.term_frequency.entry((doc, term)).or_insert(0.0) += weight;
    }

    pub fn set_length(&mut self, doc: D, length: f64) {
        self.document_length.insert(doc, length);
    }

    /// Documents with term weight but no known length
    pub fn documents_without_length(&self) -> BTreeSet<D> {
        self.term_frequency
            .keys()
            .map(|(doc, _)| doc)
            .filter(|doc| !self.document_length.contains_key(*doc))
            .cloned()
            .collect()
    }

    /// Drop every statistic referring to `doc`
    pub fn remove_document(&mut self, doc: &D) {
        self.term_frequency.retain(|(d, _), _| d != doc);
        for docs in self.document_frequency.values_mut() {
            docs.remove(doc);
        }
        self.document_frequency.retain(|_, docs| !docs.is_empty());
        self.document_length.remove(doc);
    }

    fn average_length(&self) -> f64 {
        if self.document_length.is_empty() {
            return 1.0;
        }
        let total: f64 = self.document_length.values().sum();
        let avg = total / self.document_length.len() as f64;
        if avg > 0.0 {
            avg
        } else {
            1.0
        }
    }
}

/// Inverse document frequency for a term present in `df` of `n` documents
pub fn idf(n: usize, df: usize) -> f64 {
    let n = n as f64;
    let df = df as f64;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// Score every document the callback populates.
///
/// `n` is the number of candidate documents, which may exceed the number
/// that actually carry term weight. Documents still missing a length after
/// `populate` returns are left out of the result.
pub fn score<D, T, F>(params: &Bm25Params, n: usize, populate: F) -> BTreeMap<D, f64>
where
    D: Ord + Clone,
    T: Ord + Clone,
    F: FnOnce(&mut Corpus<D, T>),
{
    let mut corpus = Corpus::new();
    populate(&mut corpus);
    score_corpus(params, n, &corpus)
}

/// Score an already-populated corpus
pub fn score_corpus<D, T>(params: &Bm25Params, n: usize, corpus: &Corpus<D, T>) -> BTreeMap<D, f64>
where
    D: Ord + Clone,
    T: Ord + Clone,
{
    let avg_length = corpus.average_length();
    let idfs: BTreeMap<&T, f64> = corpus
        .document_frequency
        .iter()
        .filter(|(_, docs)| !docs.is_empty())
        .map(|(term, docs)| (term, idf(n, docs.len())))
        .collect();

    let mut scores: BTreeMap<D, f64> = BTreeMap::new();
    for ((doc, term), &tf) in &corpus.term_frequency {
        if tf <= 0.0 {
            continue;
        }
        let Some(&term_idf) = idfs.get(term) else {
            continue;
        };
        let Some(&length) = corpus.document_length.get(doc) else {
            continue;
        };
        let norm = 1.0 - params.b + params.b * length / avg_length;
        let saturated = tf * (params.k1 + 1.0) / (tf + params.k1 * norm);
        *scores.entry(doc.clone()).or_insert(0.0) += term_idf * (saturated + params.delta);
    }
    scores
}
