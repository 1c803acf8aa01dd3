pub mod store;

use std::{path::Path, sync::Arc};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::Result,
    vectorizer::{
        corpus::Document,
        token::{TermFrequency, Tokenizer},
        TfIdfVectorizer,
    },
};

use self::store::IndexStore;

/// Vocabulary and document-frequency statistics of one index build.
///
/// Term indices are dense `0..len()` and follow first-occurrence order of
/// the scanned corpus. A dictionary is never mutated once built; a rebuild
/// produces a new one with the next `generation`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermDictionary {
    /// term -> number of documents containing it
    #[serde(with = "indexmap::map::serde_seq")]
    doc_freq: IndexMap<Box<str>, u64>,
    /// total document count `N`
    doc_num: u64,
    generation: u64,
}

impl TermDictionary {
    /// Scan documents and collect term statistics
    ///
    /// # Arguments
    /// * `tokenizer` - tokenizer shared with the vectorizer
    /// * `documents` - corpus in index order
    /// * `generation` - generation number to stamp on the result
    pub fn scan(tokenizer: &Tokenizer, documents: &[Document], generation: u64) -> Self {
        // term vectors, one per document; collect keeps document order
        let term_vectors: Vec<TermFrequency> = documents
            .par_iter()
            .map(|doc| tokenizer.term_frequency(&doc.text))
            .collect();

        let mut doc_freq: IndexMap<Box<str>, u64> = IndexMap::new();
        for freq in &term_vectors {
            for term in freq.term_set_ref_str() {
                *doc_freq.entry(term.into()).or_insert(0) += 1;
            }
        }
        Self {
            doc_freq,
            doc_num: documents.len() as u64,
            generation,
        }
    }

    /// Vocabulary size `|V|`
    #[inline]
    pub fn len(&self) -> usize {
        self.doc_freq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.doc_freq.is_empty()
    }

    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Dense slot of a term
    #[inline]
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.doc_freq.get_index_of(term)
    }

    /// Document frequency of a term, 0 when unknown
    #[inline]
    pub fn doc_freq(&self, term: &str) -> u64 {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    /// `(term, doc_freq)` in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.doc_freq.iter().map(|(t, &df)| (t.as_ref(), df))
    }

    pub fn term_at(&self, index: usize) -> Option<&str> {
        self.doc_freq.get_index(index).map(|(t, _)| t.as_ref())
    }
}

/// Term Index
/// Owns the current dictionary and (optionally) the on-disk location it is
/// persisted to.
///
/// `build_index` stages a new dictionary, persists it, and only then swaps it
/// in. If anything fails the previous dictionary stays current, in memory and
/// on disk.
#[derive(Debug)]
pub struct TermIndex {
    tokenizer: Tokenizer,
    store: Option<IndexStore>,
    dictionary: Arc<TermDictionary>,
}

impl Default for TermIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIndex {
    /// In-memory index with the English tokenizer
    pub fn new() -> Self {
        Self {
            tokenizer: Tokenizer::english(),
            store: None,
            dictionary: Arc::new(TermDictionary::default()),
        }
    }

    /// Index persisted under `dir`. A dictionary already stored there is
    /// loaded as the current state.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let store = IndexStore::new(dir);
        let dictionary = store.load()?.unwrap_or_default();
        debug!(
            dir = %store.dir().display(),
            vocab = dictionary.len(),
            generation = dictionary.generation(),
            "term index opened"
        );
        Ok(Self {
            tokenizer: Tokenizer::english(),
            store: Some(store),
            dictionary: Arc::new(dictionary),
        })
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn store(&self) -> Option<&IndexStore> {
        self.store.as_ref()
    }

    /// Scan `documents` into the next-generation dictionary without touching
    /// the current one or the store
    pub fn stage(&self, documents: &[Document]) -> TermDictionary {
        TermDictionary::scan(&self.tokenizer, documents, self.dictionary.generation() + 1)
    }

    /// Rebuild the dictionary from scratch over `documents`
    pub fn build_index(&mut self, documents: &[Document]) -> Result<()> {
        let staged = self.stage(documents);
        if let Some(store) = &self.store {
            store.save(&staged)?;
        }
        info!(
            docs = staged.doc_num(),
            vocab = staged.len(),
            generation = staged.generation(),
            "term index built"
        );
        self.dictionary = Arc::new(staged);
        Ok(())
    }

    /// Frozen view of the current dictionary
    pub fn snapshot(&self) -> Arc<TermDictionary> {
        Arc::clone(&self.dictionary)
    }

    /// Vocabulary size `|V|` of the current dictionary
    pub fn vocab_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Vectorizer bound to the current dictionary snapshot
    pub fn vectorizer(&self) -> TfIdfVectorizer {
        TfIdfVectorizer::new(self.tokenizer.clone(), self.snapshot())
    }
}
