pub mod corpus;
pub mod index;
pub mod tfidf;
pub mod token;

use std::sync::Arc;

use num::Float;

use crate::vectorizer::{
    index::TermDictionary,
    tfidf::{DefaultTfIdfEngine, TfIdfEngine},
    token::Tokenizer,
};

/// TF-IDF Vectorizer
/// Turns arbitrary text into a dense vector of length `|V|` against one
/// frozen dictionary snapshot.
///
/// The IDF vector is computed once per snapshot and cached. A vectorizer
/// never observes a later rebuild of the index; get a new one from
/// `TermIndex::vectorizer` after rebuilding.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer<N = f32, E = DefaultTfIdfEngine>
where
    N: Float,
    E: TfIdfEngine<N>,
{
    tokenizer: Tokenizer,
    dictionary: Arc<TermDictionary>,
    idf_cache: Vec<N>,
    _marker: std::marker::PhantomData<E>,
}

impl<N, E> TfIdfVectorizer<N, E>
where
    N: Float,
    E: TfIdfEngine<N>,
{
    pub fn new(tokenizer: Tokenizer, dictionary: Arc<TermDictionary>) -> Self {
        let idf_cache = E::idf_vec(&dictionary);
        Self {
            tokenizer,
            dictionary,
            idf_cache,
            _marker: std::marker::PhantomData,
        }
    }

    /// Vectorize text
    ///
    /// # Arguments
    /// * `text` - raw text, tokenized like the indexed corpus
    ///
    /// # Returns
    /// * `Vec<N>` - length `dim()`, zero everywhere for empty or
    ///   fully out-of-vocabulary text
    pub fn vectorize(&self, text: &str) -> Vec<N> {
        let freq = self.tokenizer.term_frequency(text);
        E::tf_idf_vec(&freq, &self.dictionary, &self.idf_cache)
    }

    /// Output length, the dictionary size
    #[inline]
    pub fn dim(&self) -> usize {
        self.dictionary.len()
    }

    /// IDF of a term, `None` when out of vocabulary
    pub fn idf(&self, term: &str) -> Option<N> {
        self.dictionary
            .index_of(term)
            .map(|idx| self.idf_cache[idx])
    }

    pub fn dictionary(&self) -> &Arc<TermDictionary> {
        &self.dictionary
    }

    pub fn generation(&self) -> u64 {
        self.dictionary.generation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::{
        corpus::{Document, DocumentKind},
        index::TermIndex,
    };

    fn built_index() -> TermIndex {
        let mut index = TermIndex::new();
        index
            .build_index(&[
                Document {
                    text: "python backend skills".into(),
                    kind: DocumentKind::UserCv,
                    external_id: "u1".into(),
                },
                Document {
                    text: "backend engineer python".into(),
                    kind: DocumentKind::Job,
                    external_id: "j1".into(),
                },
            ])
            .unwrap();
        index
    }

    #[test]
    fn single_term_sets_only_its_slot() {
        let index = built_index();
        let v = index.vectorizer();
        let out = v.vectorize("python");
        assert_eq!(out.len(), 4);
        let slot = index.snapshot().index_of("python").unwrap();
        for (i, x) in out.iter().enumerate() {
            if i == slot {
                assert!(*x > 0.0);
            } else {
                assert_eq!(*x, 0.0);
            }
        }
        // tf = 1, idf = ln(2/3) + 1
        let expected = ((2.0f64 / 3.0).ln() + 1.0) as f32;
        assert!((out[slot] - expected).abs() < 1e-6);
    }

    #[test]
    fn out_of_vocabulary_tokens_dilute_tf() {
        let index = built_index();
        let v = index.vectorizer();
        let out = v.vectorize("engineer kotlin kotlin swift");
        let slot = index.snapshot().index_of("engineer").unwrap();
        // tf = 1/4, idf = ln(2/2) + 1 = 1
        assert!((out[slot] - 0.25).abs() < 1e-6);
        assert_eq!(out.iter().filter(|x| **x != 0.0).count(), 1);
    }

    #[test]
    fn vectorize_is_idempotent_with_fixed_length() {
        let index = built_index();
        let v = index.vectorizer();
        for text in ["", "the of and", "Python, PYTHON backend!", "unknown words only"] {
            let a = v.vectorize(text);
            let b = v.vectorize(text);
            assert_eq!(a.len(), v.dim());
            assert_eq!(a, b);
        }
        assert!(v.vectorize("").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn unbuilt_index_gives_empty_vectors() {
        let index = TermIndex::new();
        let v = index.vectorizer();
        assert_eq!(v.dim(), 0);
        assert!(v.vectorize("python backend").is_empty());
        assert!(v.vectorize("").is_empty());
    }

    #[test]
    fn f64_vectorizer_agrees_with_f32() {
        let index = built_index();
        let v32 = index.vectorizer();
        let v64: TfIdfVectorizer<f64> = TfIdfVectorizer::new(index.tokenizer().clone(), index.snapshot());
        let a = v32.vectorize("backend skills skills");
        let b = v64.vectorize("backend skills skills");
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((*x as f64 - y).abs() < 1e-6);
        }
        assert!(v64.idf("skills").unwrap() > 0.0);
        assert_eq!(v64.idf("nope"), None);
    }

    #[test]
    fn snapshot_is_frozen_across_rebuild() {
        let mut index = built_index();
        let v = index.vectorizer();
        index.build_index(&[]).unwrap();
        assert_eq!(v.dim(), 4);
        assert_eq!(index.vectorizer().dim(), 0);
    }
}
