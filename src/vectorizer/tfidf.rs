use num::Float;

use crate::vectorizer::{index::TermDictionary, token::TermFrequency};

pub trait TfIdfEngine<N>
where
    N: Float,
{
    /// IDF vector in dictionary slot order
    /// # Arguments
    /// * `dictionary` - frozen term dictionary
    /// # Returns
    /// * `Vec<N>` - one idf value per slot
    fn idf_vec(dictionary: &TermDictionary) -> Vec<N>;

    /// Dense TF-IDF vector of length `dictionary.len()`
    /// # Arguments
    /// * `freq` - term counts of the text to vectorize
    /// * `dictionary` - frozen term dictionary
    /// * `idf` - cached output of `idf_vec` for the same dictionary
    fn tf_idf_vec(freq: &TermFrequency, dictionary: &TermDictionary, idf: &[N]) -> Vec<N>;
}

/// Default engine
/// `tf = count / total`, `idf = ln(N / (df + 1)) + 1`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTfIdfEngine;

impl DefaultTfIdfEngine {
    /// Smoothed idf
    #[inline]
    pub fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        (doc_num as f64 / (doc_freq as f64 + 1.0)).ln() + 1.0
    }

    /// Raw term frequency, 0 for an empty text
    #[inline]
    pub fn tf(count: u32, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        count as f64 / total as f64
    }
}

impl<N> TfIdfEngine<N> for DefaultTfIdfEngine
where
    N: Float,
{
    fn idf_vec(dictionary: &TermDictionary) -> Vec<N> {
        let doc_num = dictionary.doc_num();
        dictionary
            .iter()
            .map(|(_, df)| N::from(Self::idf(doc_num, df)).unwrap_or_else(N::zero))
            .collect()
    }

    fn tf_idf_vec(freq: &TermFrequency, dictionary: &TermDictionary, idf: &[N]) -> Vec<N> {
        let mut vec = vec![N::zero(); dictionary.len()];
        // out-of-vocabulary terms still count toward the total
        let total = freq.term_sum();
        if total == 0 {
            return vec;
        }
        for (term, count) in freq.iter() {
            if let Some(idx) = dictionary.index_of(term) {
                let tf = N::from(Self::tf(count, total)).unwrap_or_else(N::zero);
                vec[idx] = tf * idf[idx];
            }
        }
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_is_positive_and_non_increasing_in_doc_freq() {
        for doc_num in [1u64, 2, 10, 1000] {
            let mut prev = f64::INFINITY;
            for df in 1..=doc_num {
                let idf = DefaultTfIdfEngine::idf(doc_num, df);
                assert!(idf > 0.0, "idf({doc_num}, {df}) = {idf}");
                assert!(idf <= prev);
                prev = idf;
            }
        }
    }

    #[test]
    fn idf_matches_formula() {
        let idf = DefaultTfIdfEngine::idf(2, 1);
        assert!((idf - 1.0).abs() < 1e-12);
        let idf = DefaultTfIdfEngine::idf(9, 2);
        assert!((idf - (3.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn tf_guards_empty_total() {
        assert_eq!(DefaultTfIdfEngine::tf(0, 0), 0.0);
        assert_eq!(DefaultTfIdfEngine::tf(1, 4), 0.25);
    }
}
