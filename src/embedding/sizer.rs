//! コーパス全体で共有する埋め込み行数の決定。
use thiserror::Error;

use super::{EmbeddableDocument, VectorTable};
use crate::text::TextNormalizer;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SizingError {
    #[error("cannot size embeddings for an empty corpus")]
    EmptyCorpus,
}

/// 語彙に含まれるトークン数の中央値を埋め込み行数とする。
#[derive(Debug, Clone, Copy)]
pub struct FeatureSizer<'a> {
    table: &'a VectorTable,
}

impl<'a> FeatureSizer<'a> {
    #[must_use]
    pub fn new(table: &'a VectorTable) -> Self {
        Self { table }
    }

    /// 空白区切りのトークンのうち語彙表にあるものを数える。
    #[must_use]
    pub fn in_vocabulary_count(&self, text: &str) -> usize {
        text.split_whitespace()
            .filter(|token| self.table.contains(token))
            .count()
    }

    /// 全文書の語彙内トークン数の中央値を返す。未正規化の文書は先に正規化する。
    ///
    /// # Errors
    /// 文書が1件も無い場合は [`SizingError::EmptyCorpus`]。
    pub fn compute_size<N>(
        &self,
        documents: &mut [EmbeddableDocument],
        normalizer: &N,
    ) -> Result<usize, SizingError>
    where
        N: TextNormalizer + ?Sized,
    {
        let mut counts: Vec<usize> = documents
            .iter_mut()
            .map(|document| self.in_vocabulary_count(document.normalize_with(normalizer)))
            .collect();
        median(&mut counts).ok_or(SizingError::EmptyCorpus)
    }
}

/// 中央値。偶数個のときは中央2値の平均を切り捨てる。
#[must_use]
pub fn median(values: &mut [usize]) -> Option<usize> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some(values[mid - 1].midpoint(values[mid]))
    }
}
