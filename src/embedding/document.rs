//! 埋め込み可能な文書と、文書ベクトルを作る埋め込み器。
use ndarray::{Array1, Array2, ArrayView1, Axis};
use thiserror::Error;

use super::VectorTable;
use crate::corpus::{CorpusRecord, DatasetRole};
use crate::text::TextNormalizer;

/// 埋め込みの前提条件が満たされていない場合のエラー。
///
/// どちらもパイプラインが一度だけ修復して再試行する。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    #[error("embedding row count is not set for document {title:?}")]
    MissingSize { title: String },
    #[error("document {title:?} has no normalized text")]
    MissingText { title: String },
}

/// `CorpusRecord` に埋め込み用の状態を加えた文書。
///
/// 行数を変えるか正規化テキストを捨てると、キャッシュ済みの特徴ベクトルも捨てる。
#[derive(Debug, Clone)]
pub struct EmbeddableDocument {
    record: CorpusRecord,
    row_count: Option<usize>,
    normalized_text: Option<String>,
    features: Option<Array1<f32>>,
}

impl EmbeddableDocument {
    #[must_use]
    pub fn new(record: CorpusRecord) -> Self {
        Self {
            record,
            row_count: None,
            normalized_text: None,
            features: None,
        }
    }

    #[must_use]
    pub fn record(&self) -> &CorpusRecord {
        &self.record
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.record.title()
    }

    #[must_use]
    pub fn role(&self) -> DatasetRole {
        self.record.role()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.record.label()
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.record.set_label(label);
    }

    #[must_use]
    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    pub fn set_row_count(&mut self, rows: usize) {
        if self.row_count != Some(rows) {
            self.features = None;
        }
        self.row_count = Some(rows);
    }

    #[must_use]
    pub fn normalized_text(&self) -> Option<&str> {
        self.normalized_text.as_deref()
    }

    /// 正規化テキストを返す。未計算なら `normalizer` で計算してキャッシュする。
    pub fn normalize_with<N>(&mut self, normalizer: &N) -> &str
    where
        N: TextNormalizer + ?Sized,
    {
        let record = &self.record;
        self.normalized_text
            .get_or_insert_with(|| normalizer.normalize(record.raw_content()))
            .as_str()
    }

    pub fn reset_normalized_text(&mut self) {
        self.normalized_text = None;
        self.features = None;
    }

    #[must_use]
    pub fn feature_vector(&self) -> Option<&Array1<f32>> {
        self.features.as_ref()
    }
}

/// 正規化済みテキストを単語ベクトルの平均に変換する。
#[derive(Debug, Clone, Copy)]
pub struct DocumentEmbedder<'a> {
    table: &'a VectorTable,
}

impl<'a> DocumentEmbedder<'a> {
    #[must_use]
    pub fn new(table: &'a VectorTable) -> Self {
        Self { table }
    }

    /// 文書の特徴ベクトルを計算してキャッシュし、参照を返す。
    ///
    /// 同じ行数で再度呼ばれた場合はキャッシュをそのまま返す。
    ///
    /// # Errors
    /// 行数が未設定なら [`EmbeddingError::MissingSize`]、
    /// 正規化テキストが無いか空なら [`EmbeddingError::MissingText`]。
    pub fn embed<'d>(
        &self,
        document: &'d mut EmbeddableDocument,
    ) -> Result<&'d Array1<f32>, EmbeddingError> {
        let Some(rows) = document.row_count else {
            return Err(EmbeddingError::MissingSize {
                title: document.title().to_string(),
            });
        };
        let text = match document.normalized_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => {
                return Err(EmbeddingError::MissingText {
                    title: document.title().to_string(),
                });
            }
        };

        let features = match document.features.take() {
            Some(cached) => cached,
            None => self.pool(text, rows),
        };
        Ok(&*document.features.insert(features))
    }

    /// `rows × dimension` の行列を作り、語彙にあるトークンのベクトルを先頭から詰める。
    ///
    /// 語彙に無いトークンは行を消費しない。埋まらなかった行はゼロのまま残る。
    #[must_use]
    pub fn matrix(&self, text: &str, rows: usize) -> Array2<f32> {
        let mut matrix = Array2::<f32>::zeros((rows, self.table.dimension()));
        let found = text
            .split_whitespace()
            .filter_map(|token| self.table.find(token));
        for (mut row, entry) in matrix.axis_iter_mut(Axis(0)).zip(found) {
            row.assign(&ArrayView1::from(entry.vector()));
        }
        matrix
    }

    /// 行列を行方向に平均する。ゼロ埋めの行も平均に含める。
    #[must_use]
    pub fn pool(&self, text: &str, rows: usize) -> Array1<f32> {
        self.matrix(text, rows)
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.table.dimension()))
    }
}
