//! 単語ベクトル表・文書埋め込み・埋め込み行数の決定。
mod document;
mod sizer;
mod vectors;

pub use document::{DocumentEmbedder, EmbeddableDocument, EmbeddingError};
pub use sizer::{FeatureSizer, SizingError, median};
pub use vectors::{VectorTable, VectorTableError, VocabularyEntry};
