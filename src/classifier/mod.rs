//! 文書ベクトルを入力とする浅いニューラルネットワーク分類器。
use thiserror::Error;

mod batches;
mod model;
mod network;
mod optimizer;

pub use model::{HIDDEN_UNITS, NewsClassifier, TrainedClassifier, TrainingOptions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("class count must be greater than zero")]
    NoClasses,
    #[error("corpus contains no training documents")]
    NoTrainingData,
    #[error("document {title:?} has no feature vector")]
    MissingFeatures { title: String },
    #[error("document {title:?} has non-integer label {label:?}")]
    InvalidLabel { title: String, label: String },
    #[error("label {label} is outside 1..={num_classes}")]
    LabelRange { label: i64, num_classes: usize },
    #[error("feature vector has {found} components, model expects {expected}")]
    Shape { expected: usize, found: usize },
}
