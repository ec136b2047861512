//! 学習前・学習済みの分類器。
//!
//! 学習は `NewsClassifier` を消費して `TrainedClassifier` を返すため、
//! 学習済みモデルを再学習することはできない。
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use super::ClassifierError;
use super::batches::EpochBatches;
use super::network::Network;
use super::optimizer::{Adam, AdamConfig};
use crate::corpus::DatasetRole;
use crate::embedding::EmbeddableDocument;

/// 隠れ層のユニット数。
pub const HIDDEN_UNITS: usize = 15;

/// 学習のハイパーパラメータ。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    pub l2: f32,
    pub seed: u64,
    pub batch_size: usize,
    pub epochs: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.02,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            l2: 1e-4,
            seed: 42,
            batch_size: 10,
            epochs: 100,
        }
    }
}

impl TrainingOptions {
    fn adam(&self) -> AdamConfig {
        AdamConfig {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            l2: self.l2,
        }
    }
}

/// 学習前の分類器。
#[derive(Debug, Clone, Default)]
pub struct NewsClassifier {
    options: TrainingOptions,
}

impl NewsClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: TrainingOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    /// 役割が Training の文書で学習する。
    ///
    /// 各文書のラベル `n` はクラス `n - 1` の one-hot 目標になる。
    ///
    /// # Errors
    /// クラス数が0、Training 文書が無い、特徴ベクトルが未計算、
    /// ラベルが整数でないか範囲外、特徴ベクトルの長さが揃っていない場合。
    #[allow(clippy::cast_precision_loss)]
    pub fn train(
        self,
        documents: &[EmbeddableDocument],
        num_classes: usize,
    ) -> Result<TrainedClassifier, ClassifierError> {
        if num_classes == 0 {
            return Err(ClassifierError::NoClasses);
        }
        let (features, targets) = training_matrices(documents, num_classes)?;
        let options = self.options;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut network = Network::new(features.ncols(), HIDDEN_UNITS, num_classes, &mut rng);
        let mut adam = Adam::new(options.adam(), &network);
        let mut batches = EpochBatches::new(features.nrows(), options.batch_size);

        info!(
            training_examples = features.nrows(),
            input_dim = features.ncols(),
            num_classes,
            epochs = options.epochs,
            batch_size = options.batch_size,
            "training classifier"
        );

        let mut final_loss = f32::NAN;
        for epoch in 0..options.epochs {
            let mut loss_sum = 0.0_f32;
            for batch in batches.shuffled(&mut rng) {
                let input = features.select(Axis(0), batch);
                let target = targets.select(Axis(0), batch);
                let (loss, gradients) = network.hinge_gradients(input.view(), target.view());
                adam.step(&mut network, &gradients);
                loss_sum += loss * batch.len() as f32;
            }
            final_loss = loss_sum / features.nrows() as f32;
            debug!(epoch = epoch + 1, loss = final_loss, "epoch finished");
        }

        info!(final_loss, "classifier trained");
        Ok(TrainedClassifier {
            network,
            num_classes,
            final_loss,
        })
    }
}

/// 学習済みの分類器。読み取り専用。
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    network: Network,
    num_classes: usize,
    final_loss: f32,
}

impl TrainedClassifier {
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.network.input_dim()
    }

    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// 最終エポックの平均損失。エポック数が0なら NaN。
    #[must_use]
    pub fn final_loss(&self) -> f32 {
        self.final_loss
    }

    /// 特徴ベクトルに対する softmax 出力。
    ///
    /// # Errors
    /// ベクトル長がモデルの入力次元と異なる場合は [`ClassifierError::Shape`]。
    pub fn probabilities(
        &self,
        features: ArrayView1<'_, f32>,
    ) -> Result<Array1<f32>, ClassifierError> {
        if features.len() != self.input_dim() {
            return Err(ClassifierError::Shape {
                expected: self.input_dim(),
                found: features.len(),
            });
        }
        let output = self.network.forward(features.insert_axis(Axis(0)));
        Ok(output.row(0).to_owned())
    }

    /// 最も確率の高いクラス（0始まり）を返し、文書のラベルをその値で上書きする。
    ///
    /// # Errors
    /// 特徴ベクトルが未計算、または長さが合わない場合。
    pub fn predict(&self, document: &mut EmbeddableDocument) -> Result<usize, ClassifierError> {
        let Some(features) = document.feature_vector() else {
            return Err(ClassifierError::MissingFeatures {
                title: document.title().to_string(),
            });
        };
        let class = argmax(&self.probabilities(features.view())?);
        document.set_label(class.to_string());
        Ok(class)
    }

    /// Testing 文書をすべて順に予測し、予測クラスを並び順で返す。
    ///
    /// # Errors
    /// いずれかの文書の予測に失敗した場合。
    pub fn predict_testing(
        &self,
        documents: &mut [EmbeddableDocument],
    ) -> Result<Vec<usize>, ClassifierError> {
        let predictions = documents
            .iter_mut()
            .filter(|document| document.role() == DatasetRole::Testing)
            .map(|document| self.predict(document))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            predicted = predictions.len(),
            "testing documents classified"
        );
        Ok(predictions)
    }
}

/// 最大値の添字。同値なら先頭を返す。
fn argmax(values: &Array1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (index, &value) in values.iter().enumerate() {
        if value > best_value {
            best = index;
            best_value = value;
        }
    }
    best
}

fn training_matrices(
    documents: &[EmbeddableDocument],
    num_classes: usize,
) -> Result<(Array2<f32>, Array2<f32>), ClassifierError> {
    let mut examples: Vec<(&Array1<f32>, usize)> = Vec::new();
    for document in documents
        .iter()
        .filter(|document| document.role() == DatasetRole::Training)
    {
        let Some(features) = document.feature_vector() else {
            return Err(ClassifierError::MissingFeatures {
                title: document.title().to_string(),
            });
        };
        if let Some((first, _)) = examples.first()
            && features.len() != first.len()
        {
            return Err(ClassifierError::Shape {
                expected: first.len(),
                found: features.len(),
            });
        }
        let class = class_index(document, num_classes)?;
        examples.push((features, class));
    }

    let Some((first, _)) = examples.first() else {
        return Err(ClassifierError::NoTrainingData);
    };
    let mut inputs = Array2::<f32>::zeros((examples.len(), first.len()));
    let mut targets = Array2::<f32>::zeros((examples.len(), num_classes));
    for (row, (features, class)) in examples.iter().enumerate() {
        inputs.row_mut(row).assign(*features);
        targets[[row, *class]] = 1.0;
    }
    Ok((inputs, targets))
}

fn class_index(
    document: &EmbeddableDocument,
    num_classes: usize,
) -> Result<usize, ClassifierError> {
    let raw = document.label();
    let label: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ClassifierError::InvalidLabel {
            title: document.title().to_string(),
            label: raw.to_string(),
        })?;
    label
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
        .filter(|index| *index < num_classes)
        .ok_or(ClassifierError::LabelRange { label, num_classes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusRecord;
    use crate::embedding::{DocumentEmbedder, VectorTable};
    use crate::text::STOPWORDS;
    use ndarray::array;

    fn table() -> VectorTable {
        VectorTable::from_pairs(
            [
                ("goal".to_string(), vec![1.0, 0.0, 0.1]),
                ("match".to_string(), vec![0.9, 0.1, 0.0]),
                ("virus".to_string(), vec![0.0, 1.0, 0.1]),
                ("vaccine".to_string(), vec![0.1, 0.9, 0.0]),
            ],
            &STOPWORDS,
        )
        .expect("table builds")
    }

    fn document(text: &str, role: DatasetRole, label: &str) -> EmbeddableDocument {
        EmbeddableDocument::new(CorpusRecord::new(text, text, role, label))
    }

    fn embed_all(table: &VectorTable, documents: &mut [EmbeddableDocument]) {
        let embedder = DocumentEmbedder::new(table);
        for document in documents {
            document.normalize_with(&|text: &str| text.to_string());
            document.set_row_count(2);
            embedder.embed(document).expect("embeds");
        }
    }

    fn corpus() -> Vec<EmbeddableDocument> {
        let mut documents = Vec::new();
        for _ in 0..6 {
            documents.push(document("goal match", DatasetRole::Training, "1"));
            documents.push(document("virus vaccine", DatasetRole::Training, "2"));
        }
        documents.push(document("match goal", DatasetRole::Testing, "-1"));
        documents.push(document("vaccine virus", DatasetRole::Testing, "-1"));
        documents.push(document("goal goal", DatasetRole::Testing, "-1"));
        documents.push(document("virus virus", DatasetRole::Testing, "-1"));
        documents
    }

    #[test]
    fn separable_corpus_is_classified() {
        let table = table();
        let mut documents = corpus();
        embed_all(&table, &mut documents);

        let model = NewsClassifier::new().train(&documents, 2).expect("trains");
        let predictions = model.predict_testing(&mut documents).expect("predicts");

        assert_eq!(predictions, vec![0, 1, 0, 1]);
        let labels: Vec<&str> = documents[12..]
            .iter()
            .map(EmbeddableDocument::label)
            .collect();
        assert_eq!(labels, vec!["0", "1", "0", "1"]);
        assert!(documents[..12].iter().all(|d| d.label() != "0"));
    }

    #[test]
    fn training_is_deterministic() {
        let table = table();
        let mut documents = corpus();
        embed_all(&table, &mut documents);

        let first = NewsClassifier::new().train(&documents, 2).expect("trains");
        let second = NewsClassifier::new().train(&documents, 2).expect("trains");
        let probe = array![0.5_f32, 0.5, 0.05];
        assert_eq!(
            first.probabilities(probe.view()).expect("probabilities"),
            second.probabilities(probe.view()).expect("probabilities")
        );
        assert_eq!(first.final_loss().to_bits(), second.final_loss().to_bits());
    }

    #[test]
    fn custom_options_are_used_for_training() {
        let table = table();
        let mut documents = corpus();
        embed_all(&table, &mut documents);

        let classifier = NewsClassifier::with_options(TrainingOptions {
            epochs: 0,
            ..TrainingOptions::default()
        });
        assert_eq!(classifier.options().epochs, 0);
        assert_eq!(classifier.options().seed, 42);

        let model = classifier.train(&documents, 3).expect("trains");
        assert_eq!(model.num_classes(), 3);
        assert_eq!(model.input_dim(), 3);
        assert!(model.final_loss().is_nan());
        let probabilities = model
            .probabilities(array![0.5_f32, 0.5, 0.05].view())
            .expect("probabilities");
        assert_eq!(probabilities.len(), 3);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let table = table();
        let mut documents = corpus();
        embed_all(&table, &mut documents);
        let model = NewsClassifier::new().train(&documents, 3).expect("trains");
        let output = model
            .probabilities(array![1.0_f32, 0.0, 0.0].view())
            .expect("probabilities");
        assert_eq!(output.len(), 3);
        assert!((output.sum() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn label_outside_class_range_is_rejected() {
        let table = table();
        let mut documents = vec![document("goal", DatasetRole::Training, "3")];
        embed_all(&table, &mut documents);
        let error = NewsClassifier::new()
            .train(&documents, 2)
            .expect_err("label out of range");
        assert_eq!(
            error,
            ClassifierError::LabelRange {
                label: 3,
                num_classes: 2
            }
        );

        documents = vec![document("goal", DatasetRole::Training, "0")];
        embed_all(&table, &mut documents);
        let error = NewsClassifier::new()
            .train(&documents, 2)
            .expect_err("label zero");
        assert!(matches!(
            error,
            ClassifierError::LabelRange { label: 0, .. }
        ));
    }

    #[test]
    fn non_integer_label_is_rejected() {
        let table = table();
        let mut documents = vec![document("goal", DatasetRole::Training, "sports")];
        embed_all(&table, &mut documents);
        let error = NewsClassifier::new()
            .train(&documents, 2)
            .expect_err("label not numeric");
        assert!(matches!(error, ClassifierError::InvalidLabel { .. }));
    }

    #[test]
    fn corpus_without_training_documents_is_rejected() {
        let table = table();
        let mut documents = vec![document("goal", DatasetRole::Testing, "-1")];
        embed_all(&table, &mut documents);
        let error = NewsClassifier::new()
            .train(&documents, 2)
            .expect_err("no training data");
        assert_eq!(error, ClassifierError::NoTrainingData);
    }

    #[test]
    fn documents_must_be_embedded_before_training() {
        let documents = vec![document("goal", DatasetRole::Training, "1")];
        let error = NewsClassifier::new()
            .train(&documents, 2)
            .expect_err("missing features");
        assert!(matches!(error, ClassifierError::MissingFeatures { .. }));
    }

    #[test]
    fn zero_classes_is_rejected() {
        let error = NewsClassifier::new().train(&[], 0).expect_err("no classes");
        assert_eq!(error, ClassifierError::NoClasses);
    }

    #[test]
    fn wrong_vector_length_is_a_shape_error() {
        let table = table();
        let mut documents = corpus();
        embed_all(&table, &mut documents);
        let model = NewsClassifier::new().train(&documents, 2).expect("trains");
        let error = model
            .probabilities(array![1.0_f32, 0.0].view())
            .expect_err("wrong length");
        assert_eq!(
            error,
            ClassifierError::Shape {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&array![0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&array![0.5, 0.5]), 0);
    }
}
