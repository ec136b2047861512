//! 分類パイプライン全体の組み立て。
//!
//! 語彙表・正規化器・文書リストを所有し、
//! 行数決定 → 埋め込み → 学習 → 予測 → 集計 の順に各段を実行する。
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::classifier::{NewsClassifier, TrainedClassifier};
use crate::corpus::{CorpusRecord, DatasetRole, load_corpus};
use crate::embedding::{DocumentEmbedder, EmbeddableDocument, FeatureSizer, VectorTable};
use crate::report::{self, LabelGroup};
use crate::text::{LemmaNormalizer, STOPWORDS, TextNormalizer};

/// 正規化後トークンのうち語彙表に載っているものの割合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VocabularyCoverage {
    pub total_tokens: usize,
    pub embedded_tokens: usize,
}

impl VocabularyCoverage {
    /// トークンが1つも無ければ 0.0。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total_tokens == 0 {
            0.0
        } else {
            self.embedded_tokens as f64 / self.total_tokens as f64
        }
    }
}

#[derive(Debug)]
pub struct Pipeline<N = LemmaNormalizer> {
    table: VectorTable,
    normalizer: N,
    documents: Vec<EmbeddableDocument>,
    embedding_size: Option<usize>,
}

impl Pipeline<LemmaNormalizer> {
    #[must_use]
    pub fn new(table: VectorTable, records: Vec<CorpusRecord>) -> Self {
        Self::with_normalizer(table, LemmaNormalizer::new(), records)
    }

    /// 語彙ファイルと記事ディレクトリを読み込んでパイプラインを作る。
    ///
    /// # Errors
    /// 語彙ファイルが壊れているか、記事ディレクトリを読めない場合。
    pub fn from_paths(vectors_path: &Path, corpus_dir: &Path) -> Result<Self> {
        let table = VectorTable::load(vectors_path, &STOPWORDS).with_context(|| {
            format!(
                "failed to load vector table from {}",
                vectors_path.display()
            )
        })?;
        let records = load_corpus(corpus_dir)
            .with_context(|| format!("failed to load corpus from {}", corpus_dir.display()))?;
        Ok(Self::new(table, records))
    }
}

impl<N: TextNormalizer> Pipeline<N> {
    #[must_use]
    pub fn with_normalizer(table: VectorTable, normalizer: N, records: Vec<CorpusRecord>) -> Self {
        let documents = records.into_iter().map(EmbeddableDocument::new).collect();
        Self {
            table,
            normalizer,
            documents,
            embedding_size: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &VectorTable {
        &self.table
    }

    #[must_use]
    pub fn documents(&self) -> &[EmbeddableDocument] {
        &self.documents
    }

    #[must_use]
    pub fn embedding_size(&self) -> Option<usize> {
        self.embedding_size
    }

    #[must_use]
    pub fn count_role(&self, role: DatasetRole) -> usize {
        self.documents
            .iter()
            .filter(|document| document.role() == role)
            .count()
    }

    /// 正規化済みの文書について語彙カバー率を数える。未正規化の文書は数えない。
    #[must_use]
    pub fn coverage(&self) -> VocabularyCoverage {
        let sizer = FeatureSizer::new(&self.table);
        let mut coverage = VocabularyCoverage::default();
        for document in &self.documents {
            let Some(text) = document.normalized_text() else {
                continue;
            };
            coverage.total_tokens += text.split_whitespace().count();
            coverage.embedded_tokens += sizer.in_vocabulary_count(text);
        }
        coverage
    }

    /// 埋め込み行数を決め、全文書に設定する。
    ///
    /// # Errors
    /// 文書が1件も無い場合。
    pub fn compute_embedding_size(&mut self) -> Result<usize> {
        let size = FeatureSizer::new(&self.table)
            .compute_size(&mut self.documents, &self.normalizer)
            .context("failed to compute embedding size")?;
        for document in &mut self.documents {
            document.set_row_count(size);
        }
        self.embedding_size = Some(size);

        let coverage = self.coverage();
        info!(
            documents = self.documents.len(),
            training = self.count_role(DatasetRole::Training),
            testing = self.count_role(DatasetRole::Testing),
            embedding_size = size,
            total_tokens = coverage.total_tokens,
            embedded_tokens = coverage.embedded_tokens,
            coverage = coverage.ratio(),
            "embedding size computed"
        );
        Ok(size)
    }

    /// 全文書の特徴ベクトルを計算する。
    ///
    /// 行数未設定・正規化テキスト欠落の文書は、埋め込む前に前提を補う。
    /// 補った後の埋め込みは一度きりで、失敗すればエラー。
    ///
    /// # Errors
    /// 行数が決められない場合、または修復後も埋め込みに失敗した場合。
    pub fn populate_embeddings(&mut self) -> Result<()> {
        let size = match self.embedding_size {
            Some(size) => size,
            None => self.compute_embedding_size()?,
        };

        let embedder = DocumentEmbedder::new(&self.table);
        let mut repaired = 0_usize;
        for document in &mut self.documents {
            for reason in repair(document, size, &self.normalizer) {
                repaired += 1;
                warn!(
                    title = document.title(),
                    reason,
                    "repaired embedding prerequisite"
                );
            }
            let title = document.title().to_string();
            embedder
                .embed(document)
                .map(|_| ())
                .with_context(|| format!("failed to embed document {title:?}"))?;
        }

        info!(
            documents = self.documents.len(),
            embedding_size = size,
            repaired,
            "feature vectors populated"
        );
        Ok(())
    }

    /// 既定の設定で分類器を学習する。
    ///
    /// # Errors
    /// 学習データに問題がある場合。
    pub fn train(&self, num_classes: usize) -> Result<TrainedClassifier> {
        self.train_with(NewsClassifier::new(), num_classes)
    }

    /// # Errors
    /// 学習データに問題がある場合。
    pub fn train_with(
        &self,
        classifier: NewsClassifier,
        num_classes: usize,
    ) -> Result<TrainedClassifier> {
        classifier
            .train(&self.documents, num_classes)
            .context("failed to train classifier")
    }

    /// Testing 文書のラベルを予測値で上書きする。
    ///
    /// # Errors
    /// 特徴ベクトルが無いか形が合わない文書がある場合。
    pub fn predict(&mut self, model: &TrainedClassifier) -> Result<Vec<usize>> {
        model
            .predict_testing(&mut self.documents)
            .context("failed to classify testing documents")
    }

    /// # Errors
    /// ラベルが整数でない Testing 文書がある場合。
    pub fn report(&self) -> Result<Vec<LabelGroup>> {
        report::report(&self.documents).context("failed to group predictions")
    }

    /// 全段を順に実行し、集計結果を返す。
    ///
    /// # Errors
    /// いずれかの段が失敗した場合。
    pub fn run(&mut self, num_classes: usize) -> Result<Vec<LabelGroup>> {
        self.compute_embedding_size()?;
        self.populate_embeddings()?;
        let model = self.train(num_classes)?;
        self.predict(&model)?;
        self.report()
    }
}

/// 埋め込みの前提（行数・正規化テキスト）が欠けていれば補い、補った項目を返す。
fn repair<N: TextNormalizer>(
    document: &mut EmbeddableDocument,
    size: usize,
    normalizer: &N,
) -> Vec<&'static str> {
    let mut repaired = Vec::new();
    if document.row_count().is_none() {
        document.set_row_count(size);
        repaired.push("missing row count");
    }
    if document.normalized_text().is_none_or(str::is_empty) {
        document.reset_normalized_text();
        document.normalize_with(normalizer);
        repaired.push("missing normalized text");
    }
    repaired
}
