//! 記事コーパスの読み込みとレコード型。
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

pub mod markup;

/// ラベル未確定（予測前）を表す値。
pub const UNKNOWN_LABEL: &str = "-1";

/// 記事がどちらのデータセットに属するか。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetRole {
    Training,
    Testing,
}

impl DatasetRole {
    /// 大文字小文字を区別せずに役割名を解釈する。
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("training") {
            Some(Self::Training)
        } else if name.eq_ignore_ascii_case("testing") {
            Some(Self::Testing)
        } else {
            None
        }
    }
}

/// 1記事分の生データ。
///
/// `label` は予測ステップで一度だけ上書きされる。それ以外は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRecord {
    title: String,
    raw_content: String,
    role: DatasetRole,
    label: String,
}

impl CorpusRecord {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        raw_content: impl Into<String>,
        role: DatasetRole,
        label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            raw_content: raw_content.into(),
            role,
            label: label.into(),
        }
    }

    /// マークアップ文字列からレコードを組み立てる。
    #[must_use]
    pub fn from_markup(document: &str) -> Self {
        let fields = markup::extract(document);
        Self {
            title: fields.title,
            raw_content: fields.content,
            role: fields.role,
            label: fields.label,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    #[must_use]
    pub fn role(&self) -> DatasetRole {
        self.role
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = label;
    }
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// ディレクトリ内の記事ファイルをファイル名順に読み込む。
///
/// 隠しファイルと `.htm` / `.html` 以外のファイルは無視する。
/// 読み込めなかったファイルは警告を出してスキップする。
///
/// # Errors
/// ディレクトリ自体を列挙できない場合は [`CorpusError`] を返す。
pub fn load_corpus(dir: &Path) -> Result<Vec<CorpusRecord>, CorpusError> {
    let entries = fs::read_dir(dir).map_err(|source| CorpusError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_file()))
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .filter(|(name, _)| is_article_file(name))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut records = Vec::with_capacity(files.len());
    for (name, path) in files {
        match fs::read_to_string(&path) {
            Ok(document) => records.push(CorpusRecord::from_markup(&document)),
            Err(error) => {
                warn!(
                    file = %name,
                    error = %error,
                    "skipping unreadable article file"
                );
            }
        }
    }

    info!(
        directory = %dir.display(),
        documents = records.len(),
        "corpus loaded"
    );
    Ok(records)
}

fn is_article_file(name: &str) -> bool {
    if name.starts_with('.') {
        return false;
    }
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("htm") || ext.eq_ignore_ascii_case("html"))
}
