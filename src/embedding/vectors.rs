//! 事前学習済み単語ベクトル表。
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::ParseFloatError;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::info;

/// 語彙表の1エントリ。読み込み後は不変。
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyEntry {
    word: String,
    vector: Vec<f32>,
}

impl VocabularyEntry {
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// ベクトルファイルが壊れている場合のエラー。起動時に致命的として扱う。
#[derive(Debug, Error)]
pub enum VectorTableError {
    #[error("failed to open vector file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read vector file at line {line}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected a word followed by at least one component")]
    MissingFields { line: usize },
    #[error("line {line}: component {value:?} is not a number")]
    InvalidComponent {
        line: usize,
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("line {line}: vector has {found} components, expected {expected}")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("vector source contains no rows")]
    Empty,
}

/// ストップワードを除いた単語ベクトル表。大文字小文字を区別せずに引ける。
///
/// 同じ単語が複数回現れた場合は最初の行を採用する。
#[derive(Debug, Clone)]
pub struct VectorTable {
    entries: Vec<VocabularyEntry>,
    index: FxHashMap<String, usize>,
    dimension: usize,
}

impl VectorTable {
    /// `(単語, ベクトル)` の列から表を組み立てる。
    ///
    /// # Errors
    /// 行ごとの次元が揃っていない場合、または入力が空の場合にエラーを返す。
    pub fn from_pairs<I>(pairs: I, stopwords: &[&str]) -> Result<Self, VectorTableError>
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let stopwords: FxHashSet<String> = stopwords.iter().map(|w| w.to_lowercase()).collect();
        let mut entries = Vec::new();
        let mut index = FxHashMap::default();
        let mut dimension = None;

        for (position, (word, vector)) in pairs.into_iter().enumerate() {
            let line = position + 1;
            if vector.is_empty() {
                return Err(VectorTableError::MissingFields { line });
            }
            match dimension {
                None => dimension = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(VectorTableError::DimensionMismatch {
                        line,
                        expected,
                        found: vector.len(),
                    });
                }
                Some(_) => {}
            }

            let key = word.to_lowercase();
            if stopwords.contains(&key) || index.contains_key(&key) {
                continue;
            }
            index.insert(key, entries.len());
            entries.push(VocabularyEntry { word, vector });
        }

        let dimension = dimension.ok_or(VectorTableError::Empty)?;
        Ok(Self {
            entries,
            index,
            dimension,
        })
    }

    /// カンマ区切り (`word,v1,...,vN`) の入力を読み込む。空行は読み飛ばす。
    ///
    /// # Errors
    /// 読み込み失敗、フィールド不足、数値でない成分、次元不一致で [`VectorTableError`] を返す。
    pub fn parse<R: BufRead>(reader: R, stopwords: &[&str]) -> Result<Self, VectorTableError> {
        let mut pairs = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let raw = line.map_err(|source| VectorTableError::Read {
                line: line_no,
                source,
            })?;
            if raw.trim().is_empty() {
                continue;
            }
            pairs.push(parse_row(&raw, line_no)?);
        }

        // 行番号をファイル上の位置に合わせるため、次元検証はここで行う。
        if let Some((_, first)) = pairs.first() {
            let expected = first.1.len();
            let mismatch = pairs
                .iter()
                .find(|(_, (_, vector))| vector.len() != expected);
            if let Some((line, (_, vector))) = mismatch {
                return Err(VectorTableError::DimensionMismatch {
                    line: *line,
                    expected,
                    found: vector.len(),
                });
            }
        }

        Self::from_pairs(pairs.into_iter().map(|(_, pair)| pair), stopwords)
    }

    /// ファイルから読み込む。
    ///
    /// # Errors
    /// ファイルを開けない場合や内容が壊れている場合にエラーを返す。
    pub fn load(path: &Path, stopwords: &[&str]) -> Result<Self, VectorTableError> {
        let file = File::open(path).map_err(|source| VectorTableError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(BufReader::new(file), stopwords)?;
        info!(
            path = %path.display(),
            entries = table.len(),
            dimension = table.dimension(),
            "vector table loaded"
        );
        Ok(table)
    }

    /// 大文字小文字を無視した完全一致検索。
    #[must_use]
    pub fn find(&self, word: &str) -> Option<&VocabularyEntry> {
        let position = if word.chars().any(char::is_uppercase) {
            self.index.get(&word.to_lowercase())
        } else {
            self.index.get(word)
        }?;
        self.entries.get(*position)
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.find(word).is_some()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VocabularyEntry> {
        self.entries.iter()
    }
}

type NumberedPair = (usize, (String, Vec<f32>));

fn parse_row(raw: &str, line: usize) -> Result<NumberedPair, VectorTableError> {
    let mut fields = raw.split(',');
    let word = fields.next().unwrap_or_default().trim();
    let components = fields
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .map_err(|source| VectorTableError::InvalidComponent {
                    line,
                    value: value.to_string(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if word.is_empty() || components.is_empty() {
        return Err(VectorTableError::MissingFields { line });
    }
    Ok((line, (word.to_string(), components)))
}
