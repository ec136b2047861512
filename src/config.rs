use std::{
    env,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// ログの出力形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// 分類結果の出力形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    corpus_dir: PathBuf,
    vectors_path: PathBuf,
    class_count: NonZeroUsize,
    log_format: LogFormat,
    report_format: ReportFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から分類器の設定値を読み込み、検証する。
    ///
    /// # Errors
    /// `NEWS_CORPUS_DIR` / `NEWS_VECTORS_PATH` が未設定、もしくは各種値のパースに失敗した場合は
    /// [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let corpus_dir = PathBuf::from(env_var("NEWS_CORPUS_DIR")?);
        let vectors_path = PathBuf::from(env_var("NEWS_VECTORS_PATH")?);
        let class_count = parse_non_zero_usize("NEWS_CLASS_COUNT", 2)?;
        let log_format = parse_log_format("NEWS_LOG_FORMAT", LogFormat::Json)?;
        let report_format = parse_report_format("NEWS_REPORT_FORMAT", ReportFormat::Text)?;

        Ok(Self {
            corpus_dir,
            vectors_path,
            class_count,
            log_format,
            report_format,
        })
    }

    #[must_use]
    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    #[must_use]
    pub fn vectors_path(&self) -> &Path {
        &self.vectors_path
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.class_count.get()
    }

    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    #[must_use]
    pub fn report_format(&self) -> ReportFormat {
        self.report_format
    }
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_non_zero_usize(name: &'static str, default: usize) -> Result<NonZeroUsize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|error| ConfigError::Invalid {
            name,
            source: anyhow::Error::new(error),
        })?;
    NonZeroUsize::new(parsed).ok_or_else(|| ConfigError::Invalid {
        name,
        source: anyhow::anyhow!("must be greater than zero"),
    })
}

fn parse_log_format(name: &'static str, default: LogFormat) -> Result<LogFormat, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "plain" | "text" | "pretty" => Ok(LogFormat::Plain),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("unknown log format: {raw}"),
        }),
    }
}

fn parse_report_format(
    name: &'static str,
    default: ReportFormat,
) -> Result<ReportFormat, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "text" => Ok(ReportFormat::Text),
        "json" => Ok(ReportFormat::Json),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("unknown report format: {raw}"),
        }),
    }
}
