//! 記事マークアップからタイトル・本文・役割・ラベルを取り出す。
//!
//! 抽出に失敗したフィールドはエラーにせず番兵値を返す。
use super::{DatasetRole, UNKNOWN_LABEL};

pub const TITLE_NOT_FOUND: &str = "Title not found!";
pub const CONTENT_NOT_FOUND: &str = "Content not found!";

const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";
const TITLE_SUFFIX: &str = " |";
const BODY_OPEN: &str = "\"articleBody\": \"";
const BODY_CLOSE: &str = " \",\"mainEntityOfPage\":";
const DATATYPE_OPEN: &str = "<datatype>";
const DATATYPE_CLOSE: &str = "</datatype>";
const LABEL_OPEN: &str = "<label>";
const LABEL_CLOSE: &str = "</label>";

/// 抽出結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFields {
    pub title: String,
    pub content: String,
    pub role: DatasetRole,
    pub label: String,
}

#[must_use]
pub fn extract(document: &str) -> ArticleFields {
    ArticleFields {
        title: title(document),
        content: content(document),
        role: role(document),
        label: label(document),
    }
}

/// `<title>` の中身を返す。サイト名の区切り ` |` 以降は落とす。
#[must_use]
pub fn title(document: &str) -> String {
    between(document, TITLE_OPEN, TITLE_CLOSE).map_or_else(
        || TITLE_NOT_FOUND.to_string(),
        |full| match full.find(TITLE_SUFFIX) {
            Some(cut) => full[..cut].to_string(),
            None => full.to_string(),
        },
    )
}

/// 埋め込みJSONの `articleBody` を小文字化して返す。
#[must_use]
pub fn content(document: &str) -> String {
    between(document, BODY_OPEN, BODY_CLOSE)
        .map_or_else(|| CONTENT_NOT_FOUND.to_string(), str::to_lowercase)
}

#[must_use]
pub fn role(document: &str) -> DatasetRole {
    between(document, DATATYPE_OPEN, DATATYPE_CLOSE)
        .and_then(DatasetRole::from_name)
        .unwrap_or(DatasetRole::Testing)
}

#[must_use]
pub fn label(document: &str) -> String {
    between(document, LABEL_OPEN, LABEL_CLOSE)
        .map_or_else(|| UNKNOWN_LABEL.to_string(), |raw| raw.trim().to_string())
}

/// 開きタグと閉じタグの間の文字列。どちらかが無い、または順序が逆なら `None`。
fn between<'a>(document: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = document.find(open)? + open.len();
    let end = document.find(close)?;
    (end > start).then(|| &document[start..end])
}
