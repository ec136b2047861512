//! 予測結果をラベルごとにまとめて出力する。
use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::corpus::DatasetRole;
use crate::embedding::EmbeddableDocument;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("document {title:?} carries non-integer label {label:?}")]
    InvalidLabel { title: String, label: String },
}

/// 1グループ分の出力。`label` は表示用（予測クラス + 1）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelGroup {
    pub label: i64,
    pub titles: Vec<String>,
}

/// Testing 文書を表示ラベルごとにまとめ、ラベルの昇順に並べる。
///
/// グループ内のタイトルは文書の並び順を保つ。
///
/// # Errors
/// ラベルが整数として解釈できない文書があれば [`ReportError::InvalidLabel`]。
pub fn report(documents: &[EmbeddableDocument]) -> Result<Vec<LabelGroup>, ReportError> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    for document in documents
        .iter()
        .filter(|document| document.role() == DatasetRole::Testing)
    {
        let label = display_label(document)?;
        match groups.iter_mut().find(|group| group.label == label) {
            Some(group) => group.titles.push(document.title().to_string()),
            None => groups.push(LabelGroup {
                label,
                titles: vec![document.title().to_string()],
            }),
        }
    }
    groups.sort_by_key(|group| group.label);
    Ok(groups)
}

fn display_label(document: &EmbeddableDocument) -> Result<i64, ReportError> {
    let raw = document.label();
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|label| label.checked_add(1))
        .ok_or_else(|| ReportError::InvalidLabel {
            title: document.title().to_string(),
            label: raw.to_string(),
        })
}

/// `Group <label>\r\n` の見出しに続けて、タイトルを1行ずつ書き出す。
///
/// # Errors
/// 書き込みに失敗した場合。
#[allow(clippy::write_with_newline)]
pub fn render<W: Write>(groups: &[LabelGroup], writer: &mut W) -> io::Result<()> {
    for group in groups {
        write!(writer, "Group {}\r\n", group.label)?;
        for title in &group.titles {
            writeln!(writer, "{title}")?;
        }
    }
    writer.flush()
}

#[must_use]
pub fn render_to_string(groups: &[LabelGroup]) -> String {
    let mut buffer = Vec::new();
    // Vec への書き込みは失敗しない
    let _ = render(groups, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

/// グループ一覧を JSON 配列として書き出す。
///
/// # Errors
/// シリアライズまたは書き込みに失敗した場合。
pub fn render_json<W: Write>(groups: &[LabelGroup], writer: &mut W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, groups)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusRecord;

    fn document(title: &str, role: DatasetRole, label: &str) -> EmbeddableDocument {
        EmbeddableDocument::new(CorpusRecord::new(title, "", role, label))
    }

    #[test]
    fn groups_are_sorted_and_keep_document_order() {
        let documents = vec![
            document("a", DatasetRole::Testing, "1"),
            document("train", DatasetRole::Training, "1"),
            document("b", DatasetRole::Testing, "0"),
            document("c", DatasetRole::Testing, "1"),
            document("d", DatasetRole::Testing, "0"),
        ];
        let groups = report(&documents).expect("report");
        assert_eq!(
            groups,
            vec![
                LabelGroup {
                    label: 1,
                    titles: vec!["b".into(), "d".into()],
                },
                LabelGroup {
                    label: 2,
                    titles: vec!["a".into(), "c".into()],
                },
            ]
        );
    }

    #[test]
    fn render_uses_crlf_headers_and_lf_titles() {
        let groups = vec![
            LabelGroup {
                label: 1,
                titles: vec!["First".into()],
            },
            LabelGroup {
                label: 2,
                titles: vec!["Second".into(), "Third".into()],
            },
        ];
        assert_eq!(
            render_to_string(&groups),
            "Group 1\r\nFirst\nGroup 2\r\nSecond\nThird\n"
        );
    }

    #[test]
    fn non_integer_label_is_reported() {
        let documents = vec![document("a", DatasetRole::Testing, "sports")];
        let error = report(&documents).expect_err("label is not numeric");
        assert_eq!(
            error,
            ReportError::InvalidLabel {
                title: "a".into(),
                label: "sports".into()
            }
        );
    }

    #[test]
    fn unpredicted_documents_form_group_zero() {
        let documents = vec![document("pending", DatasetRole::Testing, "-1")];
        let groups = report(&documents).expect("report");
        assert_eq!(groups[0].label, 0);
    }

    #[test]
    fn json_output_lists_groups() {
        let groups = vec![LabelGroup {
            label: 1,
            titles: vec!["Only".into()],
        }];
        let mut buffer = Vec::new();
        render_json(&groups, &mut buffer).expect("json renders");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(value[0]["label"], 1);
        assert_eq!(value[0]["titles"][0], "Only");
    }
}
