//! 本文の正規化（クリーニング・トークン化・見出し語化・ストップワード除去）。
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

mod lemma;
mod stopwords;

pub use lemma::lemmatize;
pub use stopwords::{STOPWORDS, is_stopword};

/// テキスト正規化の契約。
///
/// 出力は小文字の見出し語を半角スペース1つで連結したもの。
/// 同じ入力には常に同じ出力を返すこと。
pub trait TextNormalizer {
    fn normalize(&self, text: &str) -> String;
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, text: &str) -> String {
        self(text)
    }
}

/// ルールベースの英語正規化器。
///
/// パイプラインが1インスタンスを保持して全文書で使い回す。
#[derive(Debug)]
pub struct LemmaNormalizer {
    strip_re: Regex,
}

impl LemmaNormalizer {
    /// # Panics
    /// 組み込みの正規表現がコンパイルできない場合（起こらない）。
    #[must_use]
    pub fn new() -> Self {
        Self {
            strip_re: Regex::new(r"[^a-z0-9\s]+").expect("compile strip pattern"),
        }
    }

    /// 小文字化し、`a-z`・`0-9`・空白以外の文字を取り除く。
    ///
    /// アクセント付き文字は NFKD 分解してから基底文字だけを残す。
    #[must_use]
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.nfkd().collect::<String>().to_lowercase();
        self.strip_re.replace_all(&lowered, "").trim().to_string()
    }
}

impl Default for LemmaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer for LemmaNormalizer {
    fn normalize(&self, text: &str) -> String {
        let cleaned = self.clean(text);
        let mut lemmas = Vec::new();
        for word in cleaned.unicode_words() {
            let lemma = lemmatize(word);
            if !is_stopword(&lemma) {
                lemmas.push(lemma);
            }
        }
        lemmas.join(" ")
    }
}
