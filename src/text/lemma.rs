//! ルールベースの英語見出し語化。
//!
//! 不規則形の辞書を先に引き、残りは接尾辞ルールで処理する。
//! 数字を含むトークンはそのまま返す。
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

const IRREGULAR: &[(&str, &str)] = &[
    ("is", "be"),
    ("are", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("am", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("doing", "do"),
    ("went", "go"),
    ("gone", "go"),
    ("goes", "go"),
    ("made", "make"),
    ("making", "make"),
    ("said", "say"),
    ("says", "say"),
    ("known", "know"),
    ("knew", "know"),
    ("took", "take"),
    ("taken", "take"),
    ("taking", "take"),
    ("gave", "give"),
    ("given", "give"),
    ("came", "come"),
    ("coming", "come"),
    ("saw", "see"),
    ("seen", "see"),
    ("found", "find"),
    ("thought", "think"),
    ("told", "tell"),
    ("became", "become"),
    ("began", "begin"),
    ("begun", "begin"),
    ("brought", "bring"),
    ("bought", "buy"),
    ("built", "build"),
    ("held", "hold"),
    ("kept", "keep"),
    ("left", "leave"),
    ("led", "lead"),
    ("lost", "lose"),
    ("met", "meet"),
    ("paid", "pay"),
    ("ran", "run"),
    ("sold", "sell"),
    ("sent", "send"),
    ("spent", "spend"),
    ("stood", "stand"),
    ("won", "win"),
    ("wrote", "write"),
    ("written", "write"),
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("better", "good"),
    ("best", "good"),
    ("worse", "bad"),
    ("worst", "bad"),
    ("older", "old"),
    ("oldest", "old"),
    ("higher", "high"),
    ("highest", "high"),
    ("larger", "large"),
    ("largest", "large"),
    ("longer", "long"),
    ("used", "use"),
    ("using", "use"),
    ("during", "during"),
    ("morning", "morning"),
    ("evening", "evening"),
    ("nothing", "nothing"),
    ("something", "something"),
    ("anything", "anything"),
    ("everything", "everything"),
    ("hundred", "hundred"),
    ("news", "news"),
    ("series", "series"),
    ("species", "species"),
];

static IRREGULAR_MAP: LazyLock<FxHashMap<&'static str, &'static str>> =
    LazyLock::new(|| IRREGULAR.iter().copied().collect());

/// 小文字化済みトークンの見出し語を返す。
#[must_use]
pub fn lemmatize(token: &str) -> String {
    if let Some(lemma) = IRREGULAR_MAP.get(token) {
        return (*lemma).to_string();
    }
    if token.len() <= 3 || !token.bytes().all(|b| b.is_ascii_lowercase()) {
        return token.to_string();
    }

    if let Some(stem) = token.strip_suffix("ies")
        && token.len() > 4
    {
        return format!("{stem}y");
    }
    if let Some(stem) = token.strip_suffix("ied")
        && token.len() > 4
    {
        return format!("{stem}y");
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    for suffix in ["ches", "shes", "xes", "zzes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    if let Some(stem) = token.strip_suffix("ing")
        && token.len() > 5
        && has_vowel(stem)
    {
        return restore_stem(stem);
    }
    if token.ends_with("eed") {
        return token.to_string();
    }
    if let Some(stem) = token.strip_suffix("ed")
        && has_vowel(stem)
    {
        return restore_stem(stem);
    }
    if token.ends_with('s') && !["ss", "us", "is"].iter().any(|end| token.ends_with(end)) {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// 語尾の `e` が落ちた語幹の末尾。
const SILENT_E_ENDINGS: [&str; 12] = [
    "bl", "tl", "iz", "aus", "ais", "ur", "uc", "ag", "rg", "dg", "iv", "ov",
];

fn has_vowel(stem: &str) -> bool {
    stem.bytes().any(is_vowel)
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// `-ed` / `-ing` を外した語幹を補正する。
fn restore_stem(stem: &str) -> String {
    let bytes = stem.as_bytes();
    let n = bytes.len();

    // stopp -> stop, runn -> run
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !is_vowel(bytes[n - 1]) {
        if matches!(bytes[n - 1], b'l' | b's' | b'z') {
            return stem.to_string();
        }
        return stem[..n - 1].to_string();
    }

    // caus -> cause, measur -> measure, settl -> settle
    if SILENT_E_ENDINGS.iter().any(|end| stem.ends_with(end)) {
        return format!("{stem}e");
    }
    // locat -> locate、treat はそのまま
    if stem.ends_with("at") && n >= 3 && !is_vowel(bytes[n - 3]) {
        return format!("{stem}e");
    }

    // mak -> make, liv -> live
    if n == 3 && !is_vowel(bytes[0]) && is_vowel(bytes[1]) && !is_consonant_exempt(bytes[2]) {
        return format!("{stem}e");
    }

    stem.to_string()
}

fn is_consonant_exempt(b: u8) -> bool {
    is_vowel(b) || matches!(b, b'w' | b'x' | b'y')
}
