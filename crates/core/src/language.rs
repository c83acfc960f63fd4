//! Language tags and the per-language strategy table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
}

/// Per-language behavior supplied as data rather than by subtyping.
#[derive(Debug)]
pub struct LanguageProfile {
    pub code: &'static str,
    pub label: &'static str,
    /// Characters that separate tokens in a corpus row and are stripped by normalization.
    pub delimiters: &'static [char],
    pub fold_ascii_case: bool,
}

const EN_PROFILE: LanguageProfile = LanguageProfile {
    code: "en",
    label: "English",
    delimiters: &[',', '\t'],
    fold_ascii_case: true,
};

const ZH_PROFILE: LanguageProfile = LanguageProfile {
    code: "zh",
    label: "Chinese",
    delimiters: &[',', '\u{FF0C}', '\t'],
    fold_ascii_case: false,
};

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Zh];

    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            Language::En => &EN_PROFILE,
            Language::Zh => &ZH_PROFILE,
        }
    }

    pub fn code(self) -> &'static str {
        self.profile().code
    }

    pub fn other(self) -> Language {
        match self {
            Language::En => Language::Zh,
            Language::Zh => Language::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "chinese" => Ok(Language::Zh),
            other => Err(format!("unknown language: {other}")),
        }
    }
}

/// Language requested by the caller of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageHint {
    #[default]
    Auto,
    En,
    Zh,
    Both,
}

/// Language a query is actually evaluated in once `Auto` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryLanguage {
    One(Language),
    Both,
}

impl QueryLanguage {
    pub fn languages(self) -> Vec<Language> {
        match self {
            QueryLanguage::One(lang) => vec![lang],
            QueryLanguage::Both => Language::ALL.to_vec(),
        }
    }
}

impl LanguageHint {
    pub fn resolve(self, query: &str) -> QueryLanguage {
        match self {
            LanguageHint::Auto => QueryLanguage::One(detect_language(query)),
            LanguageHint::En => QueryLanguage::One(Language::En),
            LanguageHint::Zh => QueryLanguage::One(Language::Zh),
            LanguageHint::Both => QueryLanguage::Both,
        }
    }
}

impl FromStr for LanguageHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(LanguageHint::Auto),
            "en" => Ok(LanguageHint::En),
            "zh" => Ok(LanguageHint::Zh),
            "both" => Ok(LanguageHint::Both),
            other => Err(format!(
                "unknown language hint: {other} (expected auto|en|zh|both)"
            )),
        }
    }
}

/// CJK ideographs, CJK punctuation and full-width forms: everything whose
/// UTF-8 encoding is a three-byte sequence in the CJK planes.
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{3000}'..='\u{303F}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF00}'..='\u{FFEF}')
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

pub fn detect_language(text: &str) -> Language {
    if contains_cjk(text) {
        Language::Zh
    } else {
        Language::En
    }
}
