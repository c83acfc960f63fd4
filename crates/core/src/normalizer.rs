//! Canonical token forms shared by ingestion, storage keys and queries.
//!
//! `normalize` runs width canonicalization, delimiter stripping, trimming,
//! ASCII case folding (English) and script simplification (Chinese), in that
//! order. Every step is idempotent, so the whole pipeline is too.

use std::fmt;
use std::sync::Arc;

use crate::language::Language;

/// Hook for traditional-to-simplified conversion of Chinese text.
///
/// Implementations must be idempotent.
pub trait ScriptSimplifier: Send + Sync {
    fn simplify(&self, text: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IdentitySimplifier;

impl ScriptSimplifier for IdentitySimplifier {
    fn simplify(&self, text: &str) -> String {
        text.to_string()
    }
}

#[derive(Clone)]
pub struct TextNormalizer {
    simplifier: Arc<dyn ScriptSimplifier>,
}

impl fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNormalizer").finish_non_exhaustive()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            simplifier: Arc::new(IdentitySimplifier),
        }
    }

    pub fn with_simplifier(simplifier: Arc<dyn ScriptSimplifier>) -> Self {
        Self { simplifier }
    }

    pub fn normalize(&self, text: &str, language: Language) -> String {
        let profile = language.profile();
        let widened = canonicalize_width(text);
        let stripped = strip_delimiters(&widened, language);
        let trimmed = stripped.trim();
        let folded = if profile.fold_ascii_case {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        };
        match language {
            Language::Zh => self.simplifier.simplify(&folded),
            Language::En => folded,
        }
    }

    /// Splits a corpus row on the language's delimiters and normalizes each
    /// piece, dropping the ones that end up empty.
    pub fn tokenize(&self, row: &str, language: Language) -> Vec<String> {
        let delimiters = language.profile().delimiters;
        canonicalize_width(row)
            .split(|c: char| delimiters.contains(&c))
            .map(|tok| self.normalize(tok, language))
            .filter(|tok| !tok.is_empty())
            .collect()
    }
}

/// Key form used for stored vocabulary text: trimmed, and fully lowercased
/// for English (`CAFÉ` and `café` share a key). Inner punctuation is kept so
/// user input round-trips.
pub fn entry_key(text: &str, language: Language) -> String {
    let trimmed = text.trim();
    match language {
        Language::En => trimmed.to_lowercase(),
        Language::Zh => trimmed.to_string(),
    }
}

/// Maps full-width ASCII variants to ASCII and the ideographic space to a space.
pub fn canonicalize_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(c as u32 - 0xFF01 + 0x21).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

pub fn strip_delimiters(text: &str, language: Language) -> String {
    let delimiters = language.profile().delimiters;
    text.chars().filter(|c| !delimiters.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn english_is_trimmed_folded_and_stripped() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("  Hello,\tWorld  ", Language::En), "helloworld");
        assert_eq!(n.normalize("\u{3000}RUN\u{3000}", Language::En), "run");
    }

    #[test]
    fn chinese_keeps_case_and_strips_full_width_comma() {
        let n = TextNormalizer::new();
        assert_eq!(n.normalize(" 苹果，Apple ", Language::Zh), "苹果Apple");
        assert_eq!(n.normalize("\u{3000}你好\u{3000}", Language::Zh), "你好");
    }

    #[test]
    fn full_width_letters_become_ascii() {
        assert_eq!(canonicalize_width("ＡＢＣ１"), "ABC1");
        let n = TextNormalizer::new();
        assert_eq!(n.normalize("ＡＰＰＬＥ", Language::En), "apple");
    }

    #[test]
    fn tokenize_drops_empty_tokens() {
        let n = TextNormalizer::new();
        assert_eq!(
            n.tokenize("Run, jog,, Sprint ,", Language::En),
            vec!["run", "jog", "sprint"]
        );
        assert_eq!(n.tokenize("高兴，快乐,\t愉快", Language::Zh), vec!["高兴", "快乐", "愉快"]);
    }

    struct MenSimplifier;

    impl ScriptSimplifier for MenSimplifier {
        fn simplify(&self, text: &str) -> String {
            text.replace('們', "们")
        }
    }

    #[test]
    fn simplifier_only_applies_to_chinese() {
        let n = TextNormalizer::with_simplifier(Arc::new(MenSimplifier));
        assert_eq!(n.normalize("我們", Language::Zh), "我们");
        assert_eq!(n.normalize("我們", Language::En), "我們");
    }

    #[test]
    fn entry_key_keeps_inner_punctuation() {
        assert_eq!(entry_key("  Hello, World ", Language::En), "hello, world");
        assert_eq!(entry_key(" 你好 ", Language::Zh), "你好");
        assert_eq!(entry_key("CAFÉ", Language::En), "café");
        assert_eq!(entry_key("ÄPFEL", Language::Zh), "ÄPFEL");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_normalize_is_idempotent(text in "\\PC{1,24}", zh in any::<bool>()) {
            let n = TextNormalizer::new();
            let lang = if zh { Language::Zh } else { Language::En };
            let once = n.normalize(&text, lang);
            prop_assert_eq!(n.normalize(&once, lang), once);
        }
    }
}
