//! String similarity: Levenshtein distance and bigram (Dice) overlap.

use std::collections::HashMap;

/// Minimum number of single-character insertions, deletions or substitutions
/// needed to turn `a` into `b`. Operates on chars, not bytes.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev_row: Vec<usize> = (0..=b.len()).collect();
    let mut curr_row = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr_row[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b.len()]
}

/// Overlapping two-character windows of `s`. A one-character string is its
/// own single bigram; the empty string has none.
pub fn bigrams(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    match chars.len() {
        0 => Vec::new(),
        1 => vec![s.to_string()],
        _ => chars.windows(2).map(|w| w.iter().collect()).collect(),
    }
}

/// Dice coefficient over bigram multisets: `2 * matched / (|A| + |B|)`.
///
/// Each bigram of `b` consumes at most one remaining occurrence from `a`, so
/// repeats on one side cannot over-count against the other.
pub fn bigram_overlap_score(a: &str, b: &str) -> f64 {
    let a_grams = bigrams(a);
    let b_grams = bigrams(b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for g in &a_grams {
        *remaining.entry(g.as_str()).or_default() += 1;
    }
    let mut matched = 0usize;
    for g in &b_grams {
        if let Some(count) = remaining.get_mut(g.as_str()) {
            if *count > 0 {
                *count -= 1;
                matched += 1;
            }
        }
    }
    (2.0 * matched as f64) / (a_grams.len() + b_grams.len()) as f64
}

/// Similarity used for ranking and linking.
pub fn similarity(a: &str, b: &str) -> f64 {
    bigram_overlap_score(a, b)
}

pub fn is_close(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn edit_distance_counts_chars() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("苹果", "苹果树"), 1);
        assert_eq!(distance("same", "same"), 0);
    }

    #[test]
    fn short_strings_are_a_single_bigram() {
        assert_eq!(bigrams("a"), vec!["a"]);
        assert!(bigrams("").is_empty());
        assert_eq!(bigrams("你好吗"), vec!["你好", "好吗"]);
    }

    #[test]
    fn typo_still_overlaps() {
        let s = bigram_overlap_score("aple", "apple");
        // {ap, pl, le} vs {ap, pp, pl, le}: 2*3/7
        assert!((s - 6.0 / 7.0).abs() < 1e-9);
        assert!(is_close("aple", "apple", 0.8));
        assert!(!is_close("aple", "banana", 0.1));
    }

    #[test]
    fn repeated_bigrams_are_not_over_counted() {
        // "aaaa" has three "aa"; "aa" has one. Only one can match.
        let s = bigram_overlap_score("aaaa", "aa");
        assert!((s - 2.0 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(bigram_overlap_score("", "abc"), 0.0);
        assert_eq!(bigram_overlap_score("abc", ""), 0.0);
        assert_eq!(bigram_overlap_score("", ""), 0.0);
    }

    proptest! {
        #[test]
        fn prop_self_similarity_is_one(a in "\\PC{2,20}") {
            prop_assert!((bigram_overlap_score(&a, &a) - 1.0).abs() < 1e-12);
        }

        #[test]
        fn prop_symmetric(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            prop_assert_eq!(bigram_overlap_score(&a, &b), bigram_overlap_score(&b, &a));
        }

        #[test]
        fn prop_empty_is_zero(x in "\\PC{0,12}") {
            prop_assert_eq!(bigram_overlap_score("", &x), 0.0);
        }
    }
}
