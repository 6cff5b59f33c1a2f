use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Word characters plus CJK ideographs; everything else separates tokens.
    static ref RE: Regex = Regex::new(r"(?u)[\w\p{Han}]+").expect("valid regex");
}

/// Tokenize text into lowercase terms using NFKC normalization.
///
/// Punctuation and symbols act as separators, runs of separators collapse, and
/// empty tokens never appear. No stemming and no stopword removal, so every
/// token a user can type is matchable.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        assert_eq!(tokenize("Primary Blue, #1E90FF!"), vec!["primary", "blue", "1e90ff"]);
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(tokenize("--a//b  ..c--"), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_and_punctuation_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  !?... --- ").is_empty());
    }
}
