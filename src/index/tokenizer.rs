//! Shared tokenizer used both at ingestion and at query time
//!
//! Splitting on whitespace and upper-casing must produce byte-for-byte
//! identical tokens at both ingestion and query time or scores become
//! meaningless, so both paths build on [`tokenize_raw`]. Stop-word
//! filtering is a separate step layered on top: document ingestion still
//! needs the *unfiltered* token count for `doc_size` (stop words occupy a
//! position in the document even though they never enter the postings),
//! while query tokenization only ever wants the filtered list since a
//! stop word can never be looked up as a term.

/// Split `field` into upper-cased tokens, honoring `\`-escaped whitespace
/// (an escaped space does not split the token). No stop-word filtering:
/// every whitespace-delimited token is returned, in order, duplicates
/// preserved. Used wherever a token count over the whole field is needed
/// (document size) as well as a basis for [`tokenize`].
pub fn tokenize_raw(field: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = field.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek().is_some() => {
                current.push(chars.next().unwrap());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current).to_uppercase());
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current.to_uppercase());
    }
    tokens
}

/// [`tokenize_raw`], with stop words dropped (tested on the upper-cased
/// form). Used for query tokenization, where a stop word contributes
/// nothing either way.
pub fn tokenize(field: &str, stop_words: &ahash::AHashSet<String>) -> Vec<String> {
    tokenize_raw(field)
        .into_iter()
        .filter(|tok| !stop_words.contains(tok))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> ahash::AHashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn splits_on_whitespace_and_upper_cases() {
        let toks = tokenize_raw("the Quick brown Fox");
        assert_eq!(toks, vec!["THE", "QUICK", "BROWN", "FOX"]);
    }

    #[test]
    fn raw_tokenize_keeps_stop_words() {
        let toks = tokenize_raw("the quick THE fox");
        assert_eq!(toks, vec!["THE", "QUICK", "THE", "FOX"]);
    }

    #[test]
    fn drops_stop_words_after_upper_casing() {
        let toks = tokenize("the quick THE fox", &set(&["THE"]));
        assert_eq!(toks, vec!["QUICK", "FOX"]);
    }

    #[test]
    fn escaped_whitespace_does_not_split() {
        let toks = tokenize_raw(r"new\ york city");
        assert_eq!(toks, vec!["NEW YORK", "CITY"]);
    }

    #[test]
    fn repeats_are_preserved_for_tf_accounting() {
        let toks = tokenize("a a a", &set(&[]));
        assert_eq!(toks, vec!["A", "A", "A"]);
    }

    #[test]
    fn empty_field_yields_no_tokens() {
        assert!(tokenize_raw("   ").is_empty());
    }
}
