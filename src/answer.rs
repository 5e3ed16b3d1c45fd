use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Whitespace run preceded by sentence-ending punctuation.
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Splits `text` into sentences at whitespace that follows `.`, `!` or `?`.
///
/// The punctuation stays attached to the sentence it ends. No abbreviation or
/// decimal awareness: `"approx. 3"` splits after `approx.`.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK.find_iter(text) {
        // the punctuation mark is a single ASCII byte
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);
    sentences
}

/// Drops a trailing sentence that was cut off mid-generation.
///
/// A lone fragment without closing punctuation yields an empty string.
pub fn remove_incomplete_sentence(text: &str) -> String {
    let mut sentences = split_sentences(text);

    let incomplete = sentences
        .last()
        .map_or(false, |last| !last.ends_with(&SENTENCE_END[..]));
    if incomplete {
        sentences.pop();
    }

    sentences.join(" ")
}
