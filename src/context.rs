//! Context assembly: truncate retrieved passages and join them for the prompt.

use crate::retrieval::RetrievedPassage;

/// Separator placed between truncated passages.
pub const PASSAGE_SEPARATOR: &str = " ";

/// Cuts `text` to at most `max_chars` characters (not bytes, not words).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Truncates each passage to `max_chars` and joins them in retrieval order.
pub fn assemble_context<S: AsRef<str>>(passages: &[S], max_chars: usize) -> String {
    passages
        .iter()
        .map(|p| truncate_chars(p.as_ref(), max_chars))
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR)
}

/// [`assemble_context`] over retriever output.
pub fn assemble_from_retrieved(passages: &[RetrievedPassage], max_chars: usize) -> String {
    let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
    assemble_context(&texts, max_chars)
}
