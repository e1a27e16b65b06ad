//! English contraction expansion.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CONTRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z]+(?:['’][a-z]+)+\b").expect("contraction pattern is valid")
});

static SLANG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:gonna|wanna|gotta)\b").expect("slang pattern is valid")
});

/// Expands contractions such as `don't` or `they'll've`.
///
/// Expansions are emitted in lowercase; words that only look like contractions
/// (possessives, `o'neill`) are left untouched.
pub fn expand_contractions(text: &str) -> String {
    let expanded = CONTRACTION_RE.replace_all(text, |caps: &Captures<'_>| {
        let word = &caps[0];
        expand_word(word).unwrap_or_else(|| word.to_string())
    });

    SLANG_RE
        .replace_all(&expanded, |caps: &Captures<'_>| {
            match caps[0].to_lowercase().as_str() {
                "gonna" => "going to",
                "wanna" => "want to",
                _ => "got to",
            }
        })
        .into_owned()
}

fn expand_word(word: &str) -> Option<String> {
    let normalized = word.to_lowercase().replace('’', "'");

    if let Some(expansion) = lookup(&normalized) {
        return Some(expansion.to_string());
    }

    let mut stem: &str = &normalized;
    let mut tail = Vec::new();

    while let Some((rest, expansion)) = split_suffix(stem) {
        tail.push(expansion);
        stem = rest;
        if let Some(full) = lookup(stem) {
            stem = full;
            break;
        }
    }

    if tail.is_empty() || stem.contains('\'') {
        return None;
    }

    tail.reverse();
    let mut out = String::from(stem);
    for part in tail {
        out.push(' ');
        out.push_str(part);
    }
    Some(out)
}

fn split_suffix(word: &str) -> Option<(&str, &'static str)> {
    const RULES: &[(&str, &str)] = &[
        ("n't", "not"),
        ("'re", "are"),
        ("'ve", "have"),
        ("'ll", "will"),
        ("'d", "would"),
        ("'m", "am"),
    ];

    RULES.iter().find_map(|(suffix, expansion)| {
        word.strip_suffix(suffix)
            .filter(|rest| !rest.is_empty())
            .map(|rest| (rest, *expansion))
    })
}

fn lookup(word: &str) -> Option<&'static str> {
    let expansion = match word {
        "ain't" => "are not",
        "can't" => "cannot",
        "won't" => "will not",
        "shan't" => "shall not",
        "let's" => "let us",
        "it's" => "it is",
        "he's" => "he is",
        "she's" => "she is",
        "that's" => "that is",
        "there's" => "there is",
        "here's" => "here is",
        "what's" => "what is",
        "where's" => "where is",
        "who's" => "who is",
        "how's" => "how is",
        "when's" => "when is",
        "why's" => "why is",
        "y'all" => "you all",
        "ma'am" => "madam",
        "o'clock" => "of the clock",
        _ => return None,
    };
    Some(expansion)
}
