//! Tokenizer shared by document text and taxonomy aliases.
//!
//! Text is split into clauses (lists items, lines, sentences) and each clause
//! into lowercase word tokens. Phrase windows are built inside a clause only,
//! so "Machine, Learning" never reads as "machine learning".

/// Characters that end a clause in addition to sentence-final periods.
const CLAUSE_BREAKS: &[char] = &[
    '\n', '\r', ',', ';', ':', '|', '•', '·', '(', ')', '[', ']', '{', '}', '!', '?', '"',
];

/// `+`, `#` and `.` belong to tokens like `c++`, `c#`, `node.js` and `.net`.
fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '.')
}

/// Splits text into clauses of normalized tokens. Empty clauses are dropped.
pub fn clauses(text: &str) -> Vec<Vec<String>> {
    let mut clauses = Vec::new();
    let mut current = Vec::new();
    let mut raw = String::new();

    for c in text.chars() {
        if is_token_char(c) {
            raw.push(c);
            continue;
        }
        flush_token(&mut raw, &mut current, &mut clauses);
        if CLAUSE_BREAKS.contains(&c) {
            end_clause(&mut current, &mut clauses);
        }
    }
    flush_token(&mut raw, &mut current, &mut clauses);
    end_clause(&mut current, &mut clauses);

    clauses
}

/// Normalizes a skill phrase to its lookup key: tokens joined by one space.
///
/// Returns `None` when the phrase holds no tokens or spans more than one
/// clause (such a phrase could never match document text).
pub fn normalize_phrase(phrase: &str) -> Option<String> {
    let mut found = clauses(phrase);
    if found.len() != 1 {
        return None;
    }
    found.pop().map(|tokens| tokens.join(" "))
}

fn flush_token(raw: &mut String, current: &mut Vec<String>, clauses: &mut Vec<Vec<String>>) {
    if raw.is_empty() {
        return;
    }
    let ends_sentence = raw.ends_with('.');
    if let Some(token) = clean_token(raw) {
        current.push(token);
    }
    raw.clear();
    if ends_sentence {
        end_clause(current, clauses);
    }
}

fn end_clause(current: &mut Vec<String>, clauses: &mut Vec<Vec<String>>) {
    if !current.is_empty() {
        clauses.push(std::mem::take(current));
    }
}

fn clean_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches('.');
    let body = trimmed.trim_start_matches('.');
    if !body.chars().any(char::is_alphanumeric) {
        return None;
    }
    // A leading dot survives only in front of a word: `.net`, not `...net`.
    let keep_dot = trimmed.starts_with('.') && body.starts_with(char::is_alphanumeric);
    let token = if keep_dot {
        format!(".{body}")
    } else {
        body.to_string()
    };
    Some(token.to_lowercase())
}
