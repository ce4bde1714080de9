//! Dialect literal rewriting, applied before a statement is tokenized.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Quoted text first so its contents are skipped, then the "now" spellings.
/// Only modifiers that keep the same instant are absorbed.
static NOW_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)'(?:[^']|'')*'|"[^"]*"|\bCURRENT_TIMESTAMP\b|\bdatetime\s*\(\s*'now'(?:\s*,\s*'(?:localtime|utc)')*\s*\)"#,
    )
    .unwrap()
});

/// Quoted text first so its contents are skipped, then standalone 0/1.
static FLAG_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'(?:[^']|'')*'|"[^"]*"|\b[01]\b"#).unwrap());

const BOOLEAN_CONTEXT_KEYWORDS: [&str; 5] = ["AND", "OR", "ORDER", "LIMIT", "GROUP"];

/// Rewrites dialect literals so the classifier sees one spelling of each.
#[derive(Debug, Clone)]
pub struct Normalizer {
    now_literal: String,
}

impl Normalizer {
    pub fn new(now_literal: impl Into<String>) -> Self {
        Self {
            now_literal: now_literal.into(),
        }
    }

    /// Total and side-effect free; blank input comes back unchanged.
    pub fn normalize(&self, text: &str) -> String {
        let with_now = NOW_TOKEN.replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            if is_quoted(token) {
                token.to_string()
            } else {
                self.now_literal.clone()
            }
        });

        let source: &str = &with_now;
        FLAG_TOKEN
            .replace_all(source, |caps: &Captures| {
                let Some(token) = caps.get(0) else {
                    return String::new();
                };
                let text = token.as_str();
                if is_quoted(text)
                    || !in_value_position(source, token.start())
                    || !before_terminator(source, token.end())
                {
                    return text.to_string();
                }
                let flag = if text == "1" { "true" } else { "false" };
                flag.to_string()
            })
            .into_owned()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("'now()'")
    }
}

/// Normalizes with the default "now" literal.
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}

fn is_quoted(token: &str) -> bool {
    token.starts_with('\'') || token.starts_with('"')
}

fn in_value_position(text: &str, start: usize) -> bool {
    matches!(text[..start].trim_end().chars().last(), Some('=' | ',' | '('))
}

fn before_terminator(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start();
    match rest.chars().next() {
        None | Some(',' | ')' | ';') => true,
        Some(c) if c.is_ascii_alphabetic() => {
            let word: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            BOOLEAN_CONTEXT_KEYWORDS
                .iter()
                .any(|k| k.eq_ignore_ascii_case(&word))
        }
        _ => false,
    }
}
