//! Line tokenizer for the checklist grammar.
//!
//! The grammar is deliberately small. Every line classifies into exactly one
//! [`Token`]; block-level structure (tables, Q/A pairs, step lists) is then
//! read off the token stream by the gates instead of by ad hoc regexes.
//!
//! ```text
//! # Title                          → Title
//! ## Heading                       → Heading
//! ### Sub                          → SubHeading
//! ---                              → Rule
//! | a | b |                        → TableRow
//! | :--- | --- |                   → TableSeparator
//! **Q1. question?**                → Question
//! A1. answer                       → Answer
//! **Key:** value / **Key**: value  → Declaration
//! 1. step / 1) step                → NumberedItem
//! ```

use regex::Regex;
use std::sync::LazyLock;

static QUESTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\*\*Q(?P<n>\d+)[.)]\s*(?P<text>.*?)\*\*\s*$").expect("question pattern")
});

static ANSWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*A(?P<n>\d+)[.)]\s+(?P<text>\S.*?)\s*$").expect("answer pattern")
});

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\*\*(?P<key>[^*:]+?)(?::\*\*|\*\*:)\s*(?P<value>.*?)\s*$")
        .expect("declaration pattern")
});

static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<n>\d+)[.)]\s+(?P<text>\S.*?)\s*$").expect("numbered item pattern")
});

static SEPARATOR_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("table separator pattern"));

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `# Title`
    Title(&'a str),
    /// `## Heading` (text after the marker)
    Heading(&'a str),
    /// `###` and deeper; treated as body text by the gates.
    SubHeading(&'a str),
    /// `---` thematic break.
    Rule,
    Blank,
    TableSeparator,
    TableRow(Vec<&'a str>),
    Question { number: u32, text: &'a str },
    Answer { number: u32, text: &'a str },
    Declaration { key: &'a str, value: &'a str },
    NumberedItem { number: u32, text: &'a str },
    Text(&'a str),
}

/// A token together with its zero-based line index in the tokenized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    pub index: usize,
    pub raw: &'a str,
    pub token: Token<'a>,
}

/// Tokenize every line of `text`. Line terminators are not part of `raw`.
pub fn tokenize(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .map(|(index, raw)| Line {
            index,
            raw,
            token: classify(raw),
        })
        .collect()
}

/// Classify a single line (without its terminator).
pub fn classify(raw: &str) -> Token<'_> {
    let line = raw.trim_end_matches(['\n', '\r']);
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Token::Blank;
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return Token::Title(rest.trim());
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return Token::Heading(rest.trim());
    }
    if line.starts_with("###") {
        return Token::SubHeading(line.trim_start_matches('#').trim());
    }
    if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
        return Token::Rule;
    }
    if trimmed.starts_with('|') {
        let cells = table_cells(trimmed);
        if !cells.is_empty() && cells.iter().all(|cell| SEPARATOR_CELL_RE.is_match(cell)) {
            return Token::TableSeparator;
        }
        return Token::TableRow(cells);
    }
    if let Some(caps) = QUESTION_RE.captures(line)
        && let Some(number) = parse_number(caps.name("n").map(|m| m.as_str()))
    {
        let text = caps.name("text").map(|m| m.as_str()).unwrap_or_default();
        return Token::Question { number, text };
    }
    if let Some(caps) = ANSWER_RE.captures(line)
        && let Some(number) = parse_number(caps.name("n").map(|m| m.as_str()))
    {
        let text = caps.name("text").map(|m| m.as_str()).unwrap_or_default();
        return Token::Answer { number, text };
    }
    if let Some(caps) = DECLARATION_RE.captures(line) {
        let key = caps.name("key").map(|m| m.as_str().trim()).unwrap_or_default();
        let value = caps.name("value").map(|m| m.as_str()).unwrap_or_default();
        return Token::Declaration { key, value };
    }
    if let Some(caps) = NUMBERED_RE.captures(line)
        && let Some(number) = parse_number(caps.name("n").map(|m| m.as_str()))
    {
        let text = caps.name("text").map(|m| m.as_str()).unwrap_or_default();
        return Token::NumberedItem { number, text };
    }
    Token::Text(trimmed)
}

fn parse_number(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.parse().ok())
}

/// Split a pipe-table row into trimmed cells, dropping the outer pipes.
pub fn table_cells(row: &str) -> Vec<&str> {
    let inner = row.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

/// Strip markdown bold markers around a table cell or key.
pub fn strip_bold(cell: &str) -> &str {
    let cell = cell.trim();
    cell.strip_prefix("**")
        .and_then(|rest| rest.strip_suffix("**"))
        .map(str::trim)
        .unwrap_or(cell)
}
