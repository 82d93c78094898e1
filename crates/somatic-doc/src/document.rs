//! Preamble + ordered heading blocks.
//!
//! A [`Document`] keeps the raw text of every block, line terminators
//! included, so `Document::parse(text).render() == text` for any input.
//! Edits return a new document and leave every untouched block
//! byte-identical.

use crate::error::DocumentError;
use crate::token::{Token, classify};

const HEADING_MARKER: &str = "## ";

/// One level-2 heading block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    heading: String,
    block: String,
}

impl Section {
    /// Heading key, including the `## ` marker (e.g. `## FAQ`).
    pub fn heading(&self) -> &str {
        &self.heading
    }

    /// Heading text without the marker.
    pub fn title(&self) -> &str {
        self.heading
            .strip_prefix(HEADING_MARKER)
            .unwrap_or(&self.heading)
    }

    /// Full block text: heading line plus body, up to the next heading.
    pub fn block(&self) -> &str {
        &self.block
    }

    /// Body text after the heading line.
    pub fn body(&self) -> &str {
        match self.block.find('\n') {
            Some(pos) => &self.block[pos + 1..],
            None => "",
        }
    }
}

/// A checklist document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    preamble: String,
    sections: Vec<Section>,
    locked_hint: Option<bool>,
}

/// Normalize a heading line or bare title into the `## Title` key form.
pub fn heading_key(heading_or_title: &str) -> String {
    let text = heading_or_title.trim();
    let title = text.strip_prefix("##").map(str::trim).unwrap_or(text);
    format!("{HEADING_MARKER}{title}")
}

fn heading_of(line: &str) -> Option<String> {
    let content = line.trim_end_matches(['\n', '\r']);
    content
        .starts_with(HEADING_MARKER)
        .then(|| heading_key(content))
}

impl Document {
    /// Split raw text into preamble and heading blocks.
    pub fn parse(text: &str) -> Self {
        let mut preamble = String::new();
        let mut sections: Vec<Section> = Vec::new();
        let mut pending: Option<Section> = None;

        for line in text.split_inclusive('\n') {
            if let Some(heading) = heading_of(line) {
                if let Some(done) = pending.take() {
                    place_block(&mut sections, done);
                }
                pending = Some(Section {
                    heading,
                    block: line.to_string(),
                });
                continue;
            }
            match pending.as_mut() {
                Some(section) => section.block.push_str(line),
                None => preamble.push_str(line),
            }
        }
        if let Some(done) = pending.take() {
            place_block(&mut sections, done);
        }

        Self {
            preamble,
            sections,
            locked_hint: None,
        }
    }

    /// Reassemble the document text.
    pub fn render(&self) -> String {
        let mut out = self.preamble.clone();
        for section in &self.sections {
            out.push_str(&section.block);
        }
        out
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Heading keys in document order.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(Section::heading)
    }

    /// Look up a section by heading line or bare title.
    pub fn section(&self, heading_or_title: &str) -> Option<&Section> {
        let key = heading_key(heading_or_title);
        self.sections.iter().find(|s| s.heading == key)
    }

    pub fn has_section(&self, heading_or_title: &str) -> bool {
        self.section(heading_or_title).is_some()
    }

    /// Title text of the first `# ` line in the preamble.
    pub fn title(&self) -> Option<&str> {
        self.preamble
            .lines()
            .find_map(|line| match classify(line) {
                Token::Title(title) => Some(title),
                _ => None,
            })
    }

    /// Locked flag supplied alongside the text, if any.
    pub fn locked_hint(&self) -> Option<bool> {
        self.locked_hint
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked_hint = Some(locked);
        self
    }

    /// Replace one block. Every other block stays byte-identical.
    ///
    /// The heading line is kept: a replacement that omits it gets it
    /// prepended. The old block's trailing blank-line spacing is carried
    /// over so the separation to the next heading does not drift.
    pub fn replace_section(
        &self,
        heading: &str,
        new_block: &str,
    ) -> Result<Document, DocumentError> {
        let key = heading_key(heading);
        let idx = self
            .sections
            .iter()
            .position(|s| s.heading == key)
            .ok_or_else(|| DocumentError::SectionNotFound(key.clone()))?;

        let body = normalize_block(&key, new_block)?;
        let spacing = trailing_spacing(&self.sections[idx].block);

        let mut doc = self.clone();
        doc.sections[idx].block = format!("{body}{spacing}");
        Ok(doc)
    }

    /// Append an absent section at the end of the document.
    ///
    /// Sections are never inserted mid-document. The previous block keeps
    /// its bytes, except that a missing final line terminator is added.
    pub fn append_section(&self, heading: &str, block: &str) -> Result<Document, DocumentError> {
        let key = heading_key(heading);
        if self.has_section(&key) {
            return Err(DocumentError::DuplicateSection(key));
        }
        let body = normalize_block(&key, block)?;

        let mut doc = self.clone();
        let tail = match doc.sections.last_mut() {
            Some(last) => &mut last.block,
            None => &mut doc.preamble,
        };
        if !tail.is_empty() && !tail.ends_with('\n') {
            tail.push('\n');
        }
        doc.sections.push(Section {
            heading: key,
            block: format!("{body}\n"),
        });
        Ok(doc)
    }

    /// The one-line preview statement between the title and the
    /// declarations. Trailing HTML comments are stripped.
    pub fn preview_line(&self) -> Option<String> {
        let lines: Vec<&str> = self.preamble.split_inclusive('\n').collect();
        let idx = preview_index(&lines)?;
        let text = strip_comment(lines[idx].trim_end_matches(['\n', '\r'])).trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Swap only the preview line. Without a title the document is returned
    /// unchanged; without a preview line one is inserted after the title.
    pub fn replace_preview_line(&self, new_line: &str) -> Document {
        let new_line = new_line.trim();
        let mut lines: Vec<String> = self
            .preamble
            .split_inclusive('\n')
            .map(str::to_string)
            .collect();
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
        let Some(title_idx) = title_index(&borrowed) else {
            return self.clone();
        };

        match preview_index(&borrowed) {
            Some(idx) => {
                let ending = line_ending(&lines[idx]).to_string();
                lines[idx] = format!("{new_line}{ending}");
            }
            None => {
                ensure_terminated(&mut lines[title_idx]);
                let next_blank = lines
                    .get(title_idx + 1)
                    .is_some_and(|line| line.trim().is_empty());
                if next_blank {
                    lines.insert(title_idx + 2, format!("{new_line}\n\n"));
                } else {
                    lines.insert(title_idx + 1, format!("\n{new_line}\n\n"));
                }
            }
        }

        let mut doc = self.clone();
        doc.preamble = lines.concat();
        doc
    }

    /// Top-of-document declarations (`**Key:** value`) in order.
    pub fn declarations(&self) -> Vec<(&str, &str)> {
        self.preamble
            .lines()
            .filter_map(|line| match classify(line) {
                Token::Declaration { key, value } => Some((key, value)),
                _ => None,
            })
            .collect()
    }

    /// Value of the first declaration named `key`.
    pub fn declaration(&self, key: &str) -> Option<&str> {
        self.declarations()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    pub fn declaration_count(&self, key: &str) -> usize {
        self.declarations()
            .into_iter()
            .filter(|(k, _)| *k == key)
            .count()
    }

    /// Whether the declaration named `key` spills onto a following text line.
    pub fn declaration_continues(&self, key: &str) -> bool {
        let lines: Vec<&str> = self.preamble.lines().collect();
        lines.iter().enumerate().any(|(i, line)| {
            matches!(classify(line), Token::Declaration { key: k, .. } if k == key)
                && lines
                    .get(i + 1)
                    .is_some_and(|next| matches!(classify(next), Token::Text(_)))
        })
    }

    /// Set a declaration, replacing an existing line or inserting a new one
    /// after the last declaration, the preview line, or the title.
    ///
    /// Every existing line for `key` collapses into the first one, and text
    /// lines spilling on from any of them are dropped.
    pub fn set_declaration(&self, key: &str, value: &str) -> Document {
        let rendered = format!("**{key}:** {}", value.trim());
        let mut lines = collapse_declaration(&self.preamble, key);
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();

        let existing = borrowed.iter().position(
            |line| matches!(classify(line), Token::Declaration { key: k, .. } if k == key),
        );
        let last_declaration = borrowed
            .iter()
            .rposition(|line| matches!(classify(line), Token::Declaration { .. }));
        let preview = preview_index(&borrowed);
        let title = title_index(&borrowed);

        if let Some(idx) = existing {
            let ending = line_ending(&lines[idx]).to_string();
            lines[idx] = format!("{rendered}{ending}");
        } else if let Some(idx) = last_declaration {
            ensure_terminated(&mut lines[idx]);
            lines.insert(idx + 1, format!("{rendered}\n"));
        } else if let Some(idx) = preview.or(title) {
            ensure_terminated(&mut lines[idx]);
            lines.insert(idx + 1, format!("\n{rendered}\n"));
        } else {
            if let Some(last) = lines.last_mut() {
                ensure_terminated(last);
            }
            lines.push(format!("{rendered}\n"));
        }

        let mut doc = self.clone();
        doc.preamble = lines.concat();
        doc
    }
}

/// Split `preamble` into lines, keeping the first declaration for `key` and
/// removing later duplicates plus the text lines that continue any of them.
fn collapse_declaration(preamble: &str, key: &str) -> Vec<String> {
    let mut seen = false;
    let mut spilling = false;
    let mut kept = Vec::new();
    for line in preamble.split_inclusive('\n') {
        match classify(line) {
            Token::Declaration { key: k, .. } if k == key => {
                spilling = true;
                if seen {
                    continue;
                }
                seen = true;
            }
            Token::Text(_) if spilling => continue,
            _ => spilling = false,
        }
        kept.push(line.to_string());
    }
    kept
}

fn place_block(sections: &mut Vec<Section>, block: Section) {
    match sections.iter_mut().find(|s| s.heading == block.heading) {
        Some(existing) => {
            tracing::warn!(heading = %block.heading, "duplicate heading; last occurrence wins");
            existing.block = block.block;
        }
        None => sections.push(block),
    }
}

/// Check a replacement block and put its heading line first.
fn normalize_block(key: &str, block: &str) -> Result<String, DocumentError> {
    let text = block.trim_start_matches(['\n', '\r']).trim_end();
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default();

    let mut out = String::new();
    let rest_start = match heading_of(first) {
        Some(heading) if heading == key => {
            out.push_str(key);
            out.push('\n');
            first.len()
        }
        Some(heading) => {
            return Err(DocumentError::ForeignHeading {
                section: key.to_string(),
                heading,
            });
        }
        None => {
            out.push_str(key);
            out.push('\n');
            0
        }
    };

    let rest = &text[rest_start..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    if let Some(heading) = rest.lines().find_map(heading_of) {
        return Err(DocumentError::ForeignHeading {
            section: key.to_string(),
            heading,
        });
    }
    out.push_str(rest);
    Ok(out.trim_end().to_string())
}

/// Line terminator plus any blank lines after a block's last content line.
fn trailing_spacing(block: &str) -> &str {
    let content_end = block.trim_end().len();
    match block[content_end..].find('\n') {
        Some(offset) => &block[content_end + offset..],
        None => "",
    }
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn ensure_terminated(line: &mut String) {
    if !line.ends_with('\n') {
        line.push('\n');
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("<!--") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn title_index(lines: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| matches!(classify(line), Token::Title(_)))
}

fn preview_index(lines: &[&str]) -> Option<usize> {
    let title = title_index(lines)?;
    for (idx, line) in lines.iter().enumerate().skip(title + 1) {
        let content = line.trim_end_matches(['\n', '\r']);
        if content.trim().is_empty() || strip_comment(content).trim().is_empty() {
            continue;
        }
        return match classify(content) {
            Token::Declaration { .. }
            | Token::Rule
            | Token::Heading(_)
            | Token::SubHeading(_)
            | Token::Title(_) => None,
            _ => Some(idx),
        };
    }
    None
}
