use crate::gate::{Gate, GateResult};
use crate::ids::GateId;
use crate::reason::ReasonCode;
use crate::rules::RuleSet;
use somatic_doc::Document;

const SENTENCE_MARKS: [char; 4] = ['.', '!', '?', '。'];

/// The one-line preview: glyph prefix, no explanatory words, a measurable
/// state, and a single sentence.
pub struct PreviewGate;

impl Gate for PreviewGate {
    fn id(&self) -> GateId {
        GateId::Preview
    }

    fn check(&self, doc: &Document, rules: &RuleSet) -> GateResult {
        let mut result = GateResult::new(self.id());
        let Some(preview) = doc.preview_line() else {
            result.fail(ReasonCode::PreviewMissing, "Preview line missing.");
            return result;
        };
        let words = &rules.preview;

        if !preview.starts_with(&words.locked_glyph) && !preview.starts_with(&words.unlocked_glyph) {
            result.fail(
                ReasonCode::PreviewBadPrefix,
                format!(
                    "Preview must start with {} or {}.",
                    words.locked_glyph, words.unlocked_glyph
                ),
            );
        }

        let forbidden: Vec<&str> = words
            .forbidden_words
            .iter()
            .map(String::as_str)
            .filter(|w| preview.contains(*w))
            .collect();
        if !forbidden.is_empty() {
            result.fail(
                ReasonCode::PreviewForbiddenWord,
                format!(
                    "Preview contains forbidden explanatory words: {}.",
                    forbidden.join(", ")
                ),
            );
        }

        let measurable = preview.chars().any(|c| c.is_ascii_digit())
            || words.measurable_words.iter().any(|w| preview.contains(w.as_str()));
        if !measurable {
            result.fail(
                ReasonCode::PreviewNotMeasurable,
                format!(
                    "Preview lacks measurable state (digit/{}).",
                    words.measurable_words.join("/")
                ),
            );
        }

        let marks = sentence_marks(&preview);
        result.metric("preview_sentence_marks", marks);
        if marks >= words.max_sentence_marks {
            result.fail(
                ReasonCode::PreviewMultiSentence,
                format!("Preview must be a single sentence, found {marks} sentence marks."),
            );
        }
        result
    }
}

/// Count sentence-ending marks. A `.` between two digits is a decimal point.
pub fn sentence_marks(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, c)| {
            if !SENTENCE_MARKS.contains(c) {
                return false;
            }
            let decimal = *c == '.'
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            !decimal
        })
        .count()
}
