//! The generation collaborator seam.

use crate::error::GenerationError;
use serde::Serialize;
use serde_json::Value;
use somatic_gates::SectionId;

/// Everything a generator needs to rewrite one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest {
    pub section: SectionId,
    /// Heading line (`## ...`); `None` for the preview block.
    pub heading: Option<String>,
    /// The block being replaced, if the section exists.
    pub current_block: Option<String>,
    /// `"<CODE>: <message>"` lines that implicated this section.
    pub reasons: Vec<String>,
    pub locked: bool,
    pub document: String,
    pub prompt: String,
}

/// Produces a JSON object for a [`GenerationRequest`].
///
/// Section requests expect `{"section_markdown": "..."}`; preview requests
/// expect `{"preview_line": "..."}` with optional `pass_condition` and
/// `unlock_rule`. Extra keys are ignored.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError>;
}

impl<F> Generator for F
where
    F: Fn(&GenerationRequest) -> Result<Value, GenerationError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError> {
        self(request)
    }
}

/// Parsed preview response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPatch {
    pub preview_line: String,
    pub pass_condition: Option<String>,
    pub unlock_rule: Option<String>,
}

/// Pull `section_markdown` out of a response.
pub fn section_markdown(value: &Value) -> Result<String, GenerationError> {
    let text = required_str(value, "section_markdown")?;
    if text.trim().is_empty() {
        return Err(GenerationError::Malformed(
            "section_markdown is empty".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Pull the preview fields out of a response. The preview and the unlock
/// rule must each be a single line.
pub fn preview_patch(value: &Value) -> Result<PreviewPatch, GenerationError> {
    let preview_line = single_line(required_str(value, "preview_line")?, "preview_line")?;
    let pass_condition = optional_str(value, "pass_condition")?
        .map(|v| single_line(v, "pass_condition"))
        .transpose()?;
    let unlock_rule = optional_str(value, "unlock_rule")?
        .map(|v| single_line(v, "unlock_rule"))
        .transpose()?;
    Ok(PreviewPatch {
        preview_line,
        pass_condition,
        unlock_rule,
    })
}

fn required_str<'v>(value: &'v Value, key: &str) -> Result<&'v str, GenerationError> {
    let object = value
        .as_object()
        .ok_or_else(|| GenerationError::Malformed("response is not a JSON object".to_string()))?;
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::Malformed(format!("missing string field `{key}`")))
}

fn optional_str<'v>(value: &'v Value, key: &str) -> Result<Option<&'v str>, GenerationError> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(GenerationError::Malformed(format!(
            "field `{key}` is not a string"
        ))),
    }
}

fn single_line(text: &str, key: &str) -> Result<String, GenerationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::Malformed(format!("`{key}` is empty")));
    }
    if text.contains('\n') {
        return Err(GenerationError::Malformed(format!(
            "`{key}` must be a single line"
        )));
    }
    Ok(text.to_string())
}
