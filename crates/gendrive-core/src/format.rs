//! Prompt templates: a fixed prefix and suffix around the raw user prompt.

use thiserror::Error;

/// Question/answer wrapper the Phi family was tuned on.
pub const PHI_QA_TEMPLATE: &str = " Question:{prompt}\n\n Answer:";

pub const PLACEHOLDER: &str = "{prompt}";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("prompt template must contain `{{prompt}}` exactly once, found {0}")]
    Placeholder(usize),
}

/// A template split once at construction; rendering is plain concatenation,
/// so the user prompt is inserted verbatim even if it contains `{prompt}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    prefix: String,
    suffix: String,
}

impl PromptTemplate {
    pub fn custom(pattern: &str) -> Result<Self, TemplateError> {
        let n = pattern.matches(PLACEHOLDER).count();
        if n != 1 {
            return Err(TemplateError::Placeholder(n));
        }
        let (prefix, suffix) = pattern
            .split_once(PLACEHOLDER)
            .ok_or(TemplateError::Placeholder(0))?;
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn render(&self, prompt: &str) -> String {
        let mut s = String::with_capacity(self.prefix.len() + prompt.len() + self.suffix.len());
        s.push_str(&self.prefix);
        s.push_str(prompt);
        s.push_str(&self.suffix);
        s
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            prefix: " Question:".to_string(),
            suffix: "\n\n Answer:".to_string(),
        }
    }
}

/// Wrap `prompt` in the default Q/A template.
pub fn format_prompt(prompt: &str) -> String {
    PromptTemplate::default().render(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_reference_question() {
        assert_eq!(
            format_prompt("What is AI?"),
            " Question:What is AI?\n\n Answer:"
        );
    }

    #[test]
    fn default_matches_pattern_constant() {
        assert_eq!(
            PromptTemplate::custom(PHI_QA_TEMPLATE).unwrap(),
            PromptTemplate::default()
        );
    }

    #[test]
    fn prompt_is_inserted_verbatim() {
        for p in ["", "  padded  ", "multi\nline", "{prompt}", "ünïcödé ✓"] {
            assert_eq!(format_prompt(p), format!(" Question:{p}\n\n Answer:"));
        }
    }

    #[test]
    fn placeholder_count_must_be_one() {
        assert_eq!(
            PromptTemplate::custom("plain"),
            Err(TemplateError::Placeholder(0))
        );
        assert_eq!(
            PromptTemplate::custom("{prompt}{prompt}"),
            Err(TemplateError::Placeholder(2))
        );
    }
}
