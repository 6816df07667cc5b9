//! Instruction template wrapped around caller prompts

/// Placeholder replaced by the caller's prompt
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Default instruction template (multiple-choice answering)
pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = "Important: You are given a Questions along with 4 Options. You have to answer the question with the correct option name. Do not add any other text. Question: {prompt}";

/// Fixed wrapper text around the raw prompt.
///
/// The prompt is inserted verbatim; it travels as a JSON string field so no
/// escaping is applied here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template. If it lacks `{prompt}`, the prompt is appended after a space.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Raw template text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render the template around `prompt`
    #[must_use]
    pub fn render(&self, prompt: &str) -> String {
        if self.template.contains(PROMPT_PLACEHOLDER) {
            self.template.replacen(PROMPT_PLACEHOLDER, prompt, 1)
        } else if self.template.is_empty() {
            prompt.to_string()
        } else {
            format!("{} {}", self.template, prompt)
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTION_TEMPLATE)
    }
}
