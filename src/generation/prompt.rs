use std::fmt;

use crate::constants::PROMPT_INSTRUCTION;

/// A rendered generation prompt, keeping its inputs for the stub generator and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    context: String,
    question: String,
    text: String,
}

impl Prompt {
    /// Renders the prompt. `question` is the caller's original text, not the normalized form.
    pub fn new(context: impl Into<String>, question: impl Into<String>) -> Self {
        let context = context.into();
        let question = question.into();
        let text = format!(
            "{}\n\nContext: {}\n\nQuestion: {}\nAnswer:",
            PROMPT_INSTRUCTION, context, question
        );
        Self {
            context,
            question,
            text,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
