//! Prompt templates for grounded question answering

/// Template with `{{name}}` placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template; placeholders without a value are left untouched
    ///
    /// Substituted values are never rescanned, so a value containing
    /// `{{name}}` is emitted verbatim.
    #[must_use]
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find("{{") {
            let after_open = &rest[open + 2..];
            let Some(close) = after_open.find("}}") else {
                break;
            };
            result.push_str(&rest[..open]);

            let placeholder = &rest[open..open + 2 + close + 2];
            let name = after_open[..close].trim();
            match values.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => result.push_str(value),
                None => result.push_str(placeholder),
            }
            rest = &after_open[close + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Get required variables, in order of first appearance
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        let name = after_open[..close].trim();
        if !name.is_empty() && !variables.iter().any(|v| v == name) {
            variables.push(name.to_string());
        }
        rest = &after_open[close + 2..];
    }

    variables
}

/// Standard prompt templates
pub struct QaPrompts;

impl QaPrompts {
    /// Context-grounded QA prompt; ends with the `Answer:` marker the
    /// postprocessor strips when the backend echoes the prompt
    #[must_use]
    pub fn context_qa() -> PromptTemplate {
        PromptTemplate::new(
            r"Answer the question using only the information in the context.

Context: {{context}}

Question: {{question}}

Answer:",
        )
    }
}

/// Build the generation prompt for a question and its retrieved context
pub fn build_prompt(question: &str, context: &str) -> String {
    QaPrompts::context_qa().render(&[("context", context), ("question", question)])
}
