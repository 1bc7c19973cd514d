//! Prompt builder for report generation
//!
//! Builds the system + user prompt sent to the LLM from a cached activity
//! document, optionally wrapping it in a template from the prompts directory.

use crate::api_key::ProviderKind;
use crate::ports::ai::ChatPrompt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the report template inside the prompts directory
pub const REPORT_TEMPLATE_FILE: &str = "daily_report_prompt.txt";

/// Placeholder replaced by the cached markdown
pub const CONTENT_PLACEHOLDER: &str = "{content}";

const SYSTEM_PROMPT: &str = "You are an AI assistant that analyzes GitHub repository activity and generates comprehensive reports. \
Please provide detailed, well-structured analysis with clear sections including Executive Summary, Key Highlights, \
Activity Analysis, Trends and Insights, and Recommendations. \
Format your response as professional markdown with appropriate headers and bullet points.";

/// Builder for report prompts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptBuilder {
    template: Option<String>,
}

impl PromptBuilder {
    /// A builder that sends the cached markdown as-is
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder using `template`, which should contain `{content}`
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
        }
    }

    /// Loads the report template for `provider` from `prompts_dir`
    ///
    /// `<prompts_dir>/<provider>/daily_report_prompt.txt` wins over
    /// `<prompts_dir>/daily_report_prompt.txt`. A missing or unreadable
    /// template leaves the markdown untemplated.
    pub fn load(prompts_dir: &Path, provider: ProviderKind) -> Self {
        let candidates: [PathBuf; 2] = [
            prompts_dir.join(provider.as_str()).join(REPORT_TEMPLATE_FILE),
            prompts_dir.join(REPORT_TEMPLATE_FILE),
        ];

        for path in candidates.iter().filter(|p| p.is_file()) {
            match fs::read_to_string(path) {
                Ok(template) => {
                    debug!(path = %path.display(), provider = %provider, "Loaded report prompt template");
                    return Self::with_template(template);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read prompt template");
                }
            }
        }

        Self::new()
    }

    /// Builds the prompt for a cached activity document
    pub fn build_report_prompt(&self, markdown: &str) -> ChatPrompt {
        let user = match &self.template {
            Some(template) if template.contains(CONTENT_PLACEHOLDER) => {
                template.replace(CONTENT_PLACEHOLDER, markdown)
            }
            Some(template) => format!("{}\n\n{}", template.trim_end(), markdown),
            None => markdown.to_string(),
        };
        ChatPrompt::new(SYSTEM_PROMPT, user)
    }

    /// The fixed system instructions
    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }
}
