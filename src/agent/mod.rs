mod roles;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::model::ModelClient;

pub use roles::{dietary_expert, fitness_expert, follow_up_prompt, plan_assistant};

/// A role-bound wrapper that turns one input into one model invocation.
pub struct Agent {
    name: String,
    role: String,
    instructions: Vec<String>,
    markdown: bool,
    client: Arc<dyn ModelClient>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        instructions: Vec<String>,
        client: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            instructions,
            markdown: false,
            client,
        }
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    #[cfg(test)]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, input_text: &str) -> Result<String, ModelError> {
        let prompt = self.build_prompt(input_text);
        debug!(agent = %self.name, prompt_len = prompt.len(), "running agent");

        self.client.complete(&prompt).await.inspect_err(|err| {
            warn!(agent = %self.name, error = %err, "agent run failed");
        })
    }

    fn build_prompt(&self, input_text: &str) -> String {
        let mut prompt = String::new();

        if !self.name.trim().is_empty() || !self.role.trim().is_empty() {
            prompt.push_str(&format!("<角色>\n{}：{}\n</角色>\n\n", self.name, self.role));
        }

        let mut instructions = self.instructions.clone();
        if self.markdown {
            instructions.push("使用 Markdown 格式组织回答。".to_string());
        }
        if !instructions.is_empty() {
            prompt.push_str("<指令>\n");
            for line in &instructions {
                prompt.push_str("- ");
                prompt.push_str(line);
                prompt.push('\n');
            }
            prompt.push_str("</指令>\n\n");
        }

        prompt.push_str(input_text.trim());
        prompt
    }
}
