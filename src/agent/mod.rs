pub mod client;
pub mod invoker;
pub mod runner;
pub mod tools;

use crate::agent::client::{ChatModel, ToolDefinition};
use crate::agent::tools::{Tool, Toolbox};
use std::sync::Arc;

/// Replies that start with this literal are failures, whatever produced them.
pub const ERROR_PREFIX: &str = "Error";

pub const MISSING_TOOL_OUTPUT: &str = "No tool output";

const SUMMARIZER_INSTRUCTIONS: &str = "You are an expert PDF summarization assistant. \
When a user requests a summary, use `summarize_document`. \
If the user provides a PDF path, extract text first using `extract_text_from_pdf`.";

const QUIZ_INSTRUCTIONS: &str = "You generate quizzes based on provided text. \
Use `generate_quiz`. Extract text from PDFs first.";

#[derive(Clone)]
pub struct AgentProfile {
    pub name: String,
    pub instructions: String,
    pub model: Arc<ChatModel>,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl AgentProfile {
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }
}

impl std::fmt::Debug for AgentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentProfile")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field(
                "tools",
                &self.tools.iter().map(|tool| tool.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Summarizer,
    QuizGenerator,
}

#[derive(Debug, Clone)]
pub struct AgentProfiles {
    summarizer: AgentProfile,
    quiz_generator: AgentProfile,
}

impl AgentProfiles {
    pub fn new(model: Arc<ChatModel>, toolbox: &Toolbox) -> Self {
        let summarizer = AgentProfile {
            name: "PDF Summarizer".to_string(),
            instructions: SUMMARIZER_INSTRUCTIONS.to_string(),
            model: Arc::clone(&model),
            tools: vec![
                Arc::clone(&toolbox.read_user_profile),
                Arc::clone(&toolbox.update_user_profile),
                Arc::clone(&toolbox.extract_text_from_pdf),
                Arc::clone(&toolbox.summarize_document),
            ],
        };

        let quiz_generator = AgentProfile {
            name: "PDF Quiz Generator".to_string(),
            instructions: QUIZ_INSTRUCTIONS.to_string(),
            model,
            tools: vec![
                Arc::clone(&toolbox.read_user_profile),
                Arc::clone(&toolbox.update_user_profile),
                Arc::clone(&toolbox.extract_text_from_pdf),
                Arc::clone(&toolbox.generate_quiz),
            ],
        };

        Self {
            summarizer,
            quiz_generator,
        }
    }

    pub fn get(&self, kind: ProfileKind) -> &AgentProfile {
        match kind {
            ProfileKind::Summarizer => &self.summarizer,
            ProfileKind::QuizGenerator => &self.quiz_generator,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallOutput {
    pub call_id: String,
    pub tool_name: String,
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunItem {
    MessageOutput(String),
    ToolCall {
        call_id: String,
        tool_name: String,
        arguments: String,
    },
    ToolCallOutput(ToolCallOutput),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub final_output: String,
    pub new_items: Vec<RunItem>,
}

impl RunResult {
    pub fn tool_outputs(&self) -> impl Iterator<Item = &ToolCallOutput> {
        self.new_items.iter().filter_map(|item| match item {
            RunItem::ToolCallOutput(record) => Some(record),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    pub tool_debug: Option<String>,
}

pub fn collapse(result: &RunResult) -> Invocation {
    let outputs: Vec<&str> = result
        .tool_outputs()
        .map(|record| record.output.as_deref().unwrap_or(MISSING_TOOL_OUTPUT))
        .collect();

    if outputs.is_empty() {
        return Invocation {
            text: result.final_output.clone(),
            tool_debug: None,
        };
    }

    let combined = outputs.join("\n");
    Invocation {
        text: combined.clone(),
        tool_debug: Some(combined),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Success(String),
    Failure(String),
}

impl AgentReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.starts_with(ERROR_PREFIX) {
            Self::Failure(text)
        } else {
            Self::Success(text)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_output(output: Option<&str>) -> RunItem {
        RunItem::ToolCallOutput(ToolCallOutput {
            call_id: "id".to_string(),
            tool_name: "tool".to_string(),
            output: output.map(str::to_string),
        })
    }

    #[test]
    fn collapse_prefers_tool_outputs_over_final_output() {
        let result = RunResult {
            final_output: "the model's own words".to_string(),
            new_items: vec![
                tool_output(Some("first")),
                RunItem::MessageOutput("ignored".to_string()),
                tool_output(Some("second")),
            ],
        };

        let invocation = collapse(&result);
        assert_eq!(invocation.text, "first\nsecond");
        assert_eq!(invocation.tool_debug.as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn collapse_fills_placeholder_for_missing_output() {
        let result = RunResult {
            final_output: String::new(),
            new_items: vec![tool_output(None), tool_output(Some("kept"))],
        };

        assert_eq!(collapse(&result).text, "No tool output\nkept");
    }

    #[test]
    fn collapse_uses_final_output_without_tool_records() {
        let result = RunResult {
            final_output: "plain answer".to_string(),
            new_items: vec![RunItem::MessageOutput("plain answer".to_string())],
        };

        let invocation = collapse(&result);
        assert_eq!(invocation.text, "plain answer");
        assert!(invocation.tool_debug.is_none());
    }

    #[test]
    fn error_prefix_marks_failure() {
        assert_eq!(
            AgentReply::from_text("Error: could not read file"),
            AgentReply::Failure("Error: could not read file".to_string())
        );
        // The match is a plain prefix test, so this counts as a failure too.
        assert!(!AgentReply::from_text("Errors were found in the ledger").is_success());
        assert!(AgentReply::from_text("No errors here").is_success());
        assert!(AgentReply::from_text("error lowercase is fine").is_success());
    }
}
