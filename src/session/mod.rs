use crate::agent::{AgentReply, ERROR_PREFIX};
use std::collections::HashMap;

pub mod orchestrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Failed { reason: String },
}

impl Extraction {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Failed { .. } => "",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub uploaded_file_name: Option<String>,
    pub extractions: HashMap<String, Extraction>,
    pub summary: Option<AgentReply>,
    pub quiz: Option<AgentReply>,
    pub tool_debug: Option<String>,
}

impl SessionState {
    pub fn current_text(&self) -> Option<&str> {
        let name = self.uploaded_file_name.as_ref()?;
        let text = self.extractions.get(name)?.text();
        if text.is_empty() || text.starts_with(ERROR_PREFIX) {
            return None;
        }
        Some(text)
    }
}
