use crate::agent::{AgentReply, Invocation, ProfileKind};
use crate::session::{Extraction, Message, Role, SessionState};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Chat,
    Extract { file_name: String },
    Summary,
    Quiz,
}

impl Request {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Chat => "Agent thinking...",
            Self::Extract { .. } => "Extracting text from PDF...",
            Self::Summary => "Summarizing...",
            Self::Quiz => "Generating quiz...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRun {
    pub request: Request,
    pub profile: ProfileKind,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

pub fn extraction_prompt(temp_path: &Path) -> String {
    format!(
        "Extract text from PDF at this file path: {}",
        temp_path.display()
    )
}

pub fn summary_prompt(text: &str) -> String {
    format!("Summarize this document:\n\n{text}")
}

pub fn quiz_prompt(text: &str) -> String {
    format!("Generate a quiz from this document:\n\n{text}")
}

#[derive(Debug, Default)]
pub struct Orchestrator {
    state: SessionState,
    pending: Option<Request>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pending(&self) -> Option<&Request> {
        self.pending.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn submit_chat(&mut self, input: &str) -> Option<PlannedRun> {
        let input = input.trim();
        if input.is_empty() || self.is_busy() {
            return None;
        }

        self.state.messages.push(Message {
            role: Role::User,
            content: input.to_string(),
        });
        Some(self.plan(Request::Chat, ProfileKind::Summarizer, input.to_string()))
    }

    pub fn needs_extraction(&self, file_name: &str) -> bool {
        self.state.uploaded_file_name.as_deref() != Some(file_name)
            || !self.state.extractions.contains_key(file_name)
    }

    pub fn begin_extraction(&mut self, file_name: &str, temp_path: &Path) -> Option<PlannedRun> {
        if self.is_busy() || !self.needs_extraction(file_name) {
            return None;
        }

        Some(self.plan(
            Request::Extract {
                file_name: file_name.to_string(),
            },
            ProfileKind::Summarizer,
            extraction_prompt(temp_path),
        ))
    }

    pub fn begin_summary(&mut self) -> Option<PlannedRun> {
        if self.is_busy() {
            return None;
        }
        let prompt = summary_prompt(self.state.current_text()?);
        Some(self.plan(Request::Summary, ProfileKind::Summarizer, prompt))
    }

    pub fn begin_quiz(&mut self) -> Option<PlannedRun> {
        if self.is_busy() {
            return None;
        }
        let prompt = quiz_prompt(self.state.current_text()?);
        Some(self.plan(Request::Quiz, ProfileKind::QuizGenerator, prompt))
    }

    fn plan(&mut self, request: Request, profile: ProfileKind, prompt: String) -> PlannedRun {
        self.pending = Some(request.clone());
        PlannedRun {
            request,
            profile,
            prompt,
        }
    }

    // `Err` is a runtime failure: network, HTTP or turn limit.
    pub fn complete(
        &mut self,
        request: Request,
        outcome: Result<Invocation, String>,
    ) -> Option<Notice> {
        if self.pending.as_ref() != Some(&request) {
            tracing::warn!(?request, pending = ?self.pending, "completion does not match pending request");
        }
        self.pending = None;

        let text = match outcome {
            Ok(invocation) => {
                self.state.tool_debug = invocation.tool_debug;
                Ok(invocation.text)
            }
            Err(err) => {
                self.state.tool_debug = None;
                Err(err)
            }
        };

        match request {
            Request::Chat => self.complete_chat(text),
            Request::Extract { file_name } => self.complete_extraction(file_name, text),
            Request::Summary => {
                let reply = Self::reply_or_failure(text);
                let notice = reply
                    .is_success()
                    .then(|| Notice::Success("Summary generated!".to_string()));
                self.state.summary = Some(reply);
                notice
            }
            Request::Quiz => {
                let reply = Self::reply_or_failure(text);
                let notice = reply
                    .is_success()
                    .then(|| Notice::Success("Quiz generated!".to_string()));
                self.state.quiz = Some(reply);
                notice
            }
        }
    }

    fn complete_chat(&mut self, text: Result<String, String>) -> Option<Notice> {
        let (content, notice) = match text {
            Ok(content) => (content, None),
            Err(err) => {
                let content = format!("Error: {err}");
                (content.clone(), Some(Notice::Error(content)))
            }
        };

        self.state.messages.push(Message {
            role: Role::Assistant,
            content,
        });
        notice
    }

    fn complete_extraction(
        &mut self,
        file_name: String,
        text: Result<String, String>,
    ) -> Option<Notice> {
        // Runtime failures leave no cache entry so the next upload retries.
        let text = match text {
            Ok(text) => text,
            Err(err) => return Some(Notice::Error(format!("Error extracting text: {err}"))),
        };

        let (entry, notice) = match AgentReply::from_text(text) {
            AgentReply::Success(text) => (
                Extraction::Text(text),
                Notice::Success("Text extracted successfully!".to_string()),
            ),
            AgentReply::Failure(reason) => (
                Extraction::Failed {
                    reason: reason.clone(),
                },
                Notice::Error(reason),
            ),
        };

        tracing::info!(file = %file_name, ok = matches!(entry, Extraction::Text(_)), "extraction cached");
        self.state.extractions.insert(file_name.clone(), entry);
        self.state.uploaded_file_name = Some(file_name);
        self.state.summary = None;
        self.state.quiz = None;
        Some(notice)
    }

    fn reply_or_failure(text: Result<String, String>) -> AgentReply {
        match text {
            Ok(text) => AgentReply::from_text(text),
            Err(err) => AgentReply::Failure(format!("Error: {err}")),
        }
    }
}
