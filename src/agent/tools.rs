use crate::agent::client::{ChatModel, ToolDefinition};
use crate::error::{ProfileError, ToolError};
use crate::profile::store::ProfileStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const EXTRACT_TEXT_FROM_PDF: &str = "extract_text_from_pdf";
pub const SUMMARIZE_DOCUMENT: &str = "summarize_document";
pub const GENERATE_QUIZ: &str = "generate_quiz";
pub const READ_USER_PROFILE: &str = "read_user_profile";
pub const UPDATE_USER_PROFILE: &str = "update_user_profile";

const SUMMARY_INSTRUCTIONS: &str = "Summarize the following document for a student. \
Open with a one-sentence overview, then list the key points as short bullets. \
Do not invent facts that are not in the text.";

const QUIZ_INSTRUCTIONS: &str = "Write a quiz of five multiple-choice questions based only on \
the following document. Number each question, give four options labelled A-D, and list the \
correct answers at the end under an 'Answers' heading.";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: &Value) -> Result<String, ToolError>;
}

fn required_str<'a>(
    arguments: &'a Value,
    tool: &'static str,
    key: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments {
            tool,
            reason: format!("missing non-empty string `{key}`"),
        })
}

fn text_parameters(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string", "description": description}
        },
        "required": ["text"]
    })
}

pub struct ExtractTextFromPdf;

#[async_trait]
impl Tool for ExtractTextFromPdf {
    fn name(&self) -> &'static str {
        EXTRACT_TEXT_FROM_PDF
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            EXTRACT_TEXT_FROM_PDF,
            "Extract the plain text of a PDF file stored on the local filesystem.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "Absolute path of the PDF file"}
                },
                "required": ["file_path"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String, ToolError> {
        let path = PathBuf::from(required_str(arguments, EXTRACT_TEXT_FROM_PDF, "file_path")?);
        if !path.is_file() {
            return Err(ToolError::Pdf(format!("no such file: {}", path.display())));
        }

        // pdf-extract is synchronous and may panic on malformed input.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
            .await
            .map_err(|err| ToolError::Pdf(format!("extraction task failed: {err}")))?
            .map_err(|err| ToolError::Pdf(err.to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ToolError::Pdf(
                "document contains no extractable text".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

pub struct SummarizeDocument {
    model: Arc<ChatModel>,
}

impl SummarizeDocument {
    pub fn new(model: Arc<ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Tool for SummarizeDocument {
    fn name(&self) -> &'static str {
        SUMMARIZE_DOCUMENT
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            SUMMARIZE_DOCUMENT,
            "Produce a concise summary of the given document text.",
            text_parameters("Full text of the document to summarize"),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String, ToolError> {
        let text = required_str(arguments, SUMMARIZE_DOCUMENT, "text")?;
        Ok(self.model.ask(SUMMARY_INSTRUCTIONS, text).await?)
    }
}

pub struct GenerateQuiz {
    model: Arc<ChatModel>,
}

impl GenerateQuiz {
    pub fn new(model: Arc<ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Tool for GenerateQuiz {
    fn name(&self) -> &'static str {
        GENERATE_QUIZ
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            GENERATE_QUIZ,
            "Generate a multiple-choice quiz from the given document text.",
            text_parameters("Full text of the document to build the quiz from"),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String, ToolError> {
        let text = required_str(arguments, GENERATE_QUIZ, "text")?;
        Ok(self.model.ask(QUIZ_INSTRUCTIONS, text).await?)
    }
}

pub struct ReadUserProfile {
    store: ProfileStore,
}

impl ReadUserProfile {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadUserProfile {
    fn name(&self) -> &'static str {
        READ_USER_PROFILE
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            READ_USER_PROFILE,
            "Read the stored preferences and facts about the current user.",
            json!({"type": "object", "properties": {}}),
        )
    }

    async fn call(&self, _arguments: &Value) -> Result<String, ToolError> {
        let store = self.store.clone();
        let profile = blocking(move || store.load()).await?;
        if profile.fields.is_empty() {
            return Ok("No user profile information stored yet.".to_string());
        }
        Ok(json!(profile.fields).to_string())
    }
}

pub struct UpdateUserProfile {
    store: ProfileStore,
}

impl UpdateUserProfile {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateUserProfile {
    fn name(&self) -> &'static str {
        UPDATE_USER_PROFILE
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            UPDATE_USER_PROFILE,
            "Store a preference or fact about the current user under a key.",
            json!({
                "type": "object",
                "properties": {
                    "key": {"type": "string", "description": "Profile field name, e.g. `name` or `study_goal`"},
                    "value": {"type": "string", "description": "Value to store"}
                },
                "required": ["key", "value"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<String, ToolError> {
        let key = required_str(arguments, UPDATE_USER_PROFILE, "key")?;
        let value = required_str(arguments, UPDATE_USER_PROFILE, "value")?;

        let store = self.store.clone();
        let (field, entry) = (key.to_string(), value.to_string());
        blocking(move || {
            let mut profile = store.load()?;
            profile.fields.insert(field, entry);
            profile.updated_at = Some(timestamp());
            store.save(&profile)
        })
        .await?;

        tracing::info!(key, "user profile updated");
        Ok(format!("Updated user profile: {key} = {value}"))
    }
}

async fn blocking<T, F>(work: F) -> Result<T, ToolError>
where
    F: FnOnce() -> Result<T, ProfileError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ToolError::Task(err.to_string()))?
        .map_err(ToolError::from)
}

fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_secs().to_string(),
        Err(_) => "0".to_string(),
    }
}

#[derive(Clone)]
pub struct Toolbox {
    pub extract_text_from_pdf: Arc<dyn Tool>,
    pub summarize_document: Arc<dyn Tool>,
    pub generate_quiz: Arc<dyn Tool>,
    pub read_user_profile: Arc<dyn Tool>,
    pub update_user_profile: Arc<dyn Tool>,
}

impl Toolbox {
    pub fn new(model: Arc<ChatModel>, store: ProfileStore) -> Self {
        Self {
            extract_text_from_pdf: Arc::new(ExtractTextFromPdf),
            summarize_document: Arc::new(SummarizeDocument::new(Arc::clone(&model))),
            generate_quiz: Arc::new(GenerateQuiz::new(model)),
            read_user_profile: Arc::new(ReadUserProfile::new(store.clone())),
            update_user_profile: Arc::new(UpdateUserProfile::new(store)),
        }
    }
}
