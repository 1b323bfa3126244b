use crate::error::AgentError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: &'static str, description: &'static str, parameters: Value) -> Self {
        Self {
            kind: "function",
            function: FunctionDefinition {
                name,
                description,
                parameters,
            },
        }
    }
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl AssistantReply {
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .is_some_and(|calls| !calls.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, AgentError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply, AgentError> {
        let body = ChatCompletionRequest {
            model,
            messages,
            tools: (!tools.is_empty()).then_some(tools),
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(%url, model, messages = messages.len(), "sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AgentError::Http { status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| AgentError::Decode(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Decode("response contained no choices".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ChatModel {
    client: ChatClient,
    name: String,
}

impl ChatModel {
    pub fn new(client: ChatClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply, AgentError> {
        self.client.complete(&self.name, messages, tools).await
    }

    pub async fn ask(&self, instructions: &str, input: &str) -> Result<String, AgentError> {
        let messages = [ChatMessage::system(instructions), ChatMessage::user(input)];
        let reply = self.complete(&messages, &[]).await?;
        Ok(reply.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ChatClient {
        ChatClient::new(server.uri(), "test-key").expect("client should build")
    }

    #[tokio::test]
    async fn complete_sends_model_auth_and_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gemini-2.0-flash",
                "tools": [{"type": "function", "function": {"name": "generate_quiz"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tools = [ToolDefinition::function(
            "generate_quiz",
            "quiz",
            json!({"type": "object"}),
        )];
        let reply = client_for(&server)
            .complete("gemini-2.0-flash", &[ChatMessage::user("hi")], &tools)
            .await
            .expect("completion should succeed");

        assert_eq!(reply.content.as_deref(), Some("hello"));
        assert!(!reply.has_tool_calls());
    }

    #[tokio::test]
    async fn complete_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "extract_text_from_pdf", "arguments": "{\"file_path\":\"/tmp/a.pdf\"}"}
                    }]
                }}]
            })))
            .mount(&server)
            .await;

        let reply = client_for(&server)
            .complete("m", &[ChatMessage::user("hi")], &[])
            .await
            .expect("completion should succeed");

        let calls = reply.tool_calls.expect("tool calls should be present");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].function.name, "extract_text_from_pdf");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("m", &[ChatMessage::user("hi")], &[])
            .await
            .expect_err("401 should fail");

        match err {
            AgentError::Http { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("m", &[ChatMessage::user("hi")], &[])
            .await
            .expect_err("no choices should fail");
        assert!(matches!(err, AgentError::Decode(_)));
    }

    #[test]
    fn tool_message_serializes_call_id_and_omits_tool_calls() {
        let value = serde_json::to_value(ChatMessage::tool("call_9", "done"))
            .expect("message should serialize");
        assert_eq!(
            value,
            json!({"role": "tool", "content": "done", "tool_call_id": "call_9"})
        );
    }
}
