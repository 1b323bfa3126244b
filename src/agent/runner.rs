use crate::agent::client::{ChatMessage, ToolCall};
use crate::agent::{AgentProfile, RunItem, RunResult, ToolCallOutput};
use crate::error::AgentError;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Runner {
    max_turns: usize,
}

impl Runner {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    pub async fn run(&self, agent: &AgentProfile, input: &str) -> Result<RunResult, AgentError> {
        let definitions = agent.tool_definitions();
        let mut messages = vec![
            ChatMessage::system(agent.instructions.clone()),
            ChatMessage::user(input),
        ];
        let mut new_items = Vec::new();

        for turn in 1..=self.max_turns {
            let reply = agent.model.complete(&messages, &definitions).await?;

            if !reply.has_tool_calls() {
                let final_output = reply.content.unwrap_or_default();
                tracing::debug!(agent = %agent.name, turn, "run finished");
                new_items.push(RunItem::MessageOutput(final_output.clone()));
                return Ok(RunResult {
                    final_output,
                    new_items,
                });
            }

            let calls = reply.tool_calls.unwrap_or_default();
            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: reply.content,
                tool_calls: Some(calls.clone()),
                tool_call_id: None,
            });

            for call in &calls {
                new_items.push(RunItem::ToolCall {
                    call_id: call.id.clone(),
                    tool_name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                });

                let output = self.execute_tool(agent, call).await;
                messages.push(ChatMessage::tool(call.id.clone(), output.clone()));
                new_items.push(RunItem::ToolCallOutput(ToolCallOutput {
                    call_id: call.id.clone(),
                    tool_name: call.function.name.clone(),
                    output: Some(output),
                }));
            }
        }

        Err(AgentError::MaxTurnsExceeded {
            agent: agent.name.clone(),
            max_turns: self.max_turns,
        })
    }

    async fn execute_tool(&self, agent: &AgentProfile, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let Some(tool) = agent.tool(name) else {
            tracing::warn!(agent = %agent.name, tool = name, "model requested unknown tool");
            return format!("Error: unknown tool `{name}`");
        };

        let arguments = match parse_arguments(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(err) => return format!("Error: invalid arguments for `{name}`: {err}"),
        };

        tracing::debug!(agent = %agent.name, tool = name, "executing tool");
        match tool.call(&arguments).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(agent = %agent.name, tool = name, "tool failed: {err}");
                format!("Error: {err}")
            }
        }
    }
}

fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}
