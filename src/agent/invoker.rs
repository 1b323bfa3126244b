use crate::agent::runner::Runner;
use crate::agent::{collapse, AgentProfiles, Invocation, ProfileKind, RunItem};
use crate::error::AgentError;
use crate::event::AppEvent;
use crate::session::orchestrator::PlannedRun;
use eframe::egui;
use std::sync::{mpsc, Arc, OnceLock};
use tempfile::TempPath;
use tokio::runtime::Handle;

#[derive(Clone)]
pub struct AgentInvoker {
    runner: Arc<Runner>,
    profiles: Arc<AgentProfiles>,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    repaint: Arc<OnceLock<egui::Context>>,
}

impl AgentInvoker {
    pub fn new(
        runner: Runner,
        profiles: AgentProfiles,
        tx: mpsc::Sender<AppEvent>,
        runtime_handle: Handle,
    ) -> Self {
        Self {
            runner: Arc::new(runner),
            profiles: Arc::new(profiles),
            tx,
            runtime_handle,
            repaint: Arc::new(OnceLock::new()),
        }
    }

    pub fn attach_context(&self, ctx: egui::Context) {
        let _ = self.repaint.set(ctx);
    }

    pub async fn invoke(&self, kind: ProfileKind, prompt: &str) -> Result<Invocation, AgentError> {
        let profile = self.profiles.get(kind);
        tracing::info!(agent = %profile.name, prompt_chars = prompt.len(), "invoking agent");

        let result = self.runner.run(profile, prompt).await?;
        for item in &result.new_items {
            match item {
                RunItem::ToolCall {
                    call_id,
                    tool_name,
                    arguments,
                } => {
                    tracing::debug!(agent = %profile.name, %call_id, tool = %tool_name, %arguments, "tool called");
                }
                RunItem::ToolCallOutput(record) => {
                    tracing::debug!(
                        agent = %profile.name,
                        call_id = %record.call_id,
                        tool = %record.tool_name,
                        has_output = record.output.is_some(),
                        "tool returned"
                    );
                }
                RunItem::MessageOutput(_) => {}
            }
        }
        let invocation = collapse(&result);
        if let Some(dump) = &invocation.tool_debug {
            tracing::debug!(agent = %profile.name, "agent tool outputs:\n{dump}");
        }
        Ok(invocation)
    }

    /// `staged` is deleted once the run finishes, whatever its outcome.
    pub fn spawn(&self, run: PlannedRun, staged: Option<TempPath>) {
        let invoker = self.clone();

        self.runtime_handle.spawn(async move {
            let outcome = invoker
                .invoke(run.profile, &run.prompt)
                .await
                .map_err(|err| {
                    tracing::error!(request = ?run.request, "agent run failed: {err}");
                    err.to_string()
                });

            if let Some(staged) = staged {
                let path = staged.to_path_buf();
                if let Err(err) = staged.close() {
                    tracing::warn!(path = %path.display(), "temp file cleanup failed: {err}");
                    let _ = invoker.tx.send(AppEvent::Warning(format!(
                        "Could not delete temporary file: {err}"
                    )));
                }
            }

            let _ = invoker.tx.send(AppEvent::RunFinished {
                request: run.request,
                outcome,
            });
            if let Some(ctx) = invoker.repaint.get() {
                ctx.request_repaint();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::client::{ChatClient, ChatModel};
    use crate::agent::tools::Toolbox;
    use crate::profile::store::ProfileStore;
    use crate::session::orchestrator::Request;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn invoker_for(
        server: &MockServer,
        profile_dir: &Path,
    ) -> (AgentInvoker, mpsc::Receiver<AppEvent>) {
        let client = ChatClient::new(server.uri(), "key").expect("client should build");
        let model = Arc::new(ChatModel::new(client, "m"));
        let store = ProfileStore::new(profile_dir.join("profile.json"));
        let toolbox = Toolbox::new(Arc::clone(&model), store);
        let (tx, rx) = mpsc::channel();
        let invoker = AgentInvoker::new(
            Runner::new(5),
            AgentProfiles::new(model, &toolbox),
            tx,
            Handle::current(),
        );
        (invoker, rx)
    }

    fn staged_file() -> TempPath {
        let file = tempfile::Builder::new()
            .prefix("pdf-assistant-")
            .suffix(".pdf")
            .tempfile()
            .expect("temp file should be created");
        file.into_temp_path()
    }

    fn chat_run(prompt: &str) -> PlannedRun {
        PlannedRun {
            request: Request::Chat,
            profile: ProfileKind::Summarizer,
            prompt: prompt.to_string(),
        }
    }

    fn text_reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    async fn events_until_finished(rx: mpsc::Receiver<AppEvent>) -> Vec<AppEvent> {
        tokio::task::spawn_blocking(move || {
            let mut events = Vec::new();
            loop {
                let event = rx
                    .recv_timeout(Duration::from_secs(10))
                    .expect("run should report back");
                let finished = matches!(event, AppEvent::RunFinished { .. });
                events.push(event);
                if finished {
                    return events;
                }
            }
        })
        .await
        .expect("receiver task should join")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn spawn_reports_tool_output_and_deletes_staged_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Updated user profile"))
            .respond_with(text_reply("Saved your preference."))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "u1", "type": "function", "function": {
                        "name": "update_user_profile",
                        "arguments": "{\"key\":\"k\",\"value\":\"v\"}"
                    }}
                ]}}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let (invoker, rx) = invoker_for(&server, dir.path());
        let staged = staged_file();
        let staged_path = staged.to_path_buf();

        invoker.spawn(chat_run("remember k = v"), Some(staged));
        let events = events_until_finished(rx).await;

        assert_eq!(events.len(), 1, "no warning expected: {events:?}");
        let AppEvent::RunFinished { request, outcome } = &events[0] else {
            panic!("expected RunFinished, got {events:?}");
        };
        assert_eq!(*request, Request::Chat);
        assert_eq!(
            outcome.as_ref().expect("run should succeed"),
            &Invocation {
                text: "Updated user profile: k = v".to_string(),
                tool_debug: Some("Updated user profile: k = v".to_string()),
            }
        );
        assert!(!staged_path.exists());
        assert!(dir.path().join("profile.json").is_file());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_staged_file_is_reported_as_warning() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(text_reply("hello there"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let (invoker, rx) = invoker_for(&server, dir.path());
        let staged = staged_file();
        std::fs::remove_file(&staged).expect("staged file should be removable");

        invoker.spawn(chat_run("hi"), Some(staged));
        let events = events_until_finished(rx).await;

        assert_eq!(events.len(), 2, "{events:?}");
        let AppEvent::Warning(warning) = &events[0] else {
            panic!("expected a warning first, got {events:?}");
        };
        assert!(warning.starts_with("Could not delete temporary file"));
        let AppEvent::RunFinished { outcome, .. } = &events[1] else {
            panic!("expected RunFinished last, got {events:?}");
        };
        let invocation = outcome.as_ref().expect("run should succeed");
        assert_eq!(invocation.text, "hello there");
        assert!(invocation.tool_debug.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn http_failure_comes_back_as_error_outcome_and_still_cleans_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let (invoker, rx) = invoker_for(&server, dir.path());
        let staged = staged_file();
        let staged_path = staged.to_path_buf();

        invoker.spawn(
            PlannedRun {
                request: Request::Summary,
                profile: ProfileKind::Summarizer,
                prompt: "summarize".to_string(),
            },
            Some(staged),
        );
        let events = events_until_finished(rx).await;

        let [AppEvent::RunFinished { request, outcome }] = events.as_slice() else {
            panic!("expected a single RunFinished, got {events:?}");
        };
        assert_eq!(*request, Request::Summary);
        let reason = outcome.as_ref().expect_err("run should fail");
        assert!(reason.contains("500"), "{reason}");
        assert!(!staged_path.exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invoke_uses_the_selected_profile_instructions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("You generate quizzes"))
            .and(body_string_contains("generate_quiz"))
            .respond_with(text_reply("Q1. ..."))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir should be created");
        let (invoker, _rx) = invoker_for(&server, dir.path());

        let invocation = invoker
            .invoke(ProfileKind::QuizGenerator, "make a quiz")
            .await
            .expect("invoke should succeed");
        assert_eq!(invocation.text, "Q1. ...");
        assert!(invocation.tool_debug.is_none());
    }
}
