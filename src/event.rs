use crate::agent::Invocation;
use crate::session::orchestrator::Request;

#[derive(Debug, Clone)]
pub enum AppEvent {
    RunFinished {
        request: Request,
        outcome: Result<Invocation, String>,
    },
    Warning(String),
}
