use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("failed to decode model response: {0}")]
    Decode(String),
    #[error("agent `{agent}` exceeded {max_turns} turns without a final answer")]
    MaxTurnsExceeded { agent: String, max_turns: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (add it to the environment or a .env file)")]
    Missing(&'static str),
    #[error("{key} must be a positive integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown schema_version in {path}: {version}")]
    UnknownSchema { path: String, version: u32 },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
    #[error("extracting text from PDF failed: {0}")]
    Pdf(String),
    #[error("background task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Model(#[from] AgentError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}
