mod agent;
mod app;
mod config;
mod error;
mod event;
mod profile;
mod session;
mod theme;
mod upload;

use agent::client::{ChatClient, ChatModel};
use agent::invoker::AgentInvoker;
use agent::runner::Runner;
use agent::tools::Toolbox;
use agent::AgentProfiles;
use app::PdfAssistantApp;
use config::Config;
use eframe::egui;
use profile::store::ProfileStore;
use std::sync::{mpsc, Arc};
use theme::Theme;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        let default_level = "debug,hyper_util=info,hyper=info,reqwest=info,eframe=info,egui=info";
        #[cfg(not(debug_assertions))]
        let default_level = "info";

        EnvFilter::new(default_level)
    });

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
    {
        eprintln!("failed to initialize logging: {err}");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(model = %config.model, base_url = %config.base_url, "starting pdf-assistant");

    let (tx, rx) = mpsc::channel();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("pdf-assistant-runtime")
        .build()?;

    let client = ChatClient::new(config.base_url.clone(), config.api_key.clone())?;
    let model = Arc::new(ChatModel::new(client, config.model.clone()));
    let store = ProfileStore::new(&config.profile_path);
    tracing::debug!(path = %store.path().display(), "user profile store");
    let toolbox = Toolbox::new(Arc::clone(&model), store);
    let profiles = AgentProfiles::new(model, &toolbox);
    tracing::debug!(?profiles, "agent profiles ready");

    let invoker = AgentInvoker::new(
        Runner::new(config.max_turns),
        profiles,
        tx,
        runtime.handle().clone(),
    );
    let theme = Theme::default();
    let app = PdfAssistantApp::new(rx, invoker.clone(), theme.clone());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("PDF Assistant")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "PDF Assistant",
        native_options,
        Box::new(move |creation_context| {
            theme.apply_visuals(&creation_context.egui_ctx);
            invoker.attach_context(creation_context.egui_ctx.clone());
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
