use crate::agent::invoker::AgentInvoker;
use crate::agent::AgentReply;
use crate::event::AppEvent;
use crate::session::orchestrator::{Notice, Orchestrator, PlannedRun, Request};
use crate::session::{Extraction, Role};
use crate::theme::Theme;
use crate::upload::UploadedFile;
use eframe::egui::{self, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{SystemTime, UNIX_EPOCH};

enum Action {
    Upload(UploadedFile),
    Summarize,
    Quiz,
}

pub struct PdfAssistantApp {
    rx: Receiver<AppEvent>,
    invoker: AgentInvoker,
    orchestrator: Orchestrator,
    theme: Theme,
    chat_input: String,
    path_input: String,
    notice: Option<Notice>,
    diagnostics_log: Vec<String>,
    scroll_to_bottom: bool,
}

impl PdfAssistantApp {
    pub fn new(rx: Receiver<AppEvent>, invoker: AgentInvoker, theme: Theme) -> Self {
        Self {
            rx,
            invoker,
            orchestrator: Orchestrator::new(),
            theme,
            chat_input: String::new(),
            path_input: String::new(),
            notice: None,
            diagnostics_log: Vec::new(),
            scroll_to_bottom: false,
        }
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn set_notice(&mut self, notice: Notice) {
        let text = match &notice {
            Notice::Success(text) | Notice::Warning(text) | Notice::Error(text) => text.clone(),
        };
        self.log_diagnostic(text);
        self.notice = Some(notice);
    }

    fn start(&mut self, run: PlannedRun, staged: Option<tempfile::TempPath>) {
        self.log_diagnostic(format!("started: {}", run.request.label()));
        self.invoker.spawn(run, staged);
    }

    fn submit_chat(&mut self, ctx: &egui::Context) {
        let Some(run) = self.orchestrator.submit_chat(&self.chat_input) else {
            return;
        };
        self.chat_input.clear();
        self.scroll_to_bottom = true;
        self.start(run, None);
        ctx.request_repaint();
    }

    fn handle_upload(&mut self, upload: UploadedFile) {
        if self.orchestrator.is_busy() {
            self.set_notice(Notice::Warning(
                "Wait for the current request to finish before uploading.".to_string(),
            ));
            return;
        }
        if !self.orchestrator.needs_extraction(&upload.name) {
            self.log_diagnostic(format!("reusing cached text for {}", upload.name));
            return;
        }

        let staged = match upload.stage() {
            Ok(staged) => staged,
            Err(err) => {
                self.set_notice(Notice::Error(format!(
                    "Error: could not write temporary file: {err}"
                )));
                return;
            }
        };

        if let Some(run) = self.orchestrator.begin_extraction(&upload.name, &staged) {
            self.notice = None;
            self.start(run, Some(staged));
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Upload(upload) => self.handle_upload(upload),
            Action::Summarize => {
                if let Some(run) = self.orchestrator.begin_summary() {
                    self.start(run, None);
                }
            }
            Action::Quiz => {
                if let Some(run) = self.orchestrator.begin_quiz() {
                    self.start(run, None);
                }
            }
        }
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RunFinished { request, outcome } => {
                if request == Request::Chat {
                    self.scroll_to_bottom = true;
                }
                self.log_diagnostic(format!("finished: {}", request.label()));
                if let Some(notice) = self.orchestrator.complete(request, outcome) {
                    self.set_notice(notice);
                }
            }
            AppEvent::Warning(message) => self.set_notice(Notice::Warning(message)),
        }
    }

    fn collect_dropped_files(&mut self, ctx: &egui::Context) -> Option<Action> {
        let dropped = ctx.input(|input| input.raw.dropped_files.clone());
        // One PDF at a time; extra files in the same drop are ignored.
        let file = dropped.first()?;
        match UploadedFile::from_dropped(file) {
            Ok(upload) => Some(Action::Upload(upload)),
            Err(err) => {
                self.set_notice(Notice::Error(format!("Error: {err}")));
                None
            }
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("PDF Summarizer & Quiz Generator");
                if let Some(request) = self.orchestrator.pending() {
                    ui.separator();
                    ui.spinner();
                    ui.label(RichText::new(request.label()).color(self.theme.text_muted));
                }
            });
        });
    }

    fn render_chat_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("chat_panel")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                ui.heading("Chat with Assistant");
                ui.separator();

                let transcript_height = (ui.available_height() - 60.0).max(120.0);
                ScrollArea::vertical()
                    .id_salt("chat_transcript")
                    .max_height(transcript_height)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for message in &self.orchestrator.state().messages {
                            let from_user = message.role == Role::User;
                            self.theme.bubble_frame(from_user).show(ui, |ui| {
                                ui.set_width(ui.available_width());
                                let who = if from_user { "You" } else { "Assistant" };
                                ui.label(RichText::new(who).small().color(self.theme.text_muted));
                                ui.label(message.content.as_str());
                            });
                        }

                        if self.orchestrator.pending() == Some(&Request::Chat) {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label("Agent thinking...");
                            });
                        }

                        if self.scroll_to_bottom {
                            ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                        }
                    });
                self.scroll_to_bottom = false;

                ui.separator();
                let enabled = !self.orchestrator.is_busy();
                let mut send_now = false;
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        enabled,
                        egui::TextEdit::singleline(&mut self.chat_input)
                            .desired_width(ui.available_width() - 60.0)
                            .hint_text("Ask me anything..."),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        send_now = true;
                    }
                    send_now |= ui
                        .add_enabled(
                            enabled && !self.chat_input.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked();
                });

                if send_now && enabled {
                    self.submit_chat(ctx);
                }
            });
    }

    fn render_upload_row(&mut self, ui: &mut egui::Ui) -> Option<Action> {
        let mut requested = None;
        self.theme.card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                RichText::new("Drop a PDF onto the window, or enter its path:")
                    .color(self.theme.text_muted),
            );
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.path_input)
                        .desired_width(ui.available_width() - 80.0)
                        .hint_text("/path/to/document.pdf"),
                );
                let submitted =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                let clicked = ui
                    .add_enabled(
                        !self.path_input.trim().is_empty(),
                        egui::Button::new("Upload"),
                    )
                    .clicked();
                if (submitted || clicked) && !self.path_input.trim().is_empty() {
                    requested = Some(PathBuf::from(self.path_input.trim()));
                }
            });
        });

        let path = requested?;
        match UploadedFile::from_path(&path) {
            Ok(upload) => Some(Action::Upload(upload)),
            Err(err) => {
                self.set_notice(Notice::Error(format!("Error: {err}")));
                None
            }
        }
    }

    fn render_notice(&self, ui: &mut egui::Ui) {
        let Some(notice) = &self.notice else {
            return;
        };
        let (Notice::Success(text) | Notice::Warning(text) | Notice::Error(text)) = notice;
        self.theme.notice_frame(notice).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(text.as_str()).color(self.theme.notice_color(notice)));
        });
    }

    fn render_reply(&self, ui: &mut egui::Ui, heading: &str, reply: &AgentReply) {
        ui.add_space(self.theme.spacing_8);
        ui.heading(heading);
        match reply {
            AgentReply::Success(text) => {
                self.theme.card_frame().show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(text.as_str());
                });
            }
            AgentReply::Failure(text) => {
                ui.label(RichText::new(text.as_str()).color(self.theme.danger));
            }
        }
    }

    fn render_document_panel(&mut self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("document_panel")
                .show(ui, |ui| {
                    ui.heading("Upload PDF for Summary & Quiz");
                    if let Some(upload) = self.render_upload_row(ui) {
                        action = Some(upload);
                    }

                    let state = self.orchestrator.state();
                    if let Some(name) = &state.uploaded_file_name {
                        ui.label(format!("Current file: {name}"));
                    }
                    if let Some(Request::Extract { file_name }) = self.orchestrator.pending() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(format!("Extracting text from {file_name}..."));
                        });
                    }
                    self.render_notice(ui);

                    let current = state
                        .uploaded_file_name
                        .as_ref()
                        .and_then(|name| state.extractions.get(name));
                    if let Some(Extraction::Failed { reason }) = current {
                        ui.label(
                            RichText::new(format!("No text available for this file. {reason}"))
                                .color(self.theme.text_muted),
                        );
                    }
                    let Some(text) = state.current_text() else {
                        return;
                    };

                    egui::CollapsingHeader::new("View Extracted Text")
                        .default_open(false)
                        .show(ui, |ui| {
                            let mut view = text;
                            ui.add(
                                egui::TextEdit::multiline(&mut view)
                                    .desired_width(f32::INFINITY)
                                    .desired_rows(16)
                                    .font(egui::TextStyle::Monospace),
                            );
                        });

                    let idle = !self.orchestrator.is_busy();
                    ui.columns(2, |columns| {
                        if columns[0]
                            .add_enabled(idle, egui::Button::new("Generate Summary"))
                            .clicked()
                        {
                            action = Some(Action::Summarize);
                        }
                        if columns[1]
                            .add_enabled(idle, egui::Button::new("Generate Quiz"))
                            .clicked()
                        {
                            action = Some(Action::Quiz);
                        }
                    });

                    if let Some(summary) = &state.summary {
                        self.render_reply(ui, "Document Summary", summary);
                    }
                    if let Some(quiz) = &state.quiz {
                        self.render_reply(ui, "Generated Quiz", quiz);
                    }
                });

            let state = self.orchestrator.state();
            if let Some(debug) = &state.tool_debug {
                ui.separator();
                egui::CollapsingHeader::new("Agent Tool Outputs (Debugging)")
                    .default_open(false)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("tool_debug")
                            .max_height(160.0)
                            .show(ui, |ui| {
                                ui.monospace(debug.as_str());
                            });
                    });
            }

            ui.separator();
            egui::CollapsingHeader::new("Diagnostics")
                .default_open(false)
                .show(ui, |ui| {
                    ScrollArea::vertical()
                        .id_salt("diagnostics_log")
                        .max_height(90.0)
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for entry in &self.diagnostics_log {
                                ui.label(entry);
                            }
                        });
                });
        });
        action
    }
}

impl eframe::App for PdfAssistantApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let dropped = self.collect_dropped_files(ctx);
        self.render_top_bar(ctx);
        self.render_chat_panel(ctx);
        let clicked = self.render_document_panel(ctx);

        for action in dropped.into_iter().chain(clicked) {
            self.dispatch(action);
        }
    }
}
