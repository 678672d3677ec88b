#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;
use eframe::{egui, App, NativeOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use revise_practice::config::{self, Config};
use revise_practice::logging;
use revise_practice::parsing::{parse_markup, revised_text, MarkupSegment};
use revise_practice::progress_io::{JsonFileProgressStore, ProgressStore};
use revise_practice::revision_service::HttpRevisionService;
use revise_practice::sentence_source;
use revise_practice::session::{LoadError, PracticeSession, RevisionWorker, SessionState, SubmissionPhase};
use revise_practice::types::revision::{result_rows, RevisionOutcome, ScoreBand};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(version, about = "Translation practice with scored revisions")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

enum UiAction {
    Select(usize),
    DraftEdited,
    Submit,
    Advance,
}

struct RevisePracticeApp {
    session: Option<PracticeSession>,
    load_error: Option<String>,
    worker: RevisionWorker,
    draft_buffer: String,
    target_language: String,
}

impl RevisePracticeApp {
    fn new(config: Config, config_error: Option<String>) -> Self {
        let service = HttpRevisionService::new(config.service_url.clone(), config.request_timeout());
        tracing::info!("Revision service at {}", service.endpoint());
        let (session, load_error) = match config_error {
            Some(err) => (None, Some(err)),
            None => match build_session(&config) {
                Ok(session) => (Some(session), None),
                Err(err) => {
                    tracing::error!("Session failed to load: {err}");
                    (None, Some(err.to_string()))
                }
            },
        };
        Self {
            session,
            load_error,
            worker: RevisionWorker::new(Arc::new(service)),
            draft_buffer: String::new(),
            target_language: config.prompt.target_language.clone(),
        }
    }

    fn apply_finished_submissions(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for completed in self.worker.poll() {
            session.complete_submission(completed);
        }
    }

    fn apply_actions(&mut self, actions: Vec<UiAction>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for action in actions {
            match action {
                UiAction::Select(index) => match session.select_sentence(index) {
                    Ok(state) => self.draft_buffer = state.draft_translation,
                    Err(err) => tracing::warn!("Ignoring selection: {err}"),
                },
                UiAction::DraftEdited => {
                    session.update_draft(self.draft_buffer.clone());
                }
                UiAction::Submit => {
                    if let Some(pending) = session.begin_submission() {
                        self.worker.dispatch(pending);
                    }
                }
                UiAction::Advance => {
                    self.draft_buffer = session.advance().draft_translation;
                }
            }
        }
    }
}

fn build_session(config: &Config) -> Result<PracticeSession, LoadError> {
    let progress_path = match &config.progress_file {
        Some(path) => path.clone(),
        None => JsonFileProgressStore::default_location()?,
    };
    let store = JsonFileProgressStore::new(progress_path);
    tracing::info!("Progress file at {}", store.path().display());
    let store: Box<dyn ProgressStore> = Box::new(store);
    let source = sentence_source::from_location(&config.sentences);
    Ok(PracticeSession::load(source.as_ref(), store)?.with_prompt_settings(config.prompt.clone()))
}

impl App for RevisePracticeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_finished_submissions();

        egui::TopBottomPanel::top("title_panel").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Improving writing with translation");
            });
        });

        let Some(session) = self.session.as_ref() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Nothing to practice");
                if let Some(err) = &self.load_error {
                    ui.colored_label(egui::Color32::RED, err);
                }
            });
            return;
        };

        if session.phase() == SubmissionPhase::Submitting {
            ctx.request_repaint_after(POLL_INTERVAL);
        }

        let mut actions = Vec::new();

        egui::SidePanel::left("sentence_panel")
            .min_width(250.0)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.heading("Sentences");
                ui.label(format!(
                    "{} / {} practiced",
                    session.practiced_count(),
                    session.sentences().len()
                ));
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (index, sentence) in session.sentences().iter().enumerate() {
                        let practiced = session.is_practiced(index);
                        let marker = if practiced { "✅" } else { "⬜" };
                        let mut text = egui::RichText::new(format!("{marker} {sentence}"));
                        if practiced {
                            text = text.color(egui::Color32::GRAY);
                        }
                        let selected = session.state().active_index == Some(index);
                        if ui.selectable_label(selected, text).clicked() && !selected {
                            actions.push(UiAction::Select(index));
                        }
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(sentence) = session.active_sentence() else {
                ui.label("The sentence list is empty.");
                return;
            };
            ui.label(format!("Translate sentence into {}:", self.target_language));
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(egui::RichText::new(sentence).size(18.0));
            });
            ui.add_space(8.0);

            let edit = ui.add(
                egui::TextEdit::multiline(&mut self.draft_buffer)
                    .hint_text("Enter your translation here...")
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
            if edit.changed() {
                actions.push(UiAction::DraftEdited);
            }

            ui.horizontal(|ui| {
                let submitting = session.phase() == SubmissionPhase::Submitting;
                let label = if submitting { "Revise ..." } else { "Revise" };
                if ui
                    .add_enabled(session.can_submit(), egui::Button::new(label))
                    .clicked()
                {
                    actions.push(UiAction::Submit);
                }
                if submitting {
                    ui.spinner();
                }
            });
            ui.add_space(8.0);

            render_result(ui, session.state());

            ui.add_space(12.0);
            if ui
                .add_enabled(session.can_advance(), egui::Button::new("Next"))
                .clicked()
            {
                actions.push(UiAction::Advance);
            }
        });

        self.apply_actions(actions);
    }
}

fn render_result(ui: &mut egui::Ui, state: &SessionState) {
    match &state.last_result {
        None => {}
        Some(RevisionOutcome::Unavailable { reason }) => {
            ui.colored_label(
                egui::Color32::RED,
                format!("Error: Unable to get a response. {reason}"),
            );
        }
        Some(RevisionOutcome::Revised(revision)) => {
            egui::Grid::new("result_table")
                .striped(true)
                .num_columns(3)
                .spacing([16.0, 6.0])
                .show(ui, |ui| {
                    ui.strong("Type");
                    ui.strong("Sentence");
                    ui.strong("Mark");
                    ui.end_row();
                    for (i, row) in result_rows(&state.draft_translation, revision).iter().enumerate() {
                        ui.label(row.label);
                        if i == 0 {
                            ui.label(&row.markup);
                        } else {
                            render_markup(ui, &row.markup);
                        }
                        mark_cell(ui, row.mark, row.band);
                        ui.end_row();
                    }
                });
        }
    }
}

fn render_markup(ui: &mut egui::Ui, markup: &str) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for segment in parse_markup(markup) {
            let text = egui::RichText::new(segment.text());
            let text = match segment {
                MarkupSegment::Plain(_) => text,
                MarkupSegment::Deleted(_) => text.strikethrough().color(egui::Color32::GRAY),
                MarkupSegment::Inserted(_) => text.color(egui::Color32::from_rgb(22, 163, 74)),
            };
            ui.label(text);
        }
    })
    .response
    .on_hover_text(revised_text(markup));
}

fn mark_cell(ui: &mut egui::Ui, mark: f32, band: ScoreBand) {
    let fill = match band {
        ScoreBand::Strong => egui::Color32::from_rgb(187, 247, 208),
        ScoreBand::Fair => egui::Color32::from_rgb(254, 240, 138),
        ScoreBand::Weak => egui::Color32::from_rgb(254, 202, 202),
    };
    egui::Frame::none()
        .fill(fill)
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(format_mark(mark)).color(egui::Color32::BLACK));
        });
}

fn format_mark(mark: f32) -> String {
    if mark.fract() == 0.0 {
        format!("{mark:.0}")
    } else {
        format!("{mark:.1}")
    }
}

fn main() -> Result<(), eframe::Error> {
    let args = Args::parse();
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let (config, config_error) = match config::load_config_from_file(&args.config) {
        Ok(config) => (config, None),
        Err(err) => {
            tracing::error!("{err}");
            (Config::default(), Some(err.to_string()))
        }
    };
    let app = RevisePracticeApp::new(config, config_error);

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Revise Practice",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
}
