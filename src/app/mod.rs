use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use eframe::egui::{self, Context};
use log::{error, info};

use sunburst_nav::hierarchy::NodeRef;
use sunburst_nav::tree::{RawNode, TreeSource};
use sunburst_nav::{Sunburst, SunburstConfig};

mod graph;
mod render_utils;
mod ui;

use self::ui::details::DetailRegistry;

pub struct SunburstApp {
    source: Arc<dyn TreeSource>,
    config: SunburstConfig,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<RawNode, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    engine: Sunburst,
    source_label: String,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    details: DetailRegistry,
    notices: VecDeque<Notice>,
    hovered: Option<NodeRef>,
}

struct SearchMatchCache {
    query: String,
    generation: u64,
    matches: Arc<Vec<SearchMatch>>,
}

struct SearchMatch {
    id: String,
    name: String,
    path: String,
    score: i64,
}

struct Notice {
    message: String,
    severity: NoticeSeverity,
    expires_at: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum NoticeSeverity {
    Info,
    Error,
}

impl SunburstApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn TreeSource>,
        config: SunburstConfig,
    ) -> Self {
        let state = Self::start_load(Arc::clone(&source));
        Self {
            source,
            config,
            state,
        }
    }

    fn spawn_load(source: Arc<dyn TreeSource>) -> Receiver<Result<RawNode, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = source.fetch_tree().map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: Arc<dyn TreeSource>) -> AppState {
        info!("loading tree from {}", source.describe());
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn open(
        source: &Arc<dyn TreeSource>,
        config: SunburstConfig,
        result: Result<RawNode, String>,
    ) -> AppState {
        let opened = result.and_then(|tree| {
            Sunburst::new(&tree, Arc::clone(source), config).map_err(|error| error.to_string())
        });

        match opened {
            Ok(engine) => AppState::Ready(Box::new(ViewModel::new(engine, source.describe()))),
            Err(message) => {
                error!("failed to open tree: {message}");
                AppState::Error(message)
            }
        }
    }
}

impl eframe::App for SunburstApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(Self::open(&self.source, self.config, result)),
                    Err(mpsc::TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading {}...", self.source.describe()));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the tree");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(Arc::clone(&self.source)));
                    }
                });
            }
            AppState::Ready(model) => model.show(ctx),
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
