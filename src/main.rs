mod app;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use log::{LevelFilter, error};

use sunburst_nav::SunburstConfig;
use sunburst_nav::tree::{CommandSource, FileSource, TreeSource};
use sunburst_nav::visibility::VisibilityPolicy;

#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["tree", "command"])))]
struct Args {
    /// JSON file holding the tree.
    #[arg(long)]
    tree: Option<PathBuf>,

    /// Command printing the tree as JSON on stdout, re-run on every refresh.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    command: Option<Vec<String>>,

    /// Rings drawn around the focus.
    #[arg(long, default_value_t = 3.0)]
    max_rings: f64,

    /// Narrowest arc, in radians, that still gets a label.
    #[arg(long, default_value_t = 0.03)]
    min_label_span: f64,

    /// Length of a focus transition in milliseconds; 0 disables animation.
    #[arg(long, default_value_t = 750)]
    transition_ms: u64,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn source(&self) -> Result<Arc<dyn TreeSource>> {
        if let Some(command) = &self.command {
            return Ok(Arc::new(CommandSource::new(command)?));
        }
        let path = self.tree.clone().unwrap_or_default();
        Ok(Arc::new(FileSource::new(path)))
    }

    fn config(&self) -> SunburstConfig {
        SunburstConfig {
            visibility: VisibilityPolicy {
                max_rings: self.max_rings.max(1.0),
                min_angular_span: self.min_label_span.max(0.0),
            },
            transition_secs: self.transition_ms as f64 / 1000.0,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let source = match args.source() {
        Ok(source) => source,
        Err(error) => {
            error!("{error:#}");
            return ExitCode::FAILURE;
        }
    };
    let config = args.config();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "sunburst-nav",
        options,
        Box::new(move |cc| Ok(Box::new(app::SunburstApp::new(cc, source, config)))),
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("viewer exited with an error: {error}");
            ExitCode::FAILURE
        }
    }
}
