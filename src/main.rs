//! translator: headless host for the annotation canvas engine.
//!
//! Loads an image and a region list into the engine, optionally replays one
//! pointer gesture, and prints the resulting canvas state as JSON. The
//! composited canvas can be written out as a PNG for inspection.

mod cli;
mod report;

use std::time::Duration;

use canvas::config::CanvasConfig;
use canvas::doc::{RegionId, RegionStore};
use canvas::engine::{Action, Engine};
use canvas::input::Button;
use canvas::lifecycle::SourceLoader;
use canvas::mapper::Point;
use canvas::render::RasterSurface;
use clap::Parser;
use tracing::info;

use crate::cli::{CanvasArgs, Cli, CliError, Command};
use crate::report::Report;

type Canvas = Engine<RasterSurface, SourceLoader>;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = CanvasConfig::from_env()?;

    let report = match cli.command {
        Command::Inspect(args) => {
            let session = open(config, &args).await?;
            session.finish(&args)?
        }
        Command::Gesture(args) => {
            let mut session = open(config, &args.canvas).await?;
            session.gesture(args.from, args.to);
            session.finish(&args.canvas)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// An engine plus the region store that owns its annotation list.
struct Session {
    engine: Canvas,
    store: RegionStore,
    events: Vec<Action>,
}

async fn open(config: CanvasConfig, args: &CanvasArgs) -> Result<Session, CliError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.http_timeout_secs))
        .build()?;
    let mut engine = Engine::new(config, RasterSurface::new(), SourceLoader::new(http));
    let mut events = Vec::new();

    if let Some(container) = args.container {
        events.extend(engine.set_container(container));
    }

    let loaded = engine.load_image(args.image.clone()).await;
    if let Some(message) = loaded.iter().find_map(|a| match a {
        Action::LoadFailed { message, .. } => Some(message.clone()),
        _ => None,
    }) {
        return Err(CliError::Load(message));
    }
    events.extend(loaded);

    let mut store = RegionStore::new();
    if let Some(path) = &args.regions {
        store.load(cli::load_regions(path).await?);
        info!(count = store.len(), path = %path.display(), "regions loaded");
    }
    events.extend(engine.set_regions(store.regions().to_vec()));

    if let Some(id) = &args.select {
        if !store.select(Some(RegionId::new(id.as_str()))) {
            return Err(CliError::UnknownRegion(id.clone()));
        }
        events.extend(engine.set_selected(store.selected().cloned()));
    }

    if let Some(zoom) = args.zoom {
        events.extend(engine.set_zoom(zoom));
    }

    Ok(Session { engine, store, events })
}

impl Session {
    /// Replay a primary-button drag and feed the outcome back as the owner would.
    fn gesture(&mut self, from: Point, to: Point) {
        let mut actions = self.engine.on_pointer_down(from, Button::Primary);
        actions.extend(self.engine.on_pointer_move(to));
        actions.extend(self.engine.on_pointer_up(to, Button::Primary));

        if self.store.apply_all(&actions) {
            info!(regions = self.store.len(), "region list changed");
        }
        actions.extend(self.engine.set_regions(self.store.regions().to_vec()));
        actions.extend(self.engine.set_selected(self.store.selected().cloned()));
        self.events.extend(actions);
    }

    fn finish(mut self, args: &CanvasArgs) -> Result<Report, CliError> {
        self.engine.render();
        if let Some(path) = &args.preview {
            self.engine.surface().save(path)?;
            info!(path = %path.display(), "preview written");
        }
        let image = self.engine.image().cloned();
        let report = Report::capture(&self.engine.core, image.as_deref(), self.events);
        self.engine.teardown();
        Ok(report)
    }
}
