//! track-that — validate event definition files and replay simulated page
//! events against a fixture document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use trackthat_core::event_bus::noop_backend;
use trackthat_core::TrackerConfig;
use trackthat_web_sdk::adaptors::ga::GaConfig;
use trackthat_web_sdk::adaptors::gtm::GtmConfig;
use trackthat_web_sdk::definition::{load_definitions, CategoryDefinitions};
use trackthat_web_sdk::dom::memory::MemoryDocument;
use trackthat_web_sdk::{GaAdaptor, GtmAdaptor, QueueBackend, Tracker, WebAdaptor};

#[derive(Parser, Debug)]
#[command(name = "track-that")]
#[command(about = "Declarative analytics event tracking: check and simulate definitions")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables TRACK_THAT__* override it)
    #[arg(long, env = "TRACK_THAT_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and bind every definition, reporting what would be tracked
    Check {
        /// Definition file
        definitions: PathBuf,
        /// Fixture document the selectors are resolved against
        #[arg(long)]
        fixture: PathBuf,
    },
    /// Bind definitions, fire an event and print the backend command queue
    Simulate {
        /// Definition file
        definitions: PathBuf,
        /// Fixture document the selectors are resolved against
        #[arg(long)]
        fixture: PathBuf,
        /// Selector of the element(s) to fire the event at
        #[arg(long)]
        fire: String,
        /// Event type to fire
        #[arg(long, default_value = "click")]
        event: String,
        /// Debug mode (overrides config)
        #[arg(long, default_value_t = false)]
        debug: bool,
        /// Backend command format
        #[arg(long, value_enum, default_value_t = AdaptorKind::Ga)]
        adaptor: AdaptorKind,
        /// GTM container ID, required with `--adaptor gtm`
        #[arg(long)]
        container_id: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AdaptorKind {
    Ga,
    Gtm,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "track_that=info,trackthat_web_sdk=info".into());
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = TrackerConfig::load_from(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        TrackerConfig::default()
    });

    match cli.command {
        Command::Check {
            definitions,
            fixture,
        } => check(config, &definitions, &fixture),
        Command::Simulate {
            definitions,
            fixture,
            fire,
            event,
            debug,
            adaptor,
            container_id,
        } => {
            let mut config = config;
            if debug {
                config.debug_mode = true;
            }
            let run = Simulation {
                config,
                definitions: &definitions,
                fixture: &fixture,
                fire: &fire,
                event: &event,
            };
            let queue = match adaptor {
                AdaptorKind::Ga => run.execute(GaAdaptor::new(GaConfig::default()))?,
                AdaptorKind::Gtm => run.execute(GtmAdaptor::new(GtmConfig {
                    container_id: container_id.unwrap_or_default(),
                    ..Default::default()
                }))?,
            };
            println!("{}", serde_json::to_string_pretty(&queue)?);
            Ok(())
        }
    }
}

fn load_inputs(definitions: &Path, fixture: &Path) -> anyhow::Result<(Vec<CategoryDefinitions>, MemoryDocument)> {
    let defs = std::fs::read_to_string(definitions)
        .with_context(|| format!("reading {}", definitions.display()))?;
    let doc = std::fs::read_to_string(fixture)
        .with_context(|| format!("reading {}", fixture.display()))?;
    Ok((
        load_definitions(&defs).context("parsing definitions")?,
        MemoryDocument::from_json(&doc).context("parsing fixture")?,
    ))
}

fn check(config: TrackerConfig, definitions: &Path, fixture: &Path) -> anyhow::Result<()> {
    let (blocks, doc) = load_inputs(definitions, fixture)?;
    let tracker = Tracker::new(config, noop_backend());

    let mut rejected = 0;
    for block in &blocks {
        let summary = tracker.bind_definitions(block, &doc);
        println!(
            "{}: {} bound, {} skipped, {} rejected",
            block.category, summary.bound, summary.skipped, summary.rejected
        );
        rejected += summary.rejected;
    }
    if rejected > 0 {
        bail!("{rejected} definition(s) rejected");
    }
    Ok(())
}

struct Simulation<'a> {
    config: TrackerConfig,
    definitions: &'a Path,
    fixture: &'a Path,
    fire: &'a str,
    event: &'a str,
}

impl Simulation<'_> {
    fn execute<A: WebAdaptor + 'static>(self, adaptor: A) -> anyhow::Result<Vec<serde_json::Value>> {
        adaptor
            .validate_config()
            .with_context(|| format!("invalid {} adaptor config", adaptor.platform()))?;

        let (blocks, doc) = load_inputs(self.definitions, self.fixture)?;
        let backend = Arc::new(QueueBackend::new(adaptor));
        backend.install();

        let tracker = Tracker::new(self.config, backend.clone());
        for block in &blocks {
            tracker.bind_definitions(block, &doc);
        }

        let targets = doc.select(self.fire);
        if targets.ids().is_empty() {
            bail!("no element matches '{}'", self.fire);
        }
        let handled: usize = targets
            .ids()
            .iter()
            .map(|&id| doc.trigger(id, self.event))
            .sum();

        let queue = backend.drain();
        info!(
            targets = targets.ids().len(),
            handled,
            queued = queue.len(),
            "simulation finished"
        );
        Ok(queue)
    }
}
