//! shiptrack: command-line shipment tracker.
//!
//! Runs the tracking core against a recorded fixture of backend data, so the
//! full lookup → history → live update flow can be exercised offline.
//!
//! ## Subcommands
//!
//! - `lookup`: Find a shipment and print its summary and map plan
//! - `history`: Look up, then print the reconciled activity history
//! - `replay`: Look up, open history, then apply each recorded push
//! - `register`: Register a new shipment from a JSON form

mod fixture;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use shiptrack_core::{
    load_config, PushOutcome, RegistrationForm, Result, TrackError, TrackerConfig,
    TrackingController,
};
use shiptrack_core::{MemoryGeocoder, MemoryHistoryStore, MemoryShipmentStore};
use shiptrack_protocol::{parse_push, PushEvent};
use std::path::{Path, PathBuf};

use fixture::{Backend, Fixture};
use output::{Format, TerminalSink};

type Controller =
    TrackingController<MemoryShipmentStore, MemoryHistoryStore, MemoryGeocoder, TerminalSink>;

#[derive(Parser)]
#[command(name = "shiptrack")]
#[command(about = "Shipment tracking with live activity history")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.shiptrack/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print rendered models as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a shipment by tracking number
    Lookup {
        #[arg(value_name = "CODE")]
        tracking_number: String,

        /// Recorded backend data
        #[arg(long)]
        fixture: PathBuf,
    },

    /// Look up a shipment and show its activity history
    History {
        #[arg(value_name = "CODE")]
        tracking_number: String,

        #[arg(long)]
        fixture: PathBuf,
    },

    /// Replay the fixture's recorded pushes against a tracked shipment
    Replay {
        #[arg(long)]
        fixture: PathBuf,

        /// Shipment to track (defaults to the fixture's first shipment)
        #[arg(long, value_name = "CODE")]
        tracking_number: Option<String>,
    },

    /// Register a new shipment
    Register {
        #[arg(long)]
        fixture: PathBuf,

        /// JSON file with sender, receiver and package fields
        #[arg(long)]
        form: PathBuf,

        /// Authenticated owner id
        #[arg(long)]
        owner: Option<String>,
    },
}

fn main() {
    let _logging_guard = logging::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "shiptrack failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;
    let format = if cli.json { Format::Json } else { Format::Text };

    match cli.command {
        Commands::Lookup {
            tracking_number,
            fixture,
        } => {
            let (mut controller, _) = open(Fixture::load(&fixture)?, config, format);
            controller.lookup(&tracking_number)?;
        }
        Commands::History {
            tracking_number,
            fixture,
        } => {
            let (mut controller, _) = open(Fixture::load(&fixture)?, config, format);
            controller.lookup(&tracking_number)?;
            controller.open_history()?;
        }
        Commands::Replay {
            fixture,
            tracking_number,
        } => replay(&fixture, tracking_number, config, format)?,
        Commands::Register {
            fixture,
            form,
            owner,
        } => {
            let form = read_form(&form)?;
            let (mut controller, _) = open(Fixture::load(&fixture)?, config, format);
            let record = controller.register(&form, owner.as_deref())?;
            let tracking_number = record.tracking_number.unwrap_or_default();
            println!("Registered {}", tracking_number);
            controller.lookup(&tracking_number)?;
        }
    }
    Ok(())
}

fn open(
    fixture: Fixture,
    config: TrackerConfig,
    format: Format,
) -> (Controller, Vec<serde_json::Value>) {
    let (
        Backend {
            shipments,
            history,
            geocoder,
        },
        pushes,
    ) = fixture.into_backend();
    let controller = TrackingController::new(
        shipments,
        history,
        geocoder,
        TerminalSink::new(format),
        config,
    );
    (controller, pushes)
}

fn replay(
    path: &Path,
    tracking_number: Option<String>,
    config: TrackerConfig,
    format: Format,
) -> Result<()> {
    let fixture = Fixture::load(path)?;
    let tracking_number = tracking_number
        .or_else(|| fixture.first_tracking_number())
        .ok_or(TrackError::EmptyTrackingNumber)?;
    let (mut controller, pushes) = open(fixture, config, format);
    controller.lookup(&tracking_number)?;
    controller.open_history()?;

    for (index, payload) in pushes.into_iter().enumerate() {
        let event = match parse_push(payload) {
            Ok(event) => event,
            Err(info) => {
                tracing::warn!(
                    index = index,
                    code = %info.code,
                    message = %info.message,
                    "Skipping invalid push"
                );
                continue;
            }
        };

        // The recorded backend sees every write, tracked or not.
        match &event {
            PushEvent::ShipmentChanged { shipment } => {
                controller.shipments_mut().upsert(shipment.clone())
            }
            PushEvent::ActivityChanged { .. } => controller.history_mut().apply(&event),
        }

        match controller.handle_push(&event)? {
            PushOutcome::Ignored(reason) => {
                tracing::info!(index = index, reason = reason.as_str(), "Push ignored")
            }
            PushOutcome::Stale => tracing::info!(index = index, "Push refresh superseded"),
            PushOutcome::Refreshed(_) => {}
        }
    }
    Ok(())
}

fn read_form(path: &Path) -> Result<RegistrationForm> {
    let content = fs_err::read_to_string(path).map_err(|source| TrackError::Io {
        context: format!("reading form {}", path.display()),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| TrackError::Json {
        context: format!("parsing form {}", path.display()),
        source,
    })
}
