mod console;
mod snapshot_store;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use collection_core::{
    bridge::DEFAULT_QUEUE_CAPACITY, load_config, CollectionController, EventOutcome,
    ExportOutcome, SavePathPicker, StoreBridge,
};
use shared::domain::{CollectionKind, ItemId};
use tracing_subscriber::EnvFilter;

use crate::{
    console::{ConsoleBoard, ConsoleNotifier, PresetPicker},
    snapshot_store::SnapshotStore,
};

#[derive(Parser, Debug)]
#[command(name = "cardctl", about = "Manage installed extensions, resource packs and tools")]
struct Cli {
    /// TOML configuration file (defaults to ./collections.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "collections.json")]
    snapshot: PathBuf,
    #[arg(long, default_value = "extension")]
    kind: CollectionKind,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Toggle {
        id: String,
        #[arg(long, action = ArgAction::Set)]
        enabled: bool,
    },
    Export {
        id: String,
        /// Destination file; without it the save dialog is shown (or the
        /// export is cancelled when no dialog is available).
        #[arg(long)]
        to: Option<PathBuf>,
    },
    Remove {
        id: String,
    },
    /// Switch edit mode on and back off, printing the list after each pass.
    Lock,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn picker_for(command: &Command) -> Arc<dyn SavePathPicker> {
    match command {
        Command::Export { to: Some(to), .. } => Arc::new(PresetPicker {
            destination: Some(to.clone()),
        }),
        #[cfg(feature = "native-dialog")]
        Command::Export { to: None, .. } => Arc::new(console::NativePicker),
        _ => Arc::new(PresetPicker { destination: None }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let store = SnapshotStore::open(&cli.snapshot, std::env::temp_dir().join("cardctl-artifacts"))
        .await?;
    let (bridge, _worker) = StoreBridge::spawn(Arc::new(store), DEFAULT_QUEUE_CAPACITY);

    let board = ConsoleBoard::default();
    let mut controller = CollectionController::new_with_dependencies(
        cli.kind,
        &config,
        Arc::new(bridge),
        Box::new(board.clone()),
        Box::new(board.clone()),
        picker_for(&cli.command),
        Arc::new(ConsoleNotifier),
    );
    controller
        .load()
        .await
        .with_context(|| format!("failed to load the {} collection", cli.kind))?;

    match cli.command {
        Command::List => board.print(),
        Command::Toggle { id, enabled } => {
            let id = ItemId::from(id);
            if !board.click_checkbox(&id, enabled) {
                bail!("no item '{id}' in the {} collection", cli.kind);
            }
            for result in controller.process_pending_events().await {
                result?;
            }
            controller.save().await.context("failed to save enabled flags")?;
            board.print();
        }
        Command::Export { id, .. } => {
            let id = ItemId::from(id);
            events_for(&board, &id, cli.kind)?.export_requested();
            for result in controller.process_pending_events().await {
                match result? {
                    EventOutcome::Exported(ExportOutcome::Cancelled) => println!("export cancelled"),
                    EventOutcome::Exported(ExportOutcome::Failed { reason }) => {
                        bail!("export of '{id}' failed: {reason}")
                    }
                    _ => {}
                }
            }
        }
        Command::Remove { id } => {
            let id = ItemId::from(id);
            events_for(&board, &id, cli.kind)?.remove_requested();
            for result in controller.process_pending_events().await {
                result?;
            }
            board.print();
        }
        Command::Lock => {
            controller.change_editable();
            board.print();
            controller.change_editable();
            board.print();
        }
    }

    Ok(())
}

fn events_for(
    board: &ConsoleBoard,
    id: &ItemId,
    kind: CollectionKind,
) -> Result<collection_core::EventSink> {
    board
        .events_for(id)
        .ok_or_else(|| anyhow!("no item '{id}' in the {kind} collection"))
}
