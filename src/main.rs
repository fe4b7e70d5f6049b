// Entry point for the Minesweeper TUI application
// Resolves configuration, sets up logging, and launches the main UI

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

// Module declarations
mod tsw_board;   // Tile grid, mine layout and adjacency counts
mod tsw_color;   // Terminal color matching and tile glyphs
mod tsw_config;  // Persisted preferences
mod tsw_error;   // Core error type
mod tsw_flags;   // Flag bookkeeping
mod tsw_reveal;  // Reveal and flood fill
mod tsw_session; // Game lifecycle and win/loss state machine
mod tsw_ui;      // Terminal UI rendering and event handling

use tsw_config::{Config, load_or_create_config};
use tsw_session::GameSession;
use tsw_ui::run as run_ui;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Board width in tiles
    #[arg(long)]
    width: Option<usize>,

    /// Board height in tiles
    #[arg(long)]
    height: Option<usize>,

    /// Chance for each tile to hold a mine (0.0 to 1.0)
    #[arg(short = 'p', long)]
    mine_probability: Option<f64>,

    /// Force a seed instead of random boards
    #[arg(short, long)]
    seed: Option<u64>,

    /// Use ASCII glyphs only
    #[arg(long)]
    ascii: bool,

    /// Write logs to this file (the terminal is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Args {
    // Command-line values win over the config file for this run only
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(width) = self.width {
            cfg.width = width;
        }
        if let Some(height) = self.height {
            cfg.height = height;
        }
        if let Some(p) = self.mine_probability {
            cfg.mine_probability = p;
        }
        if self.ascii {
            cfg.ascii_icons = true;
        }
    }
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    // Load or create user configuration, then layer CLI overrides on top
    let mut cfg = load_or_create_config();
    args.apply_to(&mut cfg);
    let board_config = cfg.board_config().context("invalid board settings")?;

    let mut session = match args.seed {
        Some(seed) => GameSession::start_seeded(board_config, seed),
        None => GameSession::start(board_config),
    };
    tracing::info!(
        width = board_config.width(),
        height = board_config.height(),
        mine_probability = board_config.mine_probability(),
        seed = ?args.seed,
        "starting session"
    );

    // Launch the main UI loop
    run_ui(&cfg, &mut session)
}
