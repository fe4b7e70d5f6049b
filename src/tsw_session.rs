// Game session: owns one board plus the counters and drives the win/loss state machine

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::tsw_board::{Board, BoardConfig, Coord2, TileState};
use crate::tsw_error::Result;
use crate::tsw_flags::FlagTracker;
use crate::tsw_reveal::reveal;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    InProgress,
    Won,
    Lost,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Self::InProgress => None,
            Self::Won => Some(Outcome::Won),
            Self::Lost => Some(Outcome::Lost),
        }
    }
}

/// Terminal result of a game
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// What a tile should look like; the front-end decides how to draw it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayKind {
    Plain,
    Revealed,
    Flagged,
    ExposedMine,
    IncorrectlyFlagged,
    Numbered(u8), // 1..=8
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChangedTile {
    pub x: usize,
    pub y: usize,
    pub display: DisplayKind,
}

/// Result of one player action: tiles to redraw plus the terminal outcome, if any
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub changed_tiles: Vec<ChangedTile>,
    pub outcome: Option<Outcome>,
}

impl ActionResult {
    pub fn is_empty(&self) -> bool {
        self.changed_tiles.is_empty() && self.outcome.is_none()
    }
}

pub struct GameSession {
    config: BoardConfig,
    rng: StdRng,
    board: Board,
    flags: FlagTracker,
    revealed_count: usize,
    state: SessionState,
    start_time: Option<Instant>, // Set by the first accepted action
    end_time: Option<Instant>,   // Freezes the clock once the game is over
    triggered_mine: Option<Coord2>,
}

impl GameSession {
    /// Start a session with an entropy-seeded generator
    pub fn start(config: BoardConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Start a session whose sequence of boards is reproducible from `seed`
    pub fn start_seeded(config: BoardConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: BoardConfig, mut rng: StdRng) -> Self {
        let board = Board::generate(&config, &mut rng);
        Self::assemble(config, rng, board)
    }

    /// Play on a prepared board. Restarts draw fresh boards of the same size
    /// with the default mine probability.
    pub fn from_board(board: Board) -> Self {
        let probability = BoardConfig::default().mine_probability();
        let config =
            BoardConfig::new(board.width(), board.height(), probability).unwrap_or_default();
        Self::assemble(config, StdRng::from_entropy(), board)
    }

    fn assemble(config: BoardConfig, rng: StdRng, board: Board) -> Self {
        Self {
            config,
            rng,
            board,
            flags: FlagTracker::new(),
            revealed_count: 0,
            state: SessionState::InProgress,
            start_time: None,
            end_time: None,
            triggered_mine: None,
        }
    }

    /// Discard the current game and begin a new one on a freshly drawn board
    pub fn restart(&mut self) {
        self.board = Board::generate(&self.config, &mut self.rng);
        self.flags = FlagTracker::new();
        self.revealed_count = 0;
        self.state = SessionState::InProgress;
        self.start_time = None;
        self.end_time = None;
        self.triggered_mine = None;
        tracing::info!(mines = self.board.total_mines(), "game restarted");
    }

    pub fn request_reveal(&mut self, x: usize, y: usize) -> Result<ActionResult> {
        let coords = self.board.validate_coords((x, y))?;
        if self.state.is_finished() || self.board[coords].state() != TileState::Hidden {
            return Ok(ActionResult::default());
        }
        self.mark_started();

        let result = reveal(&mut self.board, coords);
        if result.hit_mine {
            self.triggered_mine = Some(coords);
            self.finish(SessionState::Lost);
        } else {
            self.revealed_count += result.changed_tiles.len();
            tracing::trace!(
                revealed = result.changed_tiles.len(),
                total = self.revealed_count,
                "tiles revealed"
            );
            if self.revealed_count == self.board.safe_tile_count() {
                self.finish(SessionState::Won);
            }
        }

        Ok(self.collect_changes(result.changed_tiles))
    }

    pub fn request_flag_toggle(&mut self, x: usize, y: usize) -> Result<ActionResult> {
        let coords = self.board.validate_coords((x, y))?;
        if self.state.is_finished() || self.board[coords].state() == TileState::Revealed {
            return Ok(ActionResult::default());
        }
        self.mark_started();

        match self.flags.toggle_flag(&mut self.board, coords) {
            Some(delta) => {
                tracing::trace!(?delta, x, y, flags = self.flags.flag_count(), "flag toggled");
                Ok(self.collect_changes(vec![coords]))
            }
            None => Ok(ActionResult::default()),
        }
    }

    /// Current display of a tile, including the end-of-game marking once finished
    pub fn display_kind(&self, coords: Coord2) -> DisplayKind {
        let tile = self.board[coords];
        let finished = self.state.is_finished();
        match tile.state() {
            TileState::Hidden if finished && tile.is_mine() => DisplayKind::ExposedMine,
            TileState::Hidden => DisplayKind::Plain,
            TileState::Flagged if finished && !tile.is_mine() => DisplayKind::IncorrectlyFlagged,
            TileState::Flagged => DisplayKind::Flagged,
            TileState::Revealed => match tile.adjacent_mines() {
                0 => DisplayKind::Revealed,
                n => DisplayKind::Numbered(n),
            },
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn total_mines(&self) -> usize {
        self.board.total_mines()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn flag_count(&self) -> usize {
        self.flags.flag_count()
    }

    pub fn correct_flag_count(&self) -> usize {
        self.flags.correct_flag_count()
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    /// Time since the first action; read-only and stops advancing when the game ends
    pub fn elapsed(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    fn mark_started(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
        }
    }

    fn finish(&mut self, state: SessionState) {
        self.state = state;
        self.end_time = Some(Instant::now());
        tracing::info!(
            outcome = ?state,
            revealed = self.revealed_count,
            flags = self.flags.flag_count(),
            correct_flags = self.flags.correct_flag_count(),
            mines = self.board.total_mines(),
            "game over"
        );
    }

    // Tiles touched by the action, plus every tile the end-of-game pass re-marks
    fn collect_changes(&self, touched: Vec<Coord2>) -> ActionResult {
        let mut coords: BTreeSet<Coord2> = touched.into_iter().collect();
        if self.state.is_finished() {
            coords.extend(
                self.board
                    .iter()
                    .filter(|(_, t)| t.is_mine() != (t.state() == TileState::Flagged))
                    .map(|(pos, _)| pos),
            );
        }
        ActionResult {
            changed_tiles: coords
                .into_iter()
                .map(|(x, y)| ChangedTile {
                    x,
                    y,
                    display: self.display_kind((x, y)),
                })
                .collect(),
            outcome: self.state.outcome(),
        }
    }
}

/// Render a duration as `HH:MM:SS` for the timer display
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
