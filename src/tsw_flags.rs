// Flag bookkeeping, kept independent of the reveal logic

use crate::tsw_board::{Board, Coord2, TileState};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagDelta {
    Placed,
    Removed,
}

/// Running flag totals, updated in the same step as the tile state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagTracker {
    flag_count: usize,
    correct_flag_count: usize, // Flags sitting on actual mines
}

impl FlagTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag_count(&self) -> usize {
        self.flag_count
    }

    pub fn correct_flag_count(&self) -> usize {
        self.correct_flag_count
    }

    /// Toggle the flag at `coords`. Revealed tiles cannot carry a flag and yield `None`.
    pub fn toggle_flag(&mut self, board: &mut Board, coords: Coord2) -> Option<FlagDelta> {
        let tile = board[coords];
        match tile.state() {
            TileState::Hidden => {
                board.set_state(coords, TileState::Flagged);
                self.flag_count += 1;
                if tile.is_mine() {
                    self.correct_flag_count += 1;
                }
                Some(FlagDelta::Placed)
            }
            TileState::Flagged => {
                board.set_state(coords, TileState::Hidden);
                self.flag_count -= 1;
                if tile.is_mine() {
                    self.correct_flag_count -= 1;
                }
                Some(FlagDelta::Removed)
            }
            TileState::Revealed => None,
        }
    }
}
