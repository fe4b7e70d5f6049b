// Error type shared by the board, reveal, flag and session modules

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum GameError {
    #[error("Coordinates ({0}, {1}) are outside the board")]
    InvalidCoords(usize, usize),
    #[error("Board size must be between 1x1 and 64x64, got {0}x{1}")]
    InvalidSize(usize, usize),
    #[error("Mine probability must be within 0.0..=1.0, got {0}")]
    InvalidProbability(f64),
}

pub type Result<T> = std::result::Result<T, GameError>;
