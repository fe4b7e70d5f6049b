// Board model: tile grid, mine layout and adjacency counts
// Pure data and derivation logic, no presentation awareness

use rand::Rng;
use std::ops::Index;

use crate::tsw_error::{GameError, Result};

/// Two-dimensional coordinates `(x, y)`, `x` is the column and `y` the row.
pub type Coord2 = (usize, usize);

pub const DEFAULT_WIDTH: usize = 15;
pub const DEFAULT_HEIGHT: usize = 15;
pub const DEFAULT_MINE_PROBABILITY: f64 = 0.1;

// Largest board that still fits a terminal grid of two-column cells
pub const MAX_WIDTH: usize = 64;
pub const MAX_HEIGHT: usize = 64;

fn check_size(width: usize, height: usize) -> Result<()> {
    if (1..=MAX_WIDTH).contains(&width) && (1..=MAX_HEIGHT).contains(&height) {
        Ok(())
    } else {
        Err(GameError::InvalidSize(width, height))
    }
}

/// Player-visible state of a tile
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TileState {
    #[default]
    Hidden,
    Revealed,
    Flagged,
}

/// A single cell on the board
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    is_mine: bool,      // Fixed at generation
    adjacent_mines: u8, // Mines among the up to 8 neighbours (0-8)
    state: TileState,
}

impl Tile {
    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub fn state(&self) -> TileState {
        self.state
    }
}

/// Validated board parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoardConfig {
    width: usize,
    height: usize,
    mine_probability: f64,
}

impl BoardConfig {
    pub fn new(width: usize, height: usize, mine_probability: f64) -> Result<Self> {
        check_size(width, height)?;
        if !mine_probability.is_finite() || !(0.0..=1.0).contains(&mine_probability) {
            return Err(GameError::InvalidProbability(mine_probability));
        }
        Ok(Self {
            width,
            height,
            mine_probability,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_probability(&self) -> f64 {
        self.mine_probability
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mine_probability: DEFAULT_MINE_PROBABILITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Tile>, // Row-major, index = y * width + x
    total_mines: usize,
}

impl Board {
    /// Draw a fresh board: every tile independently becomes a mine with the
    /// configured probability. The mine total is not fixed and may be zero,
    /// and the first reveal is not guaranteed to be safe.
    pub fn generate<R: Rng + ?Sized>(config: &BoardConfig, rng: &mut R) -> Self {
        let mine_mask = (0..config.width * config.height)
            .map(|_| rng.gen_bool(config.mine_probability))
            .collect();
        let board = Self::from_mine_mask(config.width, config.height, mine_mask);
        tracing::debug!(
            width = board.width,
            height = board.height,
            mines = board.total_mines,
            "generated board"
        );
        board
    }

    /// Build a board with mines at exactly the given coordinates
    pub fn from_mine_coords(width: usize, height: usize, mines: &[Coord2]) -> Result<Self> {
        check_size(width, height)?;
        let mut mine_mask = vec![false; width * height];
        for &(x, y) in mines {
            if x >= width || y >= height {
                return Err(GameError::InvalidCoords(x, y));
            }
            mine_mask[y * width + x] = true;
        }
        Ok(Self::from_mine_mask(width, height, mine_mask))
    }

    fn from_mine_mask(width: usize, height: usize, mine_mask: Vec<bool>) -> Self {
        let total_mines = mine_mask.iter().filter(|&&is_mine| is_mine).count();
        let mut board = Self {
            width,
            height,
            tiles: mine_mask
                .into_iter()
                .map(|is_mine| Tile {
                    is_mine,
                    ..Tile::default()
                })
                .collect(),
            total_mines,
        };
        // adjacency is computed once here and never touched again
        for y in 0..height {
            for x in 0..width {
                let count = board
                    .neighbors((x, y))
                    .filter(|&pos| board[pos].is_mine)
                    .count();
                let idx = board.index_of((x, y));
                board.tiles[idx].adjacent_mines = count as u8;
            }
        }
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub fn total_mines(&self) -> usize {
        self.total_mines
    }

    pub fn total_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tiles that must be revealed to win
    pub fn safe_tile_count(&self) -> usize {
        self.total_tiles() - self.total_mines
    }

    pub fn contains(&self, (x, y): Coord2) -> bool {
        x < self.width && y < self.height
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords(coords.0, coords.1))
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<&Tile> {
        self.contains(coords)
            .then(|| &self.tiles[self.index_of(coords)])
    }

    /// In-bounds coordinates among the 8 surrounding cells
    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    /// All tiles in row-major order together with their coordinates
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| ((i % self.width, i / self.width), tile))
    }

    pub(crate) fn set_state(&mut self, coords: Coord2, state: TileState) {
        let idx = self.index_of(coords);
        self.tiles[idx].state = state;
    }

    fn index_of(&self, (x, y): Coord2) -> usize {
        y * self.width + x
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        match self.get(coords) {
            Some(tile) => tile,
            None => panic!("tile {coords:?} is outside the {}x{} board", self.width, self.height),
        }
    }
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterator over neighbour coordinates, clipped at the board edges.
/// Holds only the centre and the bounds, so the board may be mutated while iterating.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: usize,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(dx, dy)) = DISPLACEMENTS.get(self.index) {
            self.index += 1;
            let x = self.center.0.checked_add_signed(dx);
            let y = self.center.1.checked_add_signed(dy);
            if let (Some(x), Some(y)) = (x, y) {
                if x < self.bounds.0 && y < self.bounds.1 {
                    return Some((x, y));
                }
            }
        }
        None
    }
}
