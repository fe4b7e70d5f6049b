// Reveal engine: single-tile reveal and breadth-first flood fill over zero tiles

use std::collections::VecDeque;

use crate::tsw_board::{Board, Coord2, TileState};

/// Tiles touched by one reveal call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealResult {
    pub changed_tiles: Vec<Coord2>, // Each tile appears at most once
    pub hit_mine: bool,
}

/// Reveal the tile at `coords`.
///
/// A mine is reported through `hit_mine` and left hidden so the end-of-game
/// pass can expose it. A safe tile is marked revealed; if it has no adjacent
/// mines the reveal spreads through every connected zero tile plus the ring of
/// numbered tiles around that region. Tiles that are not hidden (flagged or
/// already revealed) are never touched, so a non-hidden start is a no-op.
pub fn reveal(board: &mut Board, coords: Coord2) -> RevealResult {
    let tile = board[coords];
    if tile.state() != TileState::Hidden {
        return RevealResult::default();
    }

    if tile.is_mine() {
        return RevealResult {
            changed_tiles: vec![coords],
            hit_mine: true,
        };
    }

    board.set_state(coords, TileState::Revealed);
    let mut changed_tiles = vec![coords];

    if tile.adjacent_mines() == 0 {
        // a tile is enqueued only at the moment it leaves Hidden, so at most once
        let mut queue = VecDeque::from([coords]);
        while let Some(current) = queue.pop_front() {
            for pos in board.neighbors(current) {
                let neighbor = board[pos];
                if neighbor.state() != TileState::Hidden {
                    continue;
                }
                board.set_state(pos, TileState::Revealed);
                changed_tiles.push(pos);
                if neighbor.adjacent_mines() == 0 {
                    queue.push_back(pos);
                }
            }
        }
    }

    RevealResult {
        changed_tiles,
        hit_mine: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsw_board::BoardConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_mine_coords(size.0, size.1, mines).unwrap()
    }

    #[test]
    fn mine_is_reported_and_left_hidden() {
        let mut b = board((2, 2), &[(0, 0)]);
        let result = reveal(&mut b, (0, 0));
        assert!(result.hit_mine);
        assert_eq!(result.changed_tiles, vec![(0, 0)]);
        assert_eq!(b[(0, 0)].state(), TileState::Hidden);
    }

    #[test]
    fn numbered_tile_reveals_only_itself() {
        let mut b = board((3, 3), &[(0, 0)]);
        let result = reveal(&mut b, (1, 1));
        assert!(!result.hit_mine);
        assert_eq!(result.changed_tiles, vec![(1, 1)]);
        assert_eq!(b[(1, 1)].state(), TileState::Revealed);
        assert_eq!(b[(2, 2)].state(), TileState::Hidden);
    }

    #[test]
    fn zero_tile_opens_region_and_its_border() {
        // mine column at x = 3 splits the board
        let mines = [(3, 0), (3, 1), (3, 2)];
        let mut b = board((5, 3), &mines);
        let result = reveal(&mut b, (0, 0));

        assert!(!result.hit_mine);
        assert_eq!(result.changed_tiles.len(), 9);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(b[(x, y)].state(), TileState::Revealed);
            }
            assert_eq!(b[(3, y)].state(), TileState::Hidden);
            assert_eq!(b[(4, y)].state(), TileState::Hidden);
        }
    }

    #[test]
    fn flood_fill_skips_flagged_tiles() {
        let mut b = board((4, 4), &[]);
        b.set_state((2, 2), TileState::Flagged);
        let result = reveal(&mut b, (0, 0));

        assert_eq!(result.changed_tiles.len(), 15);
        assert!(!result.changed_tiles.contains(&(2, 2)));
        assert_eq!(b[(2, 2)].state(), TileState::Flagged);
    }

    #[test]
    fn non_hidden_start_is_a_no_op() {
        let mut b = board((2, 2), &[(1, 1)]);
        b.set_state((0, 0), TileState::Flagged);
        assert_eq!(reveal(&mut b, (0, 0)), RevealResult::default());
        reveal(&mut b, (1, 0));
        assert_eq!(reveal(&mut b, (1, 0)), RevealResult::default());
    }

    #[test]
    fn random_flood_fills_are_complete_and_never_repeat() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..150 {
            let config = BoardConfig::new(4 + round % 9, 3 + round % 7, 0.12).unwrap();
            let mut b = Board::generate(&config, &mut rng);

            // sprinkle a few flags on safe tiles first
            for _ in 0..3 {
                let pos = (rng.gen_range(0..b.width()), rng.gen_range(0..b.height()));
                if !b[pos].is_mine() {
                    b.set_state(pos, TileState::Flagged);
                }
            }

            let zero = b
                .iter()
                .find(|(_, t)| t.state() == TileState::Hidden && !t.is_mine() && t.adjacent_mines() == 0)
                .map(|(pos, _)| pos);
            let Some(start) = zero else { continue };

            let result = reveal(&mut b, start);
            let unique: HashSet<_> = result.changed_tiles.iter().copied().collect();
            assert_eq!(unique.len(), result.changed_tiles.len());

            for &pos in &result.changed_tiles {
                assert!(!b[pos].is_mine());
                assert_eq!(b[pos].state(), TileState::Revealed);
            }

            // no hidden tile may border a revealed zero tile
            for (pos, tile) in b.iter() {
                if tile.state() == TileState::Revealed && tile.adjacent_mines() == 0 {
                    for n in b.neighbors(pos) {
                        assert_ne!(b[n].state(), TileState::Hidden, "{n:?} left hidden next to {pos:?}");
                    }
                }
            }
        }
    }
}
