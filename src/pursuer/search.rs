use crate::grid::Grid;
use crate::types::{Direction, TilePos};

/// Neighbours are scanned in this order and a later entry replaces the pick
/// on equal distance, so the effective priority on ties is Up > Left > Down > Right.
pub const SCAN_ORDER: [Direction; 4] = [
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::Up,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchRules {
    pub forbid_reversal: bool,
    /// Block Up and Down while standing in the start area.
    pub home_exclusion: bool,
}

impl SearchRules {
    /// Chase and Scatter.
    pub const DEFAULT: SearchRules = SearchRules {
        forbid_reversal: true,
        home_exclusion: true,
    };

    pub const EATEN: SearchRules = SearchRules {
        forbid_reversal: true,
        home_exclusion: false,
    };

    /// LeavingHome, and the retry pass when nothing else is eligible.
    pub const UNRESTRICTED: SearchRules = SearchRules {
        forbid_reversal: false,
        home_exclusion: false,
    };
}

/// The row above the gate and the player's spawn row, three tiles wide each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartArea {
    pub ghost_door: TilePos,
    pub player_start: TilePos,
}

impl StartArea {
    pub fn contains(&self, tile: TilePos) -> bool {
        let above_gate =
            (tile.x - self.ghost_door.x).abs() <= 1 && tile.y == self.ghost_door.y - 1;
        let spawn_row =
            (tile.x - self.player_start.x).abs() <= 1 && tile.y == self.player_start.y;
        above_gate || spawn_row
    }
}

/// One greedy step: the open neighbour of `from` closest to `target`.
/// Returns `None` when every neighbour is ruled out.
pub fn greedy_step(
    grid: &Grid,
    from: TilePos,
    target: TilePos,
    previous: Direction,
    rules: SearchRules,
    start_area: &StartArea,
) -> Option<Direction> {
    let in_start_area = rules.home_exclusion && start_area.contains(from);
    let mut best: Option<(Direction, i32)> = None;

    for dir in SCAN_ORDER {
        let neighbour = from.offset(dir);
        if grid.is_wall(neighbour) {
            continue;
        }
        if rules.forbid_reversal && dir == previous.opposite() {
            continue;
        }
        if in_start_area && dir.is_vertical() {
            continue;
        }
        let distance = neighbour.manhattan(target);
        let replace = match best {
            None => true,
            Some((_, best_distance)) => distance <= best_distance,
        };
        if replace {
            best = Some((dir, distance));
        }
    }
    best.map(|(dir, _)| dir)
}
