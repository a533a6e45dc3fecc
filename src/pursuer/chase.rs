use serde::Serialize;

use crate::constants::{AMBUSH_LOOKAHEAD, FLANK_LOOKAHEAD, SHY_DISTANCE};
use crate::types::{Direction, PursuerKind, TilePos};

/// How a pursuer picks its destination while chasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaseRule {
    Aggressive,
    Ambush,
    Flank,
    Shy,
}

impl ChaseRule {
    pub fn for_kind(kind: PursuerKind) -> Self {
        match kind {
            PursuerKind::Blinky => Self::Aggressive,
            PursuerKind::Pinky => Self::Ambush,
            PursuerKind::Inky => Self::Flank,
            PursuerKind::Clyde => Self::Shy,
        }
    }

    pub fn target(self, input: &ChaseInput) -> TilePos {
        match self {
            Self::Aggressive => aggressive(input.player_tile),
            Self::Ambush => ambush(input.player_tile, input.player_direction),
            Self::Flank => flank(input.player_tile, input.player_direction, input.partner_tile),
            Self::Shy => shy(input.self_tile, input.player_tile, input.corner),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChaseInput {
    pub player_tile: TilePos,
    pub player_direction: Direction,
    pub self_tile: TilePos,
    pub partner_tile: Option<TilePos>,
    pub corner: TilePos,
}

/// Tile `distance` steps ahead of the player. Facing up also shifts left by
/// the same amount, like the arcade overflow bug.
pub fn ahead_of(player: TilePos, dir: Direction, distance: i32) -> TilePos {
    match dir {
        Direction::Up => player.shifted(-distance, -distance),
        Direction::Down => player.shifted(0, distance),
        Direction::Left => player.shifted(-distance, 0),
        Direction::Right => player.shifted(distance, 0),
    }
}

pub fn aggressive(player: TilePos) -> TilePos {
    player
}

pub fn ambush(player: TilePos, dir: Direction) -> TilePos {
    ahead_of(player, dir, AMBUSH_LOOKAHEAD)
}

pub fn flank(player: TilePos, dir: Direction, partner: Option<TilePos>) -> TilePos {
    let pivot = ahead_of(player, dir, FLANK_LOOKAHEAD);
    match partner {
        Some(partner) => pivot.shifted(pivot.x - partner.x, pivot.y - partner.y),
        None => pivot,
    }
}

pub fn shy(self_tile: TilePos, player: TilePos, corner: TilePos) -> TilePos {
    if self_tile.manhattan(player) < SHY_DISTANCE {
        corner
    } else {
        player
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambush_looks_four_tiles_ahead() {
        let player = TilePos::new(10, 10);
        assert_eq!(ambush(player, Direction::Right), TilePos::new(14, 10));
        assert_eq!(ambush(player, Direction::Down), TilePos::new(10, 14));
        assert_eq!(ambush(player, Direction::Left), TilePos::new(6, 10));
        assert_eq!(ambush(player, Direction::Up), TilePos::new(6, 6));
    }

    #[test]
    fn flank_doubles_vector_from_partner() {
        let player = TilePos::new(10, 10);
        let partner = TilePos::new(8, 12);
        // pivot (12, 10), partner -> pivot is (4, -2)
        assert_eq!(
            flank(player, Direction::Right, Some(partner)),
            TilePos::new(16, 8)
        );
        assert_eq!(flank(player, Direction::Up, None), TilePos::new(8, 8));
    }

    #[test]
    fn shy_retreats_when_close() {
        let corner = TilePos::new(26, 26);
        let player = TilePos::new(10, 10);
        assert_eq!(shy(TilePos::new(13, 14), player, corner), corner);
        assert_eq!(shy(TilePos::new(14, 14), player, corner), player);
    }

    #[test]
    fn rule_dispatch_matches_kind() {
        let input = ChaseInput {
            player_tile: TilePos::new(5, 5),
            player_direction: Direction::Left,
            self_tile: TilePos::new(20, 20),
            partner_tile: Some(TilePos::new(5, 7)),
            corner: TilePos::new(0, 0),
        };
        assert_eq!(ChaseRule::for_kind(PursuerKind::Blinky).target(&input), TilePos::new(5, 5));
        assert_eq!(ChaseRule::for_kind(PursuerKind::Pinky).target(&input), TilePos::new(1, 5));
        assert_eq!(ChaseRule::for_kind(PursuerKind::Inky).target(&input), TilePos::new(1, 3));
        assert_eq!(ChaseRule::for_kind(PursuerKind::Clyde).target(&input), TilePos::new(5, 5));
    }
}
