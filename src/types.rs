use serde::Serialize;

use crate::constants::TILE_SIZE;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Integer cell coordinate on the maze grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn shifted(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: TilePos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Top-left corner of this tile in sub-tile units.
    pub fn origin(self) -> Position {
        Position::new((self.x * TILE_SIZE) as f32, (self.y * TILE_SIZE) as f32)
    }
}

/// Continuous position in sub-tile units (top-left corner of an agent's box).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn tile(self) -> TilePos {
        let size = TILE_SIZE as f32;
        TilePos::new((self.x / size).floor() as i32, (self.y / size).floor() as i32)
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerState {
    Home,
    LeavingHome,
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

impl PursuerState {
    pub const ALL: [PursuerState; 6] = [
        PursuerState::Home,
        PursuerState::LeavingHome,
        PursuerState::Scatter,
        PursuerState::Chase,
        PursuerState::Frightened,
        PursuerState::Eaten,
    ];

    /// States allowed to pass through the ghost door.
    pub fn may_cross_door(self) -> bool {
        matches!(self, Self::LeavingHome | Self::Eaten)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerKind {
    Blinky,
    Inky,
    Pinky,
    Clyde,
}

impl PursuerKind {
    /// Registration order. Inky reads Blinky's tile, so Blinky must update first.
    pub const ROSTER: [PursuerKind; 4] = [
        PursuerKind::Blinky,
        PursuerKind::Inky,
        PursuerKind::Pinky,
        PursuerKind::Clyde,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Blinky => "blinky",
            Self::Inky => "inky",
            Self::Pinky => "pinky",
            Self::Clyde => "clyde",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Ready,
    Playing,
    Paused,
    LevelComplete,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub tile: TilePos,
    pub dir: Direction,
    pub dying: bool,
    pub invulnerable: bool,
    #[serde(rename = "animationFrame")]
    pub animation_frame: u32,
    #[serde(rename = "deathFrame")]
    pub death_frame: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub kind: PursuerKind,
    pub x: f32,
    pub y: f32,
    pub tile: TilePos,
    pub dir: Direction,
    pub state: PursuerState,
    pub active: bool,
    pub blinking: bool,
    #[serde(rename = "blinkPhase")]
    pub blink_phase: u32,
    #[serde(rename = "targetTile")]
    pub target_tile: TilePos,
    #[serde(rename = "nextTile")]
    pub next_tile: Option<TilePos>,
    #[serde(rename = "animationFrame")]
    pub animation_frame: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
        power: bool,
    },
    PursuersFrightened,
    PursuerEaten {
        kind: PursuerKind,
        score: u32,
    },
    PlayerDied,
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: i32,
    },
    LevelComplete,
    GameOver,
    PursuerStateChanged {
        kind: PursuerKind,
        from: PursuerState,
        to: PursuerState,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    pub phase: SessionPhase,
    pub score: u32,
    pub lives: i32,
    #[serde(rename = "remainingPellets")]
    pub remaining_pellets: usize,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub events: Vec<RuntimeEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn position_tile_floors_negative_coordinates() {
        assert_eq!(Position::new(15.9, 16.0).tile(), TilePos::new(0, 1));
        assert_eq!(Position::new(-0.5, 3.0).tile(), TilePos::new(-1, 0));
    }

    #[test]
    fn tile_origin_round_trips_through_position() {
        let tile = TilePos::new(13, 19);
        assert_eq!(tile.origin().tile(), tile);
        assert_eq!(tile.origin(), Position::new(208.0, 304.0));
    }
}
