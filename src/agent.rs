use crate::constants::{ANIMATION_FRAME_MS, TILE_SIZE_F};
use crate::grid::{Grid, Walker};
use crate::motion::{resolve_step, snap_to_center_tile, StepOutcome, StepRequest};
use crate::types::{Direction, Position, TilePos};

/// Position, heading and per-tick bookkeeping shared by the player and the pursuers.
#[derive(Clone, Debug)]
pub struct Agent {
    position: Position,
    tile: TilePos,
    direction: Direction,
    speed: f32,
    slowable: bool,
    invulnerable: bool,
    active: bool,
    frame_skips: u32,
    animation_ms: u32,
    animation_frame: u32,
}

impl Agent {
    pub fn new(tile: TilePos, speed: f32, slowable: bool) -> Self {
        Self {
            position: tile.origin(),
            tile,
            direction: Direction::Up,
            speed,
            slowable,
            invulnerable: false,
            active: true,
            frame_skips: 0,
            animation_ms: 0,
            animation_frame: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn tile(&self) -> TilePos {
        self.tile
    }

    /// Last committed heading; `Up` until the agent has moved.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn reset_direction(&mut self) {
        self.direction = Direction::Up;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }

    pub fn frame_skips(&self) -> u32 {
        self.frame_skips
    }

    pub fn set_frame_skips(&mut self, skips: u32) {
        self.frame_skips = skips;
    }

    pub fn animation_frame(&self) -> u32 {
        self.animation_frame
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.tile = position.tile();
    }

    pub fn place_on_tile(&mut self, tile: TilePos) {
        self.tile = tile;
        self.position = tile.origin();
    }

    /// Returns false when the agent sits this tick out, consuming a pending
    /// frame skip if there is one.
    pub fn begin_tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        if self.frame_skips > 0 {
            self.frame_skips -= 1;
            return false;
        }
        true
    }

    pub fn move_toward(
        &mut self,
        grid: &Grid,
        requested: Direction,
        elapsed_ms: u32,
        walker: Walker,
    ) -> StepOutcome {
        self.animation_ms += elapsed_ms;
        let outcome = resolve_step(
            grid,
            &StepRequest {
                position: self.position,
                tile: self.tile,
                requested,
                previous: self.direction,
                speed: self.speed,
                slowable: self.slowable,
                elapsed_ms,
                walker,
            },
        );

        if outcome.moved {
            self.set_position(outcome.position);
            self.advance_animation(outcome.direction);
        } else {
            self.set_position(snap_to_center_tile(self.position));
        }
        self.direction = outcome.direction;
        outcome
    }

    fn advance_animation(&mut self, committed: Direction) {
        if self.animation_ms <= ANIMATION_FRAME_MS {
            return;
        }
        self.animation_frame = if committed != self.direction {
            0
        } else {
            (self.animation_frame + 1) % 2
        };
        self.animation_ms = 0;
    }

    /// Carries an agent that left through a tunnel to the opposite edge.
    /// Returns true when a wrap happened.
    pub fn wrap_into_bounds(&mut self, width: i32, height: i32) -> bool {
        let span_x = (width - 2) as f32 * TILE_SIZE_F;
        let span_y = (height - 2) as f32 * TILE_SIZE_F;
        let mut wrapped = false;

        if self.tile.x <= 0 {
            self.set_position(self.position.translated(span_x, 0.0));
            wrapped = true;
        } else if self.tile.x >= width - 2 {
            self.set_position(self.position.translated(-span_x, 0.0));
            wrapped = true;
        }

        if self.tile.y <= 0 {
            self.set_position(self.position.translated(0.0, span_y));
            wrapped = true;
        } else if self.tile.y >= height - 2 {
            self.set_position(self.position.translated(0.0, -span_y));
            wrapped = true;
        }
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Tile;

    fn corridor() -> Grid {
        let mut grid = Grid::new(10, 5);
        for x in 0..10 {
            grid.set_tile(TilePos::new(x, 1), Tile::WALL);
            grid.set_tile(TilePos::new(x, 3), Tile::WALL);
        }
        grid
    }

    #[test]
    fn set_position_recomputes_tile() {
        let mut agent = Agent::new(TilePos::new(1, 1), 0.1, false);
        agent.set_position(Position::new(40.0, 70.5));
        assert_eq!(agent.tile(), TilePos::new(2, 4));
        agent.place_on_tile(TilePos::new(3, 2));
        assert_eq!(agent.position(), Position::new(48.0, 32.0));
    }

    #[test]
    fn frame_skips_consume_ticks() {
        let mut agent = Agent::new(TilePos::new(1, 1), 0.1, false);
        agent.set_frame_skips(2);
        assert!(!agent.begin_tick());
        assert!(!agent.begin_tick());
        assert!(agent.begin_tick());
        agent.set_active(false);
        assert!(!agent.begin_tick());
    }

    #[test]
    fn blocked_agent_snaps_to_center_tile() {
        let grid = corridor();
        let mut agent = Agent::new(TilePos::new(4, 2), 0.1, false);
        agent.set_position(Position::new(70.0, 32.0));
        let outcome = agent.move_toward(&grid, Direction::Up, 33, Walker::Player);
        assert!(!outcome.moved);
        assert_eq!(agent.position(), Position::new(64.0, 32.0));
        assert_eq!(agent.direction(), Direction::Up);
    }

    #[test]
    fn moving_right_advances_tile_by_tile() {
        let grid = corridor();
        let mut agent = Agent::new(TilePos::new(2, 2), 0.1, false);
        let mut last = agent.tile();
        for _ in 0..60 {
            agent.move_toward(&grid, Direction::Right, 33, Walker::Player);
            assert!(agent.tile().manhattan(last) <= 1);
            last = agent.tile();
        }
        assert!(agent.tile().x > 4);
        assert_eq!(agent.direction(), Direction::Right);
    }

    #[test]
    fn animation_toggles_while_moving_straight() {
        let grid = corridor();
        let mut agent = Agent::new(TilePos::new(8, 2), 0.1, false);
        agent.set_position(Position::new(120.0, 32.0));
        agent.move_toward(&grid, Direction::Left, 33, Walker::Player);
        let mut frames = Vec::new();
        for _ in 0..8 {
            agent.move_toward(&grid, Direction::Left, 33, Walker::Player);
            frames.push(agent.animation_frame());
        }
        assert!(frames.contains(&0));
        assert!(frames.contains(&1));
    }

    #[test]
    fn wrap_moves_agent_across_the_grid() {
        let mut agent = Agent::new(TilePos::new(0, 13), 0.1, false);
        agent.set_position(Position::new(-2.0, 208.0));
        assert!(agent.wrap_into_bounds(27, 27));
        assert_eq!(agent.tile(), TilePos::new(24, 13));

        agent.place_on_tile(TilePos::new(25, 13));
        assert!(agent.wrap_into_bounds(27, 27));
        assert_eq!(agent.tile(), TilePos::new(0, 13));

        agent.place_on_tile(TilePos::new(12, 12));
        assert!(!agent.wrap_into_bounds(27, 27));
        assert_eq!(agent.tile(), TilePos::new(12, 12));
    }
}
