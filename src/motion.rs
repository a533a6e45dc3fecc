//! Continuous motion against the tile grid.
//!
//! A step integrates speed along the requested direction, probes just past the
//! leading edge of the 16x16 agent box and rejects the step when the probed
//! tile is blocked or more than one tile away. A rejected request is retried
//! with the previous heading; a second rejection leaves the agent in place.

use crate::constants::{
    HALF_TILE_F, PROBE_DOWN, PROBE_LEFT, PROBE_RIGHT, PROBE_UP, SLOW_TILE_FACTOR, TILE_SIZE_F,
};
use crate::grid::{Grid, Walker};
use crate::types::{Direction, Position, TilePos};

#[derive(Clone, Copy, Debug)]
pub struct StepRequest {
    pub position: Position,
    /// Tile stored on the agent; the no-skip check measures against it.
    pub tile: TilePos,
    pub requested: Direction,
    pub previous: Direction,
    pub speed: f32,
    pub slowable: bool,
    pub elapsed_ms: u32,
    pub walker: Walker,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub position: Position,
    pub direction: Direction,
    pub moved: bool,
}

pub fn probe_offset(dir: Direction) -> (f32, f32) {
    match dir {
        Direction::Up => PROBE_UP,
        Direction::Down => PROBE_DOWN,
        Direction::Left => PROBE_LEFT,
        Direction::Right => PROBE_RIGHT,
    }
}

pub fn probe_point(candidate: Position, dir: Direction) -> Position {
    let (dx, dy) = probe_offset(dir);
    candidate.translated(dx, dy)
}

pub fn effective_speed(grid: &Grid, position: Position, base: f32, slowable: bool) -> f32 {
    if slowable && grid.is_slow(position.tile()) {
        base * SLOW_TILE_FACTOR
    } else {
        base
    }
}

pub fn advance(position: Position, dir: Direction, distance: f32) -> Position {
    let (dx, dy) = dir.delta();
    position.translated(dx as f32 * distance, dy as f32 * distance)
}

/// Tile containing the centre of the agent box, expressed as its origin.
pub fn snap_to_center_tile(position: Position) -> Position {
    position.translated(HALF_TILE_F, HALF_TILE_F).tile().origin()
}

struct Attempt {
    candidate: Position,
    probe_tile: TilePos,
}

fn attempt(grid: &Grid, req: &StepRequest, dir: Direction) -> Option<Attempt> {
    let speed = effective_speed(grid, req.position, req.speed, req.slowable);
    let candidate = advance(req.position, dir, speed * req.elapsed_ms as f32);
    let probe_tile = probe_point(candidate, dir).tile();
    if !grid.is_walkable_at(probe_tile, req.walker) || req.tile.manhattan(probe_tile) > 1 {
        return None;
    }
    Some(Attempt {
        candidate,
        probe_tile,
    })
}

pub fn resolve_step(grid: &Grid, req: &StepRequest) -> StepOutcome {
    let (direction, accepted) = match attempt(grid, req, req.requested) {
        Some(found) => (req.requested, Some(found)),
        None => (req.previous, attempt(grid, req, req.previous)),
    };

    let Some(Attempt {
        candidate,
        probe_tile,
    }) = accepted
    else {
        return StepOutcome {
            position: req.position,
            direction,
            moved: false,
        };
    };

    if candidate == req.position {
        return StepOutcome {
            position: req.position,
            direction,
            moved: false,
        };
    }

    // Lock the off-axis coordinate to the corridor of the probed tile.
    let mut position = candidate;
    if direction.is_vertical() {
        position.x = probe_tile.x as f32 * TILE_SIZE_F;
    } else {
        position.y = probe_tile.y as f32 * TILE_SIZE_F;
    }

    StepOutcome {
        position,
        direction,
        moved: true,
    }
}
