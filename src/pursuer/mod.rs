//! Per-pursuer decision engine.
//!
//! `PursuerBrain` is a plain value: `decide` takes the previous committed
//! direction and returns the new direction together with the updated brain,
//! so a single tick can be replayed and inspected in isolation. External
//! signals (frighten, capture, the frightened countdown) mutate in place.

pub mod chase;
pub mod search;
pub mod state;

use serde::Serialize;
use tracing::debug;

use crate::config::SimConfig;
use crate::constants::{FRIGHTEN_BLINK_MS, FRIGHTEN_BLINK_WARNING_MS};
use crate::grid::Grid;
use crate::rng::Rng;
use crate::types::{Direction, PursuerKind, PursuerState, TilePos};

use self::chase::{ChaseInput, ChaseRule};
use self::search::{greedy_step, SearchRules, StartArea};
use self::state::{next_state, reverses_on_entry, Transition, Trigger};

/// Rounds of re-planning before the decision gives up and falls back.
const MAX_DECISION_ATTEMPTS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PursuerProfile {
    pub kind: PursuerKind,
    pub chase: ChaseRule,
    pub corner: TilePos,
    #[serde(rename = "releasePellets")]
    pub release_pellets: u32,
}

impl PursuerProfile {
    pub fn new(kind: PursuerKind, grid: &Grid, config: &SimConfig) -> Self {
        let (w, h) = (grid.width(), grid.height());
        let corner = match kind {
            PursuerKind::Blinky => TilePos::new(w - 1, 0),
            PursuerKind::Inky => TilePos::new(0, h - 1),
            PursuerKind::Pinky => TilePos::new(0, 0),
            PursuerKind::Clyde => TilePos::new(w - 1, h - 1),
        };
        Self {
            kind,
            chase: ChaseRule::for_kind(kind),
            corner,
            release_pellets: config.release_pellets(kind),
        }
    }
}

pub fn spawn_tile(kind: PursuerKind, ghost_door: TilePos) -> TilePos {
    match kind {
        PursuerKind::Blinky => ghost_door.shifted(0, -1),
        PursuerKind::Inky => ghost_door.shifted(-1, 1),
        PursuerKind::Pinky => ghost_door.shifted(0, 1),
        PursuerKind::Clyde => ghost_door.shifted(1, 1),
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timings {
    pub scatter_ms: u32,
    pub chase_ms: u32,
    pub max_phase_changes: u32,
    pub frighten_ms: u32,
    pub normal_speed: f32,
    pub frightened_speed: f32,
    pub eaten_speed: f32,
}

impl Timings {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            scatter_ms: config.scatter_ms,
            chase_ms: config.chase_ms,
            max_phase_changes: config.max_phase_changes,
            frighten_ms: config.frighten_ms,
            normal_speed: config.pursuer_speed,
            frightened_speed: config.frightened_speed,
            eaten_speed: config.eaten_speed,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrightenClock {
    pub elapsed_ms: u32,
    pub blinking: bool,
    blink_ms: u32,
    pub blink_phase: u32,
}

/// What a pursuer can see of the world when deciding.
#[derive(Clone, Copy, Debug)]
pub struct DecisionView<'a> {
    pub grid: &'a Grid,
    pub tile: TilePos,
    pub player_tile: TilePos,
    pub player_direction: Direction,
    /// Tile of the pursuer this one triangulates against, if any.
    pub partner_tile: Option<TilePos>,
    pub pellets_eaten: u32,
    pub ghost_door: TilePos,
    pub start_area: StartArea,
}

#[derive(Clone, Debug)]
pub struct Decision {
    pub direction: Direction,
    pub brain: PursuerBrain,
    pub transitions: Vec<Transition>,
}

#[derive(Clone, Copy, Debug)]
pub struct PursuerBrain {
    profile: PursuerProfile,
    timings: Timings,
    state: PursuerState,
    target: TilePos,
    next_tile: Option<TilePos>,
    phase_changes: u32,
    phase_elapsed_ms: u32,
    phase_length_ms: u32,
    frighten: FrightenClock,
}

impl PursuerBrain {
    pub fn new(profile: PursuerProfile, timings: Timings) -> Self {
        Self {
            profile,
            timings,
            state: PursuerState::Home,
            target: profile.corner,
            next_tile: None,
            phase_changes: 0,
            phase_elapsed_ms: 0,
            phase_length_ms: timings.scatter_ms,
            frighten: FrightenClock::default(),
        }
    }

    pub fn profile(&self) -> &PursuerProfile {
        &self.profile
    }

    pub fn state(&self) -> PursuerState {
        self.state
    }

    pub fn target(&self) -> TilePos {
        self.target
    }

    pub fn next_tile(&self) -> Option<TilePos> {
        self.next_tile
    }

    pub fn phase_changes(&self) -> u32 {
        self.phase_changes
    }

    pub fn frighten_clock(&self) -> FrightenClock {
        self.frighten
    }

    pub fn speed(&self) -> f32 {
        match self.state {
            PursuerState::Frightened => self.timings.frightened_speed,
            PursuerState::Eaten => self.timings.eaten_speed,
            _ => self.timings.normal_speed,
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        self.state == PursuerState::Frightened
    }

    /// Applies `trigger`; entering Chase, Scatter or Frightened aims the next
    /// step at the tile behind the pursuer.
    fn apply(
        &mut self,
        trigger: Trigger,
        tile: TilePos,
        previous: Direction,
        log: &mut Vec<Transition>,
    ) -> bool {
        let Some(to) = next_state(self.state, trigger) else {
            return false;
        };
        let transition = Transition {
            from: self.state,
            to,
            trigger,
        };
        debug!(
            pursuer = self.profile.kind.name(),
            from = ?transition.from,
            to = ?transition.to,
            trigger = ?trigger,
            "pursuer state change"
        );
        self.state = to;
        if reverses_on_entry(to) {
            self.next_tile = Some(tile.offset(previous.opposite()));
        }
        log.push(transition);
        true
    }

    pub fn frighten(&mut self, tile: TilePos, previous: Direction) -> Option<Transition> {
        let mut log = Vec::new();
        self.apply(Trigger::Frighten, tile, previous, &mut log);
        log.pop()
    }

    /// The player caught this pursuer while it was vulnerable.
    pub fn capture(&mut self, tile: TilePos, previous: Direction) -> Option<Transition> {
        if !self.is_vulnerable() {
            return None;
        }
        let mut log = Vec::new();
        if self.apply(Trigger::Captured, tile, previous, &mut log) {
            self.frighten = FrightenClock::default();
        }
        log.pop()
    }

    /// Runs the frightened countdown and blink; returns the expiry transition.
    pub fn advance_frighten(
        &mut self,
        elapsed_ms: u32,
        tile: TilePos,
        previous: Direction,
    ) -> Option<Transition> {
        if self.state != PursuerState::Frightened {
            return None;
        }
        let clock = &mut self.frighten;
        if clock.blinking {
            clock.blink_ms += elapsed_ms;
            if clock.blink_ms > FRIGHTEN_BLINK_MS {
                clock.blink_ms = 0;
                clock.blink_phase = (clock.blink_phase + 1) % 2;
            }
        }

        clock.elapsed_ms += elapsed_ms;
        let limit = self.timings.frighten_ms;
        if clock.elapsed_ms > limit {
            self.frighten = FrightenClock::default();
            let mut log = Vec::new();
            self.apply(Trigger::FrightenExpired, tile, previous, &mut log);
            return log.pop();
        }
        if limit - clock.elapsed_ms < FRIGHTEN_BLINK_WARNING_MS {
            clock.blinking = true;
        }
        None
    }

    pub fn decide(
        &self,
        view: &DecisionView<'_>,
        previous: Direction,
        elapsed_ms: u32,
        rng: &mut Rng,
    ) -> Decision {
        let mut brain = *self;
        let mut transitions = Vec::new();
        let direction = brain.decide_in_place(view, previous, elapsed_ms, rng, &mut transitions);
        Decision {
            direction,
            brain,
            transitions,
        }
    }

    fn decide_in_place(
        &mut self,
        view: &DecisionView<'_>,
        previous: Direction,
        elapsed_ms: u32,
        rng: &mut Rng,
        log: &mut Vec<Transition>,
    ) -> Direction {
        self.advance_phase(elapsed_ms, view.tile, previous, log);

        if self.state == PursuerState::Home {
            self.target = view.tile;
            if view.pellets_eaten >= self.profile.release_pellets {
                self.apply(Trigger::PelletsReached, view.tile, previous, log);
            }
            return Direction::Up;
        }

        if !view.grid.in_playable_region(view.tile) {
            self.next_tile = None;
            return previous;
        }

        for _ in 0..MAX_DECISION_ATTEMPTS {
            if self.next_tile.is_none() {
                self.plan(view, previous, rng, log);
            }
            let Some(next) = self.next_tile else {
                continue;
            };
            if view.grid.is_wall(next) || next == view.tile {
                self.next_tile = None;
                continue;
            }
            return direction_toward(view.tile, next, previous);
        }

        // Nothing usable came out of planning; take any open neighbour.
        match greedy_step(
            view.grid,
            view.tile,
            self.target,
            previous,
            SearchRules::UNRESTRICTED,
            &view.start_area,
        ) {
            Some(dir) => {
                self.next_tile = Some(view.tile.offset(dir));
                dir
            }
            None => previous,
        }
    }

    fn advance_phase(
        &mut self,
        elapsed_ms: u32,
        tile: TilePos,
        previous: Direction,
        log: &mut Vec<Transition>,
    ) {
        let roaming = matches!(self.state, PursuerState::Chase | PursuerState::Scatter);
        if !roaming || self.phase_changes > self.timings.max_phase_changes {
            return;
        }
        self.phase_elapsed_ms += elapsed_ms;
        if self.phase_elapsed_ms <= self.phase_length_ms {
            return;
        }
        self.phase_elapsed_ms = 0;
        if self.apply(Trigger::PhaseElapsed, tile, previous, log) {
            self.phase_changes += 1;
            self.phase_length_ms = match self.state {
                PursuerState::Chase => self.timings.chase_ms,
                _ => self.timings.scatter_ms,
            };
        }
    }

    fn chase_input(&self, view: &DecisionView<'_>) -> ChaseInput {
        ChaseInput {
            player_tile: view.player_tile,
            player_direction: view.player_direction,
            self_tile: view.tile,
            partner_tile: view.partner_tile,
            corner: self.profile.corner,
        }
    }

    fn target_for_state(&self, view: &DecisionView<'_>) -> TilePos {
        match self.state {
            PursuerState::Home => view.tile,
            PursuerState::LeavingHome => view.ghost_door.shifted(0, -1),
            PursuerState::Scatter | PursuerState::Frightened => self.profile.corner,
            PursuerState::Chase => self.profile.chase.target(&self.chase_input(view)),
            PursuerState::Eaten => view.ghost_door.shifted(0, 1),
        }
    }

    fn search(&mut self, view: &DecisionView<'_>, previous: Direction, rules: SearchRules) {
        let step = greedy_step(view.grid, view.tile, self.target, previous, rules, &view.start_area)
            .or_else(|| {
                greedy_step(
                    view.grid,
                    view.tile,
                    self.target,
                    previous,
                    SearchRules::UNRESTRICTED,
                    &view.start_area,
                )
            });
        if let Some(dir) = step {
            self.next_tile = Some(view.tile.offset(dir));
        }
    }

    fn plan(
        &mut self,
        view: &DecisionView<'_>,
        previous: Direction,
        rng: &mut Rng,
        log: &mut Vec<Transition>,
    ) {
        self.target = self.target_for_state(view);
        match self.state {
            PursuerState::Home => {}
            PursuerState::LeavingHome => {
                if view.tile == self.target {
                    self.apply(Trigger::ReachedGate, view.tile, previous, log);
                }
                // Still steering for the gate tile this round.
                self.search(view, previous, SearchRules::UNRESTRICTED);
            }
            PursuerState::Eaten => {
                if view.tile == self.target {
                    self.apply(Trigger::ReachedHome, view.tile, previous, log);
                    return;
                }
                self.search(view, previous, SearchRules::EATEN);
            }
            PursuerState::Chase | PursuerState::Scatter => {
                self.search(view, previous, SearchRules::DEFAULT);
            }
            PursuerState::Frightened => {
                let dir = frightened_draw(previous, rng);
                self.next_tile = Some(view.tile.offset(dir));
            }
        }
    }
}

/// The three headings that are not a U-turn from `previous`.
pub fn non_reversing(previous: Direction) -> [Direction; 3] {
    let back = previous.opposite();
    let mut out = [previous; 3];
    let mut i = 0;
    for dir in Direction::ALL {
        if dir != back && i < out.len() {
            out[i] = dir;
            i += 1;
        }
    }
    out
}

/// Uniform pick among the non-reversing headings. Walls are not consulted.
pub fn frightened_draw(previous: Direction, rng: &mut Rng) -> Direction {
    let options = non_reversing(previous);
    rng.pick(&options).unwrap_or(previous)
}

/// Heading from `from` toward `to`, checked above, left, below, right.
pub fn direction_toward(from: TilePos, to: TilePos, fallback: Direction) -> Direction {
    if to.y < from.y {
        Direction::Up
    } else if to.x < from.x {
        Direction::Left
    } else if to.y > from.y {
        Direction::Down
    } else if to.x > from.x {
        Direction::Right
    } else {
        fallback
    }
}
