use std::collections::BTreeSet;

use tracing::info;

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::LayoutError;
use crate::grid::{classic_maze, parse_layout, Grid, ParsedMaze, Walker};
use crate::pursuer::search::StartArea;
use crate::pursuer::state::Transition;
use crate::pursuer::{spawn_tile, DecisionView, PursuerBrain, PursuerProfile, Timings};
use crate::rng::Rng;
use crate::types::{
    Direction, PlayerView, PursuerKind, PursuerView, RuntimeEvent, SessionPhase, Snapshot,
    TilePos,
};

mod player_system;
mod pursuer_system;
mod utils;

use self::utils::{frame_skips_for, partner_of, pellet_score};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitAction {
    Resume,
    FinishLevel,
}

#[derive(Clone, Copy, Debug)]
struct PendingWait {
    elapsed_ms: u32,
    length_ms: u32,
    action: WaitAction,
}

#[derive(Clone, Copy, Debug)]
struct DeathClock {
    elapsed_ms: i32,
    frame: u32,
}

impl Default for DeathClock {
    fn default() -> Self {
        Self {
            elapsed_ms: crate::constants::DEATH_LEAD_IN_MS,
            frame: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    agent: Agent,
    input: Option<Direction>,
    dying: bool,
    death: DeathClock,
}

#[derive(Clone, Debug)]
struct PursuerInternal {
    agent: Agent,
    brain: PursuerBrain,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: SimConfig,

    grid: Grid,
    ghost_door: TilePos,
    player_start: TilePos,
    pellets: BTreeSet<TilePos>,
    power_pellets: BTreeSet<TilePos>,
    pellet_baseline: usize,

    rng: Rng,
    player: PlayerInternal,
    pursuers: Vec<PursuerInternal>,
    events: Vec<RuntimeEvent>,

    score: u32,
    lives: i32,
    ready: bool,
    ready_elapsed_ms: u32,
    wait: Option<PendingWait>,
    level_complete: bool,
    finished: bool,
    game_over: bool,
    elapsed_ms: u64,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(config: SimConfig, seed: u32) -> Result<Self, LayoutError> {
        Ok(Self::from_maze(classic_maze()?, config, seed))
    }

    pub fn with_layout<S: AsRef<str>>(
        rows: &[S],
        config: SimConfig,
        seed: u32,
    ) -> Result<Self, LayoutError> {
        Ok(Self::from_maze(parse_layout(rows)?, config, seed))
    }

    fn from_maze(maze: ParsedMaze, config: SimConfig, seed: u32) -> Self {
        let ParsedMaze {
            grid,
            pellets,
            power_pellets,
            ghost_door,
            player_start,
        } = maze;

        let mut player_agent = Agent::new(player_start, config.player_speed, false);
        player_agent.set_invulnerable(config.god_mode);

        let mut engine = Self {
            pellet_baseline: pellets.len() + power_pellets.len(),
            lives: config.starting_lives,
            config,
            grid,
            ghost_door,
            player_start,
            pellets,
            power_pellets,
            rng: Rng::new(seed),
            player: PlayerInternal {
                agent: player_agent,
                input: None,
                dying: false,
                death: DeathClock::default(),
            },
            pursuers: Vec::new(),
            events: Vec::new(),
            score: 0,
            ready: false,
            ready_elapsed_ms: 0,
            wait: None,
            level_complete: false,
            finished: false,
            game_over: false,
            elapsed_ms: 0,
            tick_counter: 0,
        };
        engine.spawn_pursuers();
        engine
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ghost_door(&self) -> TilePos {
        self.ghost_door
    }

    pub fn player_start(&self) -> TilePos {
        self.player_start
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn is_ended(&self) -> bool {
        self.finished || self.game_over
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_level_finished(&self) -> bool {
        self.finished
    }

    pub fn remaining_pellets(&self) -> usize {
        self.pellets.len() + self.power_pellets.len()
    }

    /// Pellets eaten since the level started or the player last respawned.
    pub fn pellets_eaten(&self) -> u32 {
        self.pellet_baseline.saturating_sub(self.remaining_pellets()) as u32
    }

    pub fn pellet_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.pellets.iter().chain(self.power_pellets.iter()).copied()
    }

    pub fn player_tile(&self) -> TilePos {
        self.player.agent.tile()
    }

    pub fn player_direction(&self) -> Direction {
        self.player.agent.direction()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.game_over {
            SessionPhase::GameOver
        } else if self.finished {
            SessionPhase::LevelComplete
        } else if !self.ready {
            SessionPhase::Ready
        } else if self.wait.is_some() {
            SessionPhase::Paused
        } else {
            SessionPhase::Playing
        }
    }

    /// `None` keeps the player on its last committed heading.
    pub fn set_player_input(&mut self, dir: Option<Direction>) {
        self.player.input = dir;
    }

    pub fn increase_score(&mut self, amount: u32) {
        self.score = self.score.saturating_add(amount);
    }

    /// Single-shot pause of gameplay updates; a later call replaces it.
    pub fn set_wait(&mut self, length_ms: u32, action: WaitAction) {
        self.wait = Some(PendingWait {
            elapsed_ms: 0,
            length_ms,
            action,
        });
    }

    /// Removes and scores the pellet on `tile`. Returns whether it was a power pellet.
    pub fn remove_pellet_at(&mut self, tile: TilePos) -> Option<bool> {
        let power = if self.power_pellets.remove(&tile) {
            true
        } else if self.pellets.remove(&tile) {
            false
        } else {
            return None;
        };
        self.increase_score(pellet_score(power));
        self.events.push(RuntimeEvent::PelletEaten {
            x: tile.x,
            y: tile.y,
            power,
        });
        Some(power)
    }

    pub fn frighten_all_pursuers(&mut self) {
        self.events.push(RuntimeEvent::PursuersFrightened);
        for idx in 0..self.pursuers.len() {
            let tile = self.pursuers[idx].agent.tile();
            let dir = self.pursuers[idx].agent.direction();
            if let Some(transition) = self.pursuers[idx].brain.frighten(tile, dir) {
                self.record_transition(idx, transition);
            }
        }
    }

    pub fn lose_life(&mut self) {
        self.lives -= 1;
        info!(lives_left = self.lives, "life lost");
        self.events.push(RuntimeEvent::LifeLost {
            lives_left: self.lives,
        });
        if self.lives < 0 && !self.game_over {
            self.game_over = true;
            info!(score = self.score, ticks = self.tick_counter, "game over");
            self.events.push(RuntimeEvent::GameOver);
        }
    }

    pub fn step(&mut self, elapsed_ms: u32) {
        if self.is_ended() {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms as u64);

        if !self.ready {
            self.ready_elapsed_ms += elapsed_ms;
            if self.ready_elapsed_ms > self.config.ready_delay_ms {
                self.ready_elapsed_ms = 0;
                self.ready = true;
            }
            return;
        }

        if self.wait.is_some() {
            self.advance_wait(elapsed_ms);
            return;
        }

        self.process_frame(elapsed_ms);
    }

    fn advance_wait(&mut self, elapsed_ms: u32) {
        let Some(wait) = self.wait.as_mut() else {
            return;
        };
        wait.elapsed_ms += elapsed_ms;
        if wait.elapsed_ms <= wait.length_ms {
            return;
        }
        let action = wait.action;
        self.wait = None;
        if action == WaitAction::FinishLevel {
            self.finished = true;
        }
    }

    fn process_frame(&mut self, elapsed_ms: u32) {
        if self.remaining_pellets() == 0 {
            if !self.level_complete {
                self.level_complete = true;
                info!(score = self.score, ticks = self.tick_counter, "level complete");
                self.events.push(RuntimeEvent::LevelComplete);
            }
            // Re-armed every frame, a capture pause may have replaced it.
            self.set_wait(self.config.level_clear_pause_ms, WaitAction::FinishLevel);
        }

        if self.update_player(elapsed_ms) {
            return;
        }
        let (width, height) = (self.grid.width(), self.grid.height());
        self.player.agent.wrap_into_bounds(width, height);

        for idx in 0..self.pursuers.len() {
            self.update_pursuer(idx, elapsed_ms);
            self.pursuers[idx].agent.wrap_into_bounds(width, height);
        }
    }

    fn record_transition(&mut self, idx: usize, transition: Transition) {
        let kind = self.pursuers[idx].brain.profile().kind;
        self.events.push(RuntimeEvent::PursuerStateChanged {
            kind,
            from: transition.from,
            to: transition.to,
        });
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let agent = &self.player.agent;
        let position = agent.position();
        let player = PlayerView {
            x: position.x,
            y: position.y,
            tile: agent.tile(),
            dir: agent.direction(),
            dying: self.player.dying,
            invulnerable: agent.is_invulnerable(),
            animation_frame: agent.animation_frame(),
            death_frame: self.player.dying.then_some(self.player.death.frame),
        };
        let pursuers = self
            .pursuers
            .iter()
            .map(|p| {
                let position = p.agent.position();
                let clock = p.brain.frighten_clock();
                PursuerView {
                    kind: p.brain.profile().kind,
                    x: position.x,
                    y: position.y,
                    tile: p.agent.tile(),
                    dir: p.agent.direction(),
                    state: p.brain.state(),
                    active: p.agent.is_active(),
                    blinking: clock.blinking,
                    blink_phase: clock.blink_phase,
                    target_tile: p.brain.target(),
                    next_tile: p.brain.next_tile(),
                    animation_frame: p.agent.animation_frame(),
                }
            })
            .collect();

        let snapshot = Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.elapsed_ms,
            phase: self.phase(),
            score: self.score,
            lives: self.lives,
            remaining_pellets: self.remaining_pellets(),
            pellets_eaten: self.pellets_eaten(),
            player,
            pursuers,
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimConfig;
    use crate::constants::TICK_MS;
    use crate::engine::{GameEngine, WaitAction};
    use crate::error::LayoutError;
    use crate::pursuer::spawn_tile;
    use crate::types::{Direction, PursuerKind, PursuerState, RuntimeEvent, SessionPhase, TilePos};

    fn engine(seed: u32) -> GameEngine {
        GameEngine::new(SimConfig::default(), seed).expect("classic maze builds")
    }

    fn step_until_ready(engine: &mut GameEngine) {
        for _ in 0..100 {
            if engine.phase() != SessionPhase::Ready {
                return;
            }
            engine.step(TICK_MS);
        }
        panic!("engine never became ready");
    }

    fn step_until_scatter(engine: &mut GameEngine, idx: usize) {
        for _ in 0..20 {
            if engine.pursuers[idx].brain.state() == PursuerState::Scatter {
                return;
            }
            engine.step(TICK_MS);
        }
        panic!("pursuer {idx} never reached scatter");
    }

    #[test]
    fn new_engine_places_agents_on_spawn_tiles() {
        let engine = engine(1);
        assert_eq!(engine.player_tile(), TilePos::new(13, 19));
        assert_eq!(engine.remaining_pellets(), 190);
        assert_eq!(engine.pellets_eaten(), 0);
        let kinds: Vec<PursuerKind> = engine
            .pursuers
            .iter()
            .map(|p| p.brain.profile().kind)
            .collect();
        assert_eq!(kinds, PursuerKind::ROSTER.to_vec());
        assert_eq!(engine.pursuers[0].agent.tile(), TilePos::new(13, 11));
        assert_eq!(engine.pursuers[1].agent.tile(), TilePos::new(12, 13));
        assert_eq!(engine.pursuers[2].agent.tile(), TilePos::new(13, 13));
        assert_eq!(engine.pursuers[3].agent.tile(), TilePos::new(14, 13));
        assert!(engine
            .pursuers
            .iter()
            .all(|p| p.brain.state() == PursuerState::Home));
    }

    #[test]
    fn ready_delay_holds_everything_still() {
        let mut engine = engine(2);
        engine.set_player_input(Some(Direction::Left));
        let start = engine.player.agent.position();
        for _ in 0..30 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.phase(), SessionPhase::Ready);
        assert_eq!(engine.player.agent.position(), start);
        step_until_ready(&mut engine);
        engine.step(TICK_MS);
        assert_ne!(engine.player.agent.position(), start);
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = engine(424_242);
        let mut b = engine(424_242);
        let inputs = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];
        for tick in 0..1_500 {
            let input = inputs[(tick / 90) % inputs.len()];
            a.set_player_input(Some(input));
            b.set_player_input(Some(input));
            a.step(TICK_MS);
            b.step(TICK_MS);
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lives, sb.lives);
            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.y.to_bits(), sb.player.y.to_bits());
            for (pa, pb) in sa.pursuers.iter().zip(sb.pursuers.iter()) {
                assert_eq!(pa.x.to_bits(), pb.x.to_bits());
                assert_eq!(pa.y.to_bits(), pb.y.to_bits());
                assert_eq!(pa.state, pb.state);
            }
            assert_eq!(sa.events, sb.events);
            if a.is_ended() || b.is_ended() {
                assert_eq!(a.is_ended(), b.is_ended());
                break;
            }
        }
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = engine(3);
        engine.events.push(RuntimeEvent::PlayerDied);
        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert!(second.events.is_empty());
    }

    #[test]
    fn eating_a_pellet_scores_and_skips_a_frame() {
        let mut engine = engine(4);
        engine.set_player_input(Some(Direction::Left));
        step_until_ready(&mut engine);
        for _ in 0..40 {
            engine.step(TICK_MS);
            if engine.score() > 0 {
                break;
            }
        }
        assert_eq!(engine.score(), 10);
        assert_eq!(engine.pellets_eaten(), 1);
        assert_eq!(engine.player.agent.frame_skips(), 1);
        let snapshot = engine.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|e| matches!(e, RuntimeEvent::PelletEaten { x: 12, y: 19, power: false })));
    }

    #[test]
    fn power_pellet_frightens_roaming_pursuers() {
        let mut engine = engine(5);
        step_until_ready(&mut engine);
        step_until_scatter(&mut engine, 0);
        engine.player.agent.place_on_tile(TilePos::new(3, 19));
        engine.step(TICK_MS);
        assert_eq!(engine.score(), 50);
        assert_eq!(engine.player.agent.frame_skips(), 3);
        assert_eq!(engine.pursuers[0].brain.state(), PursuerState::Frightened);
        // Still penned pursuers ignore the signal.
        assert_eq!(engine.pursuers[3].brain.state(), PursuerState::Home);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PursuersFrightened));
    }

    #[test]
    fn catching_a_frightened_pursuer_scores_and_pauses() {
        let mut engine = engine(6);
        step_until_ready(&mut engine);
        step_until_scatter(&mut engine, 0);
        engine.frighten_all_pursuers();
        let player_tile = engine.player_tile();
        engine.pursuers[0].agent.place_on_tile(player_tile);
        engine.step(TICK_MS);

        assert_eq!(engine.pursuers[0].brain.state(), PursuerState::Eaten);
        assert!(engine.pursuers[0].agent.is_invulnerable());
        assert_eq!(engine.score(), 200);
        assert_eq!(engine.phase(), SessionPhase::Paused);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PursuerEaten {
            kind: PursuerKind::Blinky,
            score: 200
        }));
    }

    #[test]
    fn caught_player_dies_and_respawns() {
        let mut engine = engine(7);
        step_until_ready(&mut engine);
        step_until_scatter(&mut engine, 0);
        let player_tile = engine.player_tile();
        engine.pursuers[0].agent.place_on_tile(player_tile);
        engine.step(TICK_MS);

        assert!(engine.player.dying);
        assert!(engine.pursuers.iter().all(|p| !p.agent.is_active()));
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PlayerDied));

        for _ in 0..120 {
            engine.step(TICK_MS);
            if !engine.player.dying {
                break;
            }
        }
        assert!(!engine.player.dying);
        assert_eq!(engine.lives(), 1);
        assert_eq!(engine.player_tile(), engine.player_start());
        assert_eq!(engine.player_direction(), Direction::Up);
        assert_eq!(engine.phase(), SessionPhase::Ready);
        assert!(engine
            .pursuers
            .iter()
            .all(|p| p.agent.is_active() && p.brain.state() == PursuerState::Home));
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::LifeLost { lives_left: 1 }));
    }

    #[test]
    fn last_life_lost_ends_the_game() {
        let mut engine = engine(8);
        engine.lives = 0;
        engine.lose_life();
        assert!(engine.is_game_over());
        assert!(engine.is_ended());
        let ticks = engine.tick_counter();
        engine.step(TICK_MS);
        assert_eq!(engine.tick_counter(), ticks);
        let events = engine.build_snapshot(true).events;
        assert_eq!(events.last(), Some(&RuntimeEvent::GameOver));
    }

    #[test]
    fn god_mode_player_survives_contact() {
        let config = SimConfig {
            god_mode: true,
            ..SimConfig::default()
        };
        let mut engine = GameEngine::new(config, 9).expect("classic maze builds");
        step_until_ready(&mut engine);
        step_until_scatter(&mut engine, 0);
        let player_tile = engine.player_tile();
        engine.pursuers[0].agent.place_on_tile(player_tile);
        engine.step(TICK_MS);
        assert!(!engine.player.dying);
    }

    #[test]
    fn clearing_every_pellet_completes_the_level() {
        let mut engine = engine(10);
        let tiles: Vec<TilePos> = engine.pellet_tiles().collect();
        for tile in tiles {
            assert!(engine.remove_pellet_at(tile).is_some());
        }
        assert_eq!(engine.remaining_pellets(), 0);
        assert_eq!(engine.score(), 186 * 10 + 4 * 50);
        engine.build_snapshot(true);

        step_until_ready(&mut engine);
        engine.step(TICK_MS);
        let events = engine.build_snapshot(true).events;
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == RuntimeEvent::LevelComplete)
                .count(),
            1
        );
        for _ in 0..100 {
            engine.step(TICK_MS);
        }
        assert!(engine.is_level_finished());
        assert_eq!(engine.phase(), SessionPhase::LevelComplete);
        let events = engine.build_snapshot(true).events;
        assert!(!events.contains(&RuntimeEvent::LevelComplete));
    }

    #[test]
    fn capture_pause_on_the_last_pellet_still_finishes_the_level() {
        let mut engine = engine(15);
        step_until_ready(&mut engine);
        step_until_scatter(&mut engine, 0);
        engine.frighten_all_pursuers();
        let tiles: Vec<TilePos> = engine.pellet_tiles().collect();
        for tile in tiles {
            engine.remove_pellet_at(tile);
        }
        let player_tile = engine.player_tile();
        engine.pursuers[0].agent.place_on_tile(player_tile);
        engine.step(TICK_MS);

        assert_eq!(engine.pursuers[0].brain.state(), PursuerState::Eaten);
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::LevelComplete));

        for _ in 0..200 {
            engine.step(TICK_MS);
            if engine.is_ended() {
                break;
            }
        }
        assert!(engine.is_level_finished());
        assert!(!engine.is_game_over());
        let events = engine.build_snapshot(true).events;
        assert!(!events.contains(&RuntimeEvent::LevelComplete));
    }

    #[test]
    fn respawn_tick_leaves_new_pursuers_untouched() {
        let mut engine = engine(16);
        step_until_ready(&mut engine);
        let start = engine.player_start();
        engine.kill_player();
        let mut respawned = false;
        for _ in 0..120 {
            engine.step(TICK_MS);
            if !engine.player.dying {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(engine.player_tile(), start);
        for (pursuer, kind) in engine.pursuers.iter().zip(PursuerKind::ROSTER) {
            assert_eq!(pursuer.brain.state(), PursuerState::Home);
            assert_eq!(pursuer.agent.tile(), spawn_tile(kind, engine.ghost_door()));
        }
    }

    #[test]
    fn later_wait_replaces_earlier_one() {
        let mut engine = engine(11);
        step_until_ready(&mut engine);
        engine.set_wait(5_000, WaitAction::FinishLevel);
        engine.set_wait(100, WaitAction::Resume);
        for _ in 0..5 {
            engine.step(TICK_MS);
        }
        assert_eq!(engine.phase(), SessionPhase::Playing);
        assert!(!engine.is_level_finished());
    }

    #[test]
    fn pellets_eaten_resets_after_respawn() {
        let mut engine = engine(12);
        engine.remove_pellet_at(TilePos::new(12, 19));
        engine.remove_pellet_at(TilePos::new(11, 19));
        assert_eq!(engine.pellets_eaten(), 2);
        engine.restart_player();
        assert_eq!(engine.pellets_eaten(), 0);
        assert_eq!(engine.remaining_pellets(), 188);
    }

    #[test]
    fn custom_layout_builds_a_session() {
        let rows = ["#######", "#..o..#", "#.#-#.#", "#..P..#", "#######"];
        let engine = GameEngine::with_layout(&rows, SimConfig::default(), 14)
            .expect("small layout builds");
        assert_eq!(engine.ghost_door(), TilePos::new(3, 2));
        assert_eq!(engine.player_tile(), TilePos::new(3, 3));
        assert_eq!(engine.remaining_pellets(), 11);
        assert_eq!(engine.pursuers.len(), 4);

        let doorless = ["#####", "#.P.#", "#####"];
        assert_eq!(
            GameEngine::with_layout(&doorless, SimConfig::default(), 14).unwrap_err(),
            LayoutError::MissingGhostDoor
        );
    }

    #[test]
    fn inky_reads_blinky_tile_as_partner() {
        let engine = engine(13);
        let partner = engine.partner_tile(PursuerKind::Inky);
        assert_eq!(partner, Some(TilePos::new(13, 11)));
        assert_eq!(engine.partner_tile(PursuerKind::Pinky), None);
    }
}
