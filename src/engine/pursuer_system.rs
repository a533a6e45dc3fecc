use super::*;

use crate::capture::{resolve_encounter, CaptureOutcome, Encounter};
use crate::constants::PURSUER_EAT_SCORE;
use crate::types::PursuerState;

impl GameEngine {
    pub(super) fn spawn_pursuers(&mut self) {
        let timings = Timings::from_config(&self.config);
        self.pursuers = PursuerKind::ROSTER
            .iter()
            .map(|&kind| {
                let profile = PursuerProfile::new(kind, &self.grid, &self.config);
                let brain = PursuerBrain::new(profile, timings);
                let agent = Agent::new(spawn_tile(kind, self.ghost_door), brain.speed(), true);
                PursuerInternal { agent, brain }
            })
            .collect();
    }

    pub(super) fn partner_tile(&self, kind: PursuerKind) -> Option<TilePos> {
        let partner = partner_of(kind)?;
        self.pursuers
            .iter()
            .find(|p| p.brain.profile().kind == partner)
            .map(|p| p.agent.tile())
    }

    pub(super) fn update_pursuer(&mut self, idx: usize, elapsed_ms: u32) {
        if !self.pursuers[idx].agent.begin_tick() {
            return;
        }

        let kind = self.pursuers[idx].brain.profile().kind;
        let tile = self.pursuers[idx].agent.tile();
        let previous = self.pursuers[idx].agent.direction();
        let view = DecisionView {
            grid: &self.grid,
            tile,
            player_tile: self.player.agent.tile(),
            player_direction: self.player.agent.direction(),
            partner_tile: self.partner_tile(kind),
            pellets_eaten: self.pellets_eaten(),
            ghost_door: self.ghost_door,
            start_area: StartArea {
                ghost_door: self.ghost_door,
                player_start: self.player_start,
            },
        };
        let decision = self.pursuers[idx]
            .brain
            .decide(&view, previous, elapsed_ms, &mut self.rng);
        self.pursuers[idx].brain = decision.brain;
        for transition in decision.transitions {
            if transition.from == PursuerState::Eaten {
                self.pursuers[idx].agent.set_invulnerable(false);
            }
            self.record_transition(idx, transition);
        }

        self.check_capture(idx);

        if let Some(transition) = self.pursuers[idx]
            .brain
            .advance_frighten(elapsed_ms, tile, previous)
        {
            self.pursuers[idx].agent.set_invulnerable(false);
            self.record_transition(idx, transition);
        }

        let pursuer = &mut self.pursuers[idx];
        pursuer.agent.set_speed(pursuer.brain.speed());
        let walker = Walker::Pursuer(pursuer.brain.state());
        pursuer
            .agent
            .move_toward(&self.grid, decision.direction, elapsed_ms, walker);
    }

    fn check_capture(&mut self, idx: usize) {
        let pursuer = &self.pursuers[idx];
        let outcome = resolve_encounter(&Encounter {
            player_tile: self.player.agent.tile(),
            player_invulnerable: self.player.agent.is_invulnerable(),
            pursuer_tile: pursuer.agent.tile(),
            pursuer_state: pursuer.brain.state(),
            pursuer_invulnerable: pursuer.agent.is_invulnerable(),
        });

        match outcome {
            CaptureOutcome::Nothing => {}
            CaptureOutcome::PursuerEaten => {
                self.set_wait(self.config.pursuer_eaten_pause_ms, WaitAction::Resume);
                let tile = self.pursuers[idx].agent.tile();
                let dir = self.pursuers[idx].agent.direction();
                if let Some(transition) = self.pursuers[idx].brain.capture(tile, dir) {
                    self.pursuers[idx].agent.set_invulnerable(true);
                    self.record_transition(idx, transition);
                }
                self.increase_score(PURSUER_EAT_SCORE);
                let kind = self.pursuers[idx].brain.profile().kind;
                info!(pursuer = kind.name(), score = self.score, "pursuer eaten");
                self.events.push(RuntimeEvent::PursuerEaten {
                    kind,
                    score: PURSUER_EAT_SCORE,
                });
            }
            CaptureOutcome::PlayerDies => self.kill_player(),
        }
    }
}
