use super::*;

use crate::constants::{DEATH_FRAMES, DEATH_FRAME_MS};

impl GameEngine {
    /// Returns true when the player respawned this tick; the rest of the
    /// frame is skipped so the fresh pursuers wait for the ready delay.
    pub(super) fn update_player(&mut self, elapsed_ms: u32) -> bool {
        if !self.player.agent.begin_tick() {
            return false;
        }

        if self.player.dying {
            if self.advance_death(elapsed_ms) {
                self.restart_player();
                return true;
            }
            return false;
        }

        self.eat_pellet_under_player();

        let requested = self
            .player
            .input
            .unwrap_or_else(|| self.player.agent.direction());
        self.player
            .agent
            .move_toward(&self.grid, requested, elapsed_ms, Walker::Player);
        false
    }

    fn eat_pellet_under_player(&mut self) {
        let tile = self.player.agent.tile();
        let Some(power) = self.remove_pellet_at(tile) else {
            return;
        };
        if power {
            self.frighten_all_pursuers();
        }
        self.player.agent.set_frame_skips(frame_skips_for(power));
    }

    pub(super) fn kill_player(&mut self) {
        for pursuer in &mut self.pursuers {
            pursuer.agent.set_active(false);
        }
        self.player.dying = true;
        self.player.death = DeathClock::default();
        self.player.agent.set_invulnerable(true);
        info!(
            tile_x = self.player.agent.tile().x,
            tile_y = self.player.agent.tile().y,
            "player caught"
        );
        self.events.push(RuntimeEvent::PlayerDied);
    }

    /// Returns true once the death sequence has played out.
    fn advance_death(&mut self, elapsed_ms: u32) -> bool {
        let death = &mut self.player.death;
        death.elapsed_ms += elapsed_ms as i32;
        if death.elapsed_ms <= DEATH_FRAME_MS {
            return false;
        }
        death.elapsed_ms = 0;
        death.frame += 1;
        if death.frame <= DEATH_FRAMES {
            return false;
        }

        self.player.death = DeathClock::default();
        self.player.dying = false;
        self.player.agent.set_invulnerable(self.config.god_mode);
        self.player.agent.reset_direction();
        true
    }

    pub(super) fn restart_player(&mut self) {
        self.lose_life();
        self.player.agent.place_on_tile(self.player_start);
        self.spawn_pursuers();
        self.pellet_baseline = self.remaining_pellets();
        self.ready = false;
        self.ready_elapsed_ms = 0;
    }
}
