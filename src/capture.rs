use serde::Serialize;

use crate::types::{PursuerState, TilePos};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
    Nothing,
    PlayerDies,
    PursuerEaten,
}

#[derive(Clone, Copy, Debug)]
pub struct Encounter {
    pub player_tile: TilePos,
    pub player_invulnerable: bool,
    pub pursuer_tile: TilePos,
    pub pursuer_state: PursuerState,
    pub pursuer_invulnerable: bool,
}

pub fn resolve_encounter(encounter: &Encounter) -> CaptureOutcome {
    if encounter.player_tile != encounter.pursuer_tile {
        return CaptureOutcome::Nothing;
    }
    match encounter.pursuer_state {
        PursuerState::Frightened if !encounter.pursuer_invulnerable => CaptureOutcome::PursuerEaten,
        PursuerState::Frightened | PursuerState::Eaten => CaptureOutcome::Nothing,
        _ if encounter.player_invulnerable => CaptureOutcome::Nothing,
        _ => CaptureOutcome::PlayerDies,
    }
}
