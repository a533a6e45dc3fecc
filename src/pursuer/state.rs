use serde::Serialize;

use crate::types::PursuerState;

/// Everything that can push a pursuer from one state to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Pellets eaten since the level (re)started reached the release threshold.
    PelletsReached,
    /// Standing on the tile just above the gate.
    ReachedGate,
    /// The shared scatter/chase timer ran out.
    PhaseElapsed,
    /// The player ate a power pellet.
    Frighten,
    FrightenExpired,
    /// The player caught a vulnerable pursuer.
    Captured,
    /// Standing on the tile just below the gate.
    ReachedHome,
}

impl Trigger {
    pub const ALL: [Trigger; 7] = [
        Trigger::PelletsReached,
        Trigger::ReachedGate,
        Trigger::PhaseElapsed,
        Trigger::Frighten,
        Trigger::FrightenExpired,
        Trigger::Captured,
        Trigger::ReachedHome,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: PursuerState,
    pub to: PursuerState,
    pub trigger: Trigger,
}

/// Pure transition table. `None` means the trigger is not handled in `state`
/// and the pursuer keeps its current state.
pub fn next_state(state: PursuerState, trigger: Trigger) -> Option<PursuerState> {
    use PursuerState::*;
    match (state, trigger) {
        (Home, Trigger::PelletsReached) => Some(LeavingHome),
        (LeavingHome, Trigger::ReachedGate) => Some(Scatter),
        (Scatter, Trigger::PhaseElapsed) => Some(Chase),
        (Chase, Trigger::PhaseElapsed) => Some(Scatter),
        (Chase | Scatter | Frightened, Trigger::Frighten) => Some(Frightened),
        (Frightened, Trigger::FrightenExpired) => Some(Chase),
        (Chase | Scatter | Frightened, Trigger::Captured) => Some(Eaten),
        (Eaten, Trigger::ReachedHome) => Some(LeavingHome),
        _ => None,
    }
}

pub fn resulting_state(state: PursuerState, trigger: Trigger) -> PursuerState {
    next_state(state, trigger).unwrap_or(state)
}

/// Entering one of these states turns the pursuer around.
pub fn reverses_on_entry(state: PursuerState) -> bool {
    matches!(
        state,
        PursuerState::Chase | PursuerState::Frightened | PursuerState::Scatter
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use PursuerState::*;

    #[test]
    fn every_state_and_trigger_has_one_outcome() {
        for state in PursuerState::ALL {
            for trigger in Trigger::ALL {
                let first = resulting_state(state, trigger);
                let second = resulting_state(state, trigger);
                assert_eq!(first, second, "{state:?} + {trigger:?}");
                if next_state(state, trigger).is_none() {
                    assert_eq!(first, state, "{state:?} + {trigger:?} should be ignored");
                }
            }
        }
    }

    #[test]
    fn documented_transitions() {
        assert_eq!(next_state(Home, Trigger::PelletsReached), Some(LeavingHome));
        assert_eq!(next_state(LeavingHome, Trigger::ReachedGate), Some(Scatter));
        assert_eq!(next_state(Scatter, Trigger::PhaseElapsed), Some(Chase));
        assert_eq!(next_state(Chase, Trigger::PhaseElapsed), Some(Scatter));
        assert_eq!(next_state(Frightened, Trigger::FrightenExpired), Some(Chase));
        assert_eq!(next_state(Eaten, Trigger::ReachedHome), Some(LeavingHome));
    }

    #[test]
    fn frighten_only_reaches_roaming_states() {
        for state in [Chase, Scatter, Frightened] {
            assert_eq!(next_state(state, Trigger::Frighten), Some(Frightened));
            assert_eq!(next_state(state, Trigger::Captured), Some(Eaten));
        }
        for state in [Home, LeavingHome, Eaten] {
            assert_eq!(next_state(state, Trigger::Frighten), None);
            assert_eq!(next_state(state, Trigger::Captured), None);
        }
    }

    #[test]
    fn home_ignores_phase_timer() {
        assert_eq!(resulting_state(Home, Trigger::PhaseElapsed), Home);
        assert_eq!(resulting_state(Eaten, Trigger::PhaseElapsed), Eaten);
        assert_eq!(resulting_state(Frightened, Trigger::PhaseElapsed), Frightened);
    }
}
