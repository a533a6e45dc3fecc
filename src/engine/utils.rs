use crate::constants::{
    PELLET_FRAME_SKIPS, PELLET_SCORE, POWER_PELLET_FRAME_SKIPS, POWER_PELLET_SCORE,
};
use crate::types::PursuerKind;

pub(super) fn pellet_score(power: bool) -> u32 {
    if power {
        POWER_PELLET_SCORE
    } else {
        PELLET_SCORE
    }
}

pub(super) fn frame_skips_for(power: bool) -> u32 {
    if power {
        POWER_PELLET_FRAME_SKIPS
    } else {
        PELLET_FRAME_SKIPS
    }
}

/// The pursuer whose tile feeds this one's chase rule.
pub(super) fn partner_of(kind: PursuerKind) -> Option<PursuerKind> {
    match kind {
        PursuerKind::Inky => Some(PursuerKind::Blinky),
        _ => None,
    }
}
