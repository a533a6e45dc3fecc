pub const TICK_RATE: u32 = 30;
pub const TICK_MS: u32 = 1000 / TICK_RATE;

pub const TILE_SIZE: i32 = 16;
pub const TILE_SIZE_F: f32 = TILE_SIZE as f32;
pub const HALF_TILE_F: f32 = TILE_SIZE_F / 2.0;

// Look-ahead probe offsets, relative to the top-left corner of the 16x16 agent box.
pub const PROBE_UP: (f32, f32) = (8.0, -1.0);
pub const PROBE_DOWN: (f32, f32) = (8.0, 17.0);
pub const PROBE_LEFT: (f32, f32) = (-1.0, 8.0);
pub const PROBE_RIGHT: (f32, f32) = (17.0, 8.0);

pub const PLAYER_SPEED: f32 = 0.1;
pub const PURSUER_SPEED: f32 = 0.1;
pub const PURSUER_FRIGHTENED_SPEED: f32 = 0.07;
pub const PURSUER_EATEN_SPEED: f32 = 0.15;
pub const SLOW_TILE_FACTOR: f32 = 0.5;

pub const SCATTER_MS: u32 = 5_000;
pub const CHASE_MS: u32 = 20_000;
pub const MAX_PHASE_CHANGES: u32 = 3;
pub const FRIGHTEN_MS: u32 = 3_000;
pub const FRIGHTEN_BLINK_WARNING_MS: u32 = 1_000;
pub const FRIGHTEN_BLINK_MS: u32 = 100;

pub const ANIMATION_FRAME_MS: u32 = 100;
pub const DEATH_FRAME_MS: i32 = 100;
pub const DEATH_LEAD_IN_MS: i32 = -400;
pub const DEATH_FRAMES: u32 = 10;

pub const READY_DELAY_MS: u32 = 1_000;
pub const PURSUER_EATEN_PAUSE_MS: u32 = 1_000;
pub const LEVEL_CLEAR_PAUSE_MS: u32 = 2_000;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const PURSUER_EAT_SCORE: u32 = 200;
pub const PELLET_FRAME_SKIPS: u32 = 1;
pub const POWER_PELLET_FRAME_SKIPS: u32 = 3;
pub const STARTING_LIVES: i32 = 2;

pub const BLINKY_RELEASE_PELLETS: u32 = 0;
pub const PINKY_RELEASE_PELLETS: u32 = 30;
pub const INKY_RELEASE_PELLETS: u32 = 50;
pub const CLYDE_RELEASE_PELLETS: u32 = 70;

pub const AMBUSH_LOOKAHEAD: i32 = 4;
pub const FLANK_LOOKAHEAD: i32 = 2;
pub const SHY_DISTANCE: i32 = 8;

/// Margin between the grid edge and the region where pursuers steer.
pub const PLAYABLE_MARGIN: i32 = 2;
