use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase_sim::config::SimConfig;
use maze_chase_sim::engine::GameEngine;
use maze_chase_sim::grid::{Grid, Walker};
use maze_chase_sim::rng::Rng;
use maze_chase_sim::types::{Direction, RuntimeEvent, Snapshot, TilePos};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICK_LIMIT: u64 = 30 * 60 * 10;
const WANDER_PERCENT: i32 = 15;
const STALL_TICKS: u32 = 20;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long, default_value_t = 1)]
    runs: u32,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    trace_pursuers: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunOutcome {
    LevelComplete,
    GameOver,
    TickLimit,
}

impl RunOutcome {
    fn key(self) -> &'static str {
        match self {
            RunOutcome::LevelComplete => "level_complete",
            RunOutcome::GameOver => "game_over",
            RunOutcome::TickLimit => "tick_limit",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    outcome: RunOutcome,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    score: u32,
    lives: i32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "pelletsRemaining")]
    pellets_remaining: usize,
    #[serde(rename = "powerPellets")]
    power_pellets: u32,
    #[serde(rename = "pursuersEaten")]
    pursuers_eaten: u32,
    deaths: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunReport {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    config: SimConfig,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Drives the player toward the nearest pellet, one decision per tile entered.
#[derive(Clone, Debug)]
struct Autopilot {
    rng: Rng,
    heading: Option<Direction>,
    last_tile: Option<TilePos>,
    stalled: u32,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: Rng::new(seed ^ 0x9e37_79b9),
            heading: None,
            last_tile: None,
            stalled: 0,
        }
    }

    fn steer(&mut self, engine: &GameEngine) -> Option<Direction> {
        let tile = engine.player_tile();
        if self.last_tile == Some(tile) && self.heading.is_some() {
            self.stalled += 1;
            if self.stalled < STALL_TICKS {
                return self.heading;
            }
        }
        self.stalled = 0;
        self.last_tile = Some(tile);

        let candidates = open_directions(engine.grid(), tile, engine.player_direction());
        let choice = if self.rng.int(0, 99) < WANDER_PERCENT {
            self.rng.pick(&candidates)
        } else {
            nearest_pellet(tile, engine.pellet_tiles()).and_then(|target| {
                candidates
                    .iter()
                    .copied()
                    .min_by_key(|dir| tile.offset(*dir).manhattan(target))
            })
        };
        self.heading = choice.or(self.heading);
        self.heading
    }
}

fn open_directions(grid: &Grid, tile: TilePos, heading: Direction) -> Vec<Direction> {
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|dir| grid.is_walkable_at(tile.offset(*dir), Walker::Player))
        .collect();
    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| *dir != heading.opposite())
        .collect();
    if forward.is_empty() {
        open
    } else {
        forward
    }
}

fn nearest_pellet(from: TilePos, pellets: impl Iterator<Item = TilePos>) -> Option<TilePos> {
    pellets.min_by_key(|pellet| from.manhattan(*pellet))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let started_at = now_iso();
    let base_seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, Utc::now().timestamp_millis()));

    let config = match cli.config.as_deref() {
        Some(path) => match SimConfig::from_json_file(path) {
            Ok(config) => config,
            Err(error) => {
                emit_log(
                    "error",
                    "config_load_failed",
                    &match_id,
                    None,
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    let tick_limit = cli.ticks.unwrap_or(DEFAULT_TICK_LIMIT).max(1);

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for run in 0..cli.runs.max(1) {
        let seed = base_seed.wrapping_add(run);
        emit_log(
            "info",
            "run_started",
            &match_id,
            Some(seed),
            None,
            json!({ "run": run, "tickLimit": tick_limit }),
        );

        let engine = match GameEngine::new(config.clone(), seed) {
            Ok(engine) => engine,
            Err(error) => {
                emit_log(
                    "error",
                    "maze_build_failed",
                    &match_id,
                    Some(seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };
        let report = run_simulation(engine, run, seed, tick_limit, cli.trace_pursuers, &match_id);

        for anomaly in &report.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        if !report.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += report.anomaly_records.len();
        *outcome_counts
            .entry(report.result.outcome.key().to_string())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "run_finished",
            &match_id,
            Some(seed),
            Some(report.result.ticks),
            json!({
                "outcome": report.result.outcome,
                "score": report.result.score,
                "lives": report.result.lives,
                "anomalyCount": report.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&report.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &match_id,
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(report.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        started_at,
        now_iso(),
        config,
        results,
        outcome_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "match_finished",
        &match_id,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_simulation(
    mut engine: GameEngine,
    run: u32,
    seed: u32,
    tick_limit: u64,
    trace_pursuers: bool,
    match_id: &str,
) -> RunReport {
    let tick_ms = engine.config.tick_ms;
    let mut autopilot = Autopilot::new(seed);
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous_tiles: Option<Vec<TilePos>> = None;
    let mut pellets_eaten = 0;
    let mut power_pellets = 0;
    let mut pursuers_eaten = 0;
    let mut deaths = 0;
    let mut last_snapshot: Option<Snapshot> = None;

    while !engine.is_ended() && engine.tick_counter() < tick_limit {
        let steer = autopilot.steer(&engine);
        engine.set_player_input(steer);
        engine.step(tick_ms);
        let snapshot = engine.build_snapshot(true);

        let respawned = snapshot
            .events
            .iter()
            .any(|event| matches!(event, RuntimeEvent::LifeLost { .. }));
        let baseline = if respawned {
            None
        } else {
            previous_tiles.as_deref()
        };
        for message in collect_snapshot_anomalies(engine.grid(), &snapshot, baseline) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        previous_tiles = Some(tracked_tiles(&snapshot));

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletEaten { power, .. } => {
                    pellets_eaten += 1;
                    if *power {
                        power_pellets += 1;
                    }
                }
                RuntimeEvent::PursuerEaten { .. } => pursuers_eaten += 1,
                RuntimeEvent::PlayerDied => deaths += 1,
                RuntimeEvent::PursuerStateChanged { kind, from, to } if trace_pursuers => {
                    emit_log(
                        "debug",
                        "pursuer_state_changed",
                        match_id,
                        Some(seed),
                        Some(snapshot.tick),
                        json!({ "pursuer": kind, "from": from, "to": to }),
                    );
                }
                _ => {}
            }
        }
        last_snapshot = Some(snapshot);
    }

    let outcome = if engine.is_game_over() {
        RunOutcome::GameOver
    } else if engine.is_level_finished() {
        RunOutcome::LevelComplete
    } else {
        RunOutcome::TickLimit
    };
    let (ticks, duration_ms) = last_snapshot
        .as_ref()
        .map(|snapshot| (snapshot.tick, snapshot.elapsed_ms))
        .unwrap_or((0, 0));

    RunReport {
        result: RunResultLine {
            run,
            seed,
            outcome,
            ticks,
            duration_ms,
            score: engine.score(),
            lives: engine.lives(),
            pellets_eaten,
            pellets_remaining: engine.remaining_pellets(),
            power_pellets,
            pursuers_eaten,
            deaths,
            anomalies,
        },
        anomaly_records,
    }
}

fn tracked_tiles(snapshot: &Snapshot) -> Vec<TilePos> {
    std::iter::once(snapshot.player.tile)
        .chain(snapshot.pursuers.iter().map(|pursuer| pursuer.tile))
        .collect()
}

/// A move of more than one tile that is not a screen wrap.
fn is_tile_jump(grid: &Grid, from: TilePos, to: TilePos) -> bool {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let wrapped = (dx > grid.width() / 2 && dy <= 1) || (dy > grid.height() / 2 && dx <= 1);
    from.manhattan(to) > 1 && !wrapped
}

fn collect_snapshot_anomalies(
    grid: &Grid,
    snapshot: &Snapshot,
    previous_tiles: Option<&[TilePos]>,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    let player = &snapshot.player;
    if grid.is_wall(player.tile) {
        anomalies.push(format!("player inside wall at ({}, {})", player.tile.x, player.tile.y));
    }
    if grid.tile_at(player.tile).is_some_and(|tile| tile.is_ghost_door) {
        anomalies.push(format!("player on ghost door at ({}, {})", player.tile.x, player.tile.y));
    }

    for pursuer in snapshot.pursuers.iter().filter(|pursuer| pursuer.active) {
        if grid.is_wall(pursuer.tile) {
            anomalies.push(format!(
                "{} inside wall at ({}, {})",
                pursuer.kind.name(),
                pursuer.tile.x,
                pursuer.tile.y
            ));
        }
    }

    if let Some(previous) = previous_tiles {
        let names = std::iter::once("player")
            .chain(snapshot.pursuers.iter().map(|pursuer| pursuer.kind.name()));
        for ((name, from), to) in names.zip(previous).zip(tracked_tiles(snapshot)) {
            if is_tile_jump(grid, *from, to) {
                anomalies.push(format!(
                    "{name} jumped from ({}, {}) to ({}, {})",
                    from.x, from.y, to.x, to.y
                ));
            }
        }
    }

    if snapshot.lives < -1 {
        anomalies.push(format!("lives below game-over floor: {}", snapshot.lives));
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    config: SimConfig,
    runs: Vec<RunResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let average_score = if run_count == 0 {
        0
    } else {
        (runs.iter().map(|run| run.score as u64).sum::<u64>() / run_count as u64) as u32
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_score,
        outcome_counts,
        config,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: now_iso(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
