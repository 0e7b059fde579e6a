use std::error::Error;
use std::str::FromStr;
use std::time::Duration;

use instant::Instant;

use grove::config::SimConfig;
use grove::gardener::Gardener;
use grove::session::Session;
use grove::tree::canopy;

/// Target frame rate of the headless loop (seconds per frame).
const FRAME_TIME: f64 = 1.0 / 60.0;
/// Longest delta fed to the simulation in one tick (stalls are clamped).
const MAX_FRAME_DT: f64 = 0.25;
/// How often to log FPS and grove status (seconds).
const STATUS_LOG_INTERVAL: f64 = 5.0;
/// Wall-clock limit when `GROVE_MAX_SECONDS` is unset.
const DEFAULT_MAX_SECONDS: f64 = 300.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64, session: &Session) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_min = self.frame_time_min.min(dt);
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= STATUS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.frame_time_min * 1000.0,
                self.frame_time_max * 1000.0,
                self.frame_count,
            );
            log_status(session);
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_min = f64::MAX;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

/// One line for the HUD numbers, one per tree at debug level.
fn log_status(session: &Session) {
    let status = session.status();
    log::info!(
        "[{}] t={:.0}s | dead: {} | saved: {} | water: {}% ({}) | pouring: {} | chain: {}{}",
        session.game_state(),
        session.elapsed(),
        status.dead_count,
        status.trees_saved,
        status.water_percent,
        if status.pot_fullness > 0 { "full" } else { "empty" },
        status.pouring,
        if status.chain_active { "active" } else { "idle" },
        if status.chain_paused { ", paused" } else { "" },
    );
    log::debug!(
        "  chain tree: {:?} | pour target: {:?} | player at ({:.0}, {:.0})",
        session.chain_tree(),
        session.pour_target(),
        session.player().x,
        session.player().y,
    );
    for tree in session.trees() {
        log::debug!(
            "  tree {:?} at ({:.0}, {:.0}) x{:.2}: leaves={} shedding={} regrowing={} regrow={:.2} canopy={}/{} watered={} water={:.1}s falling={}",
            tree.id,
            tree.position.x,
            tree.position.y,
            tree.size,
            tree.has_leaves,
            tree.is_shedding,
            tree.is_regrowing,
            tree.regrow_progress,
            canopy::canopy_layers(tree.regrow_progress).len(),
            canopy::LAYERS.len(),
            tree.is_being_watered,
            tree.pour_accumulated,
            tree.leaves.len(),
        );
    }
}

/// Read an optional environment variable.
fn env_var<T>(name: &str) -> Result<Option<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| -> Box<dyn Error> { format!("{name}={raw:?}: {e}").into() }),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(format!("{name}: {e}").into()),
    }
}

/// Entry point: run one session against the real clock until it ends.
pub fn run() -> Result<(), Box<dyn Error>> {
    let seed = env_var::<u64>("GROVE_SEED")?.unwrap_or_else(|| fastrand::u64(..));
    let max_seconds = env_var::<f64>("GROVE_MAX_SECONDS")?.unwrap_or(DEFAULT_MAX_SECONDS);
    if !(max_seconds > 0.0) {
        return Err(format!("GROVE_MAX_SECONDS must be positive, got {max_seconds}").into());
    }

    let mut session = Session::new(SimConfig::default(), seed);
    let mut gardener = Gardener::new();
    let mut frame_stats = FrameStats::new();
    log::info!("Grove of {} trees planted (seed {seed})", session.population());

    session.start_shed_chain();

    let started = Instant::now();
    let mut last_frame_time = Instant::now();
    loop {
        let now = Instant::now();
        let dt = now.duration_since(last_frame_time).as_secs_f64();
        last_frame_time = now;

        let sim_dt = dt.min(MAX_FRAME_DT) as f32;
        session.tick(sim_dt);
        gardener.update(&mut session, sim_dt);
        frame_stats.record_frame(dt, &session);

        if session.game_over() {
            log::info!("Session over: {:?}", session.outcome());
            log_status(&session);
            break;
        }
        if started.elapsed().as_secs_f64() >= max_seconds {
            log::info!("Time limit of {max_seconds:.0}s reached");
            log_status(&session);
            break;
        }

        let spent = now.elapsed().as_secs_f64();
        if spent < FRAME_TIME {
            std::thread::sleep(Duration::from_secs_f64(FRAME_TIME - spent));
        }
    }

    Ok(())
}
