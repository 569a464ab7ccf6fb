//! Batch titration on a virtual clock.
//!
//! Steps the engine one nominal tick period at a time without sleeping, so a
//! full 100 mL run finishes in milliseconds with the same curve a real-time
//! run would record.

use crate::config::EngineConfig;
use crate::engine::TitrationEngine;
use crate::error::{AppError, AppResult};
use std::time::Instant;
use ts_core::units::{in_liters, ml};
use ts_sim::{Clock, ManualClock, StartOutcome, SystemClock, TickOutcome};

#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Stop once this much titrant (mL) has been added. Runs to burette
    /// capacity when `None`.
    pub stop_at_ml: Option<f64>,
    /// Virtual start time (ms since the epoch). Defaults to the wall clock.
    pub start_ms: Option<f64>,
    /// Emit a progress event every this many ticks; 0 disables progress.
    pub progress_every: usize,
}

#[derive(Debug, Clone)]
pub struct SimulateProgress {
    pub ticks: usize,
    /// mL
    pub volume_added_ml: f64,
    pub ph: f64,
    pub fraction_complete: f64,
}

pub struct SimulateResponse {
    pub engine: TitrationEngine<ManualClock>,
    pub ticks: usize,
    pub elapsed_wall_s: f64,
}

/// Titrant volume (L) at which a run ends: `stop_at_ml` capped at the
/// burette capacity, or the capacity itself when no stop is requested.
pub fn stop_volume_l(stop_at_ml: Option<f64>, max_volume_l: f64) -> AppResult<f64> {
    match stop_at_ml {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(AppError::Configuration(format!(
            "stop volume must be positive, got {v} mL"
        ))),
        Some(v) => Ok(in_liters(ml(v)).min(max_volume_l)),
        None => Ok(max_volume_l),
    }
}

/// Run a complete titration described by `config`.
pub fn simulate(config: &EngineConfig, options: &SimulateOptions) -> AppResult<SimulateResponse> {
    simulate_with_progress(config, options, None)
}

/// Run a complete titration and stream progress events.
pub fn simulate_with_progress(
    config: &EngineConfig,
    options: &SimulateOptions,
    mut progress_cb: Option<&mut dyn FnMut(SimulateProgress)>,
) -> AppResult<SimulateResponse> {
    let started = Instant::now();
    let validated = config.validate()?;

    let target_l = stop_volume_l(options.stop_at_ml, validated.dispense.max_volume_l)?;
    let period_ms = validated.dispense.tick_period_ms;

    let clock = ManualClock::new(options.start_ms.unwrap_or_else(|| SystemClock.now_ms()));
    let mut engine = TitrationEngine::from_validated(validated, clock.clone())?;

    if engine.start() != StartOutcome::Started {
        return Err(AppError::InvalidState {
            what: "engine did not start",
        });
    }

    let mut ticks = 0usize;
    loop {
        clock.advance(period_ms);
        let outcome = engine.tick();
        ticks += 1;

        if options.progress_every > 0 && ticks % options.progress_every == 0 {
            if let Some(cb) = progress_cb.as_deref_mut() {
                cb(SimulateProgress {
                    ticks,
                    volume_added_ml: engine.volume_added() * 1000.0,
                    ph: engine.current_ph(),
                    fraction_complete: (engine.volume_added() / target_l).clamp(0.0, 1.0),
                });
            }
        }

        match outcome {
            TickOutcome::Advanced(point) if point.volume_added >= target_l => {
                engine.stop();
                break;
            }
            TickOutcome::Advanced(_) => {}
            TickOutcome::Completed(_) | TickOutcome::Idle => break,
        }
    }

    let elapsed_wall_s = started.elapsed().as_secs_f64();
    tracing::info!(
        ticks,
        points = engine.titration_points().len(),
        volume_added_l = engine.volume_added(),
        elapsed_wall_s,
        "simulation finished"
    );

    Ok(SimulateResponse {
        engine,
        ticks,
        elapsed_wall_s,
    })
}
