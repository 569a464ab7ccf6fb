//! Titration engine facade.
//!
//! Owns one experiment: the analyte in the flask, the burette controller, the
//! recorded curve and the selected indicator. Derived values (solution
//! composition and pH) are recomputed from the reactants after every
//! mutation, never patched incrementally.

use crate::config::{EngineConfig, ValidatedConfig};
use crate::error::{AppError, AppResult};
use std::sync::Arc;
use ts_chem::{
    IndicatorKind, ReactantSpec, Rgba, SolutionState, TitrantSpec, color_at, compute_ph,
};
use ts_results::{
    ExperimentRecord, ExperimentSettings, ExperimentStore, export_csv, new_experiment_id,
};
use ts_sim::{
    Clock, CurveRecorder, CurveSummary, DispenseConfig, DispensingController, StartOutcome,
    SystemClock, TickOutcome, TitrationPoint,
};

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    /// L
    pub volume_added: f64,
    /// Fraction of the burette still full, `[0, 1]`
    pub burette_fill: f64,
    pub ph: f64,
    pub color: Rgba,
    pub dispensing: bool,
    pub state: SolutionState,
    /// L
    pub equivalence_volume: f64,
    pub point_count: usize,
}

/// Immutable copy of an engine, safe to hand to other threads.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineView {
    pub snapshot: EngineSnapshot,
    pub indicator: IndicatorKind,
    /// Burette capacity (L)
    pub max_volume_l: f64,
    pub points: Arc<[TitrationPoint]>,
}

impl EngineView {
    pub fn curve_summary(&self) -> Option<CurveSummary> {
        CurveSummary::of(&self.points)
    }
}

pub struct TitrationEngine<C: Clock = SystemClock> {
    clock: C,
    analyte: ReactantSpec,
    controller: DispensingController,
    recorder: CurveRecorder,
    indicator: IndicatorKind,
    temperature_k: f64,
    state: SolutionState,
    ph: f64,
}

impl TitrationEngine<SystemClock> {
    /// Engine on the wall clock.
    pub fn new(config: &EngineConfig) -> AppResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> TitrationEngine<C> {
    pub fn with_clock(config: &EngineConfig, clock: C) -> AppResult<Self> {
        Self::from_validated(config.validate()?, clock)
    }

    pub fn from_validated(config: ValidatedConfig, clock: C) -> AppResult<Self> {
        let ValidatedConfig {
            analyte,
            titrant,
            dispense,
            dedup_epsilon_l,
            indicator,
            temperature_k,
        } = config;

        let controller = DispensingController::new(dispense, titrant.with_volume_added(0.0))?;
        let recorder = CurveRecorder::new(dedup_epsilon_l)?;
        let state = SolutionState::derive(&analyte, controller.titrant(), temperature_k);
        let ph = compute_ph(&analyte, controller.titrant());

        tracing::debug!(
            analyte = %analyte.species(),
            titrant = %controller.titrant().species(),
            ph,
            "titration engine created"
        );

        Ok(Self {
            clock,
            analyte,
            controller,
            recorder,
            indicator,
            temperature_k,
            state,
            ph,
        })
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn analyte(&self) -> &ReactantSpec {
        &self.analyte
    }

    pub fn titrant(&self) -> &TitrantSpec {
        self.controller.titrant()
    }

    pub fn dispense_config(&self) -> &DispenseConfig {
        self.controller.config()
    }

    pub fn indicator(&self) -> IndicatorKind {
        self.indicator
    }

    /// Swap the reactants for a new experiment. Implies [`reset`].
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidState`] while dispensing; nothing is changed.
    ///
    /// [`reset`]: TitrationEngine::reset
    pub fn reconfigure(&mut self, analyte: ReactantSpec, titrant: TitrantSpec) -> AppResult<()> {
        if self.controller.is_dispensing() {
            tracing::warn!("reconfigure ignored while dispensing");
            return Err(AppError::InvalidState {
                what: "cannot change reactants while dispensing",
            });
        }
        self.analyte = analyte;
        self.controller.replace_titrant(titrant);
        self.recorder.reset();
        self.refresh();
        tracing::info!(
            analyte = %self.analyte.species(),
            titrant = %self.controller.titrant().species(),
            "reactants reconfigured"
        );
        Ok(())
    }

    /// Validate `config` and apply its reactants and indicator.
    ///
    /// Dispensing parameters are fixed for the lifetime of the engine.
    pub fn apply_config(&mut self, config: &EngineConfig) -> AppResult<()> {
        let validated = config.validate()?;
        self.reconfigure(validated.analyte, validated.titrant)?;
        self.indicator = validated.indicator;
        self.temperature_k = validated.temperature_k;
        self.refresh();
        Ok(())
    }

    pub fn set_indicator(&mut self, indicator: IndicatorKind) {
        self.indicator = indicator;
    }

    /// Stop, empty the burette record and clear the curve in one step.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.recorder.reset();
        self.refresh();
        tracing::info!(ph = self.ph, "titration reset");
    }

    /// Begin dispensing. A no-op while already dispensing or at capacity.
    pub fn start(&mut self) -> StartOutcome {
        let now = self.clock.now_ms();
        let outcome = self.controller.start(now);
        match outcome {
            StartOutcome::Started => {
                // First sample of the curve is the untouched flask.
                if self.recorder.is_empty() {
                    self.recorder.record(TitrationPoint {
                        volume_added: self.controller.volume_added(),
                        ph: self.ph,
                        timestamp: now,
                    });
                }
                tracing::info!(volume_added_l = self.controller.volume_added(), "run started");
            }
            StartOutcome::AlreadyDispensing => tracing::debug!("start ignored: already dispensing"),
            StartOutcome::AtCapacity => tracing::warn!("start ignored: burette at capacity"),
        }
        outcome
    }

    /// Returns `true` if a run was active.
    pub fn stop(&mut self) -> bool {
        let stopped = self.controller.stop();
        if stopped {
            tracing::info!(volume_added_l = self.controller.volume_added(), "run stopped");
        }
        stopped
    }

    /// Advance dispensing to the clock's current time.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now_ms();
        let outcome = self.controller.tick(now, &self.analyte);
        if let Some(point) = outcome.point() {
            self.recorder.record(point);
            self.refresh();
        }
        if let TickOutcome::Completed(point) = outcome {
            tracing::info!(
                volume_added_l = point.volume_added,
                ph = point.ph,
                points = self.recorder.len(),
                "run complete"
            );
        }
        outcome
    }

    fn refresh(&mut self) {
        let titrant = self.controller.titrant();
        self.state = SolutionState::derive(&self.analyte, titrant, self.temperature_k);
        self.ph = compute_ph(&self.analyte, titrant);
    }

    pub fn is_dispensing(&self) -> bool {
        self.controller.is_dispensing()
    }

    pub fn is_at_capacity(&self) -> bool {
        self.controller.is_at_capacity()
    }

    pub fn current_state(&self) -> SolutionState {
        self.state.clone()
    }

    pub fn current_ph(&self) -> f64 {
        self.ph
    }

    pub fn titration_points(&self) -> &[TitrationPoint] {
        self.recorder.points()
    }

    /// L
    pub fn volume_added(&self) -> f64 {
        self.controller.volume_added()
    }

    pub fn indicator_color(&self) -> Rgba {
        color_at(self.ph, self.indicator.profile())
    }

    /// Analytic equivalence volume (L) of the current reactants.
    pub fn equivalence_volume(&self) -> f64 {
        CurveRecorder::equivalence_volume(&self.analyte, self.controller.titrant())
    }

    pub fn curve_summary(&self) -> Option<CurveSummary> {
        self.recorder.summary()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            volume_added: self.controller.volume_added(),
            burette_fill: self.controller.fill_fraction(),
            ph: self.ph,
            color: self.indicator_color(),
            dispensing: self.controller.is_dispensing(),
            state: self.state.clone(),
            equivalence_volume: self.equivalence_volume(),
            point_count: self.recorder.len(),
        }
    }

    pub fn view(&self) -> EngineView {
        self.view_after(None)
    }

    /// Like [`view`](Self::view), but shares `previous`'s points when the
    /// curve has not changed since it was taken.
    pub(crate) fn view_after(&self, previous: Option<&EngineView>) -> EngineView {
        let current = self.recorder.points();
        let points = match previous {
            Some(prev)
                if prev.points.len() == current.len() && prev.points.last() == current.last() =>
            {
                Arc::clone(&prev.points)
            }
            _ => Arc::from(current),
        };
        EngineView {
            snapshot: self.snapshot(),
            indicator: self.indicator,
            max_volume_l: self.controller.config().max_volume_l,
            points,
        }
    }

    /// Immutable copy of the experiment for persistence.
    pub fn to_record(&self, name: &str) -> ExperimentRecord {
        ExperimentRecord {
            id: new_experiment_id(),
            name: name.to_string(),
            timestamp: self.clock.now_ms(),
            titration_points: self.recorder.points().to_vec(),
            final_state: self.state.clone(),
            settings: ExperimentSettings {
                initial_volume: self.analyte.volume(),
                droplet_volume: self.controller.config().droplet_volume_l(),
                species: self.analyte.species().to_string(),
                concentration: self.analyte.concentration(),
            },
        }
    }

    pub fn export_csv(&self) -> String {
        export_csv(self.recorder.points())
    }

    /// Snapshot and save. A failed save leaves the engine untouched.
    pub fn save_to(&self, store: &dyn ExperimentStore, name: &str) -> AppResult<ExperimentRecord> {
        let record = self.to_record(name);
        save_record(store, &record)?;
        Ok(record)
    }
}

pub(crate) fn save_record(
    store: &dyn ExperimentStore,
    record: &ExperimentRecord,
) -> AppResult<()> {
    store.save(record).map_err(|e| {
        tracing::warn!(id = %record.id, error = %e, "failed to save experiment");
        AppError::from(e)
    })?;
    tracing::info!(
        id = %record.id,
        name = %record.name,
        points = record.titration_points.len(),
        "experiment saved"
    );
    Ok(())
}
