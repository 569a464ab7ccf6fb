//! Burette dispensing state machine.
//!
//! Phases: `Idle -> Dispensing -> Idle`. A run ends either on [`stop`] or
//! when the dispensed volume reaches the burette capacity, in which case
//! [`tick`] reports [`TickOutcome::Completed`].
//!
//! Dispensed volume is integrated from the elapsed clock time between
//! ticks, so the result does not depend on how regularly ticks arrive.
//! Every entry into `Dispensing` restarts the integration clock; a paused
//! interval is never counted as flow.
//!
//! [`stop`]: DispensingController::stop
//! [`tick`]: DispensingController::tick

use crate::error::{SimError, SimResult};
use crate::recorder::TitrationPoint;
use serde::{Deserialize, Serialize};
use ts_chem::{ReactantSpec, TitrantSpec, compute_ph};
use ts_core::units::{in_seconds, millis};

/// Burette parameters for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispenseConfig {
    /// Titrant flow rate (L/s)
    pub flow_rate_l_per_s: f64,
    /// Burette capacity (L); dispensing stops here
    pub max_volume_l: f64,
    /// Nominal tick period (ms). Used for scheduling only, never for
    /// integration.
    pub tick_period_ms: f64,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            flow_rate_l_per_s: 0.5e-3,
            max_volume_l: 0.100,
            tick_period_ms: 50.0,
        }
    }
}

impl DispenseConfig {
    /// Check that every parameter is positive and finite.
    pub fn validate(&self) -> SimResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.flow_rate_l_per_s) {
            return Err(SimError::InvalidArg {
                what: "flow rate must be positive",
            });
        }
        if !positive(self.max_volume_l) {
            return Err(SimError::InvalidArg {
                what: "burette capacity must be positive",
            });
        }
        if !positive(self.tick_period_ms) {
            return Err(SimError::InvalidArg {
                what: "tick period must be positive",
            });
        }
        Ok(())
    }

    /// Volume (L) dispensed during one nominal tick.
    pub fn droplet_volume_l(&self) -> f64 {
        self.flow_rate_l_per_s * in_seconds(millis(self.tick_period_ms))
    }
}

/// Transient state of an active run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispensingSession {
    pub last_tick_ms: f64,
    pub flow_rate_l_per_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispensePhase {
    Idle,
    Dispensing(DispensingSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A run was already active; nothing changed.
    AlreadyDispensing,
    /// The burette is already at capacity; stays idle.
    AtCapacity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not dispensing; the tick was ignored.
    Idle,
    /// Volume advanced; the run continues.
    Advanced(TitrationPoint),
    /// Volume reached capacity; the controller is idle again.
    Completed(TitrationPoint),
}

impl TickOutcome {
    pub fn point(&self) -> Option<TitrationPoint> {
        match self {
            TickOutcome::Idle => None,
            TickOutcome::Advanced(p) | TickOutcome::Completed(p) => Some(*p),
        }
    }
}

/// Owns the titrant and the dispensed volume for one experiment.
#[derive(Debug, Clone)]
pub struct DispensingController {
    config: DispenseConfig,
    titrant: TitrantSpec,
    phase: DispensePhase,
}

impl DispensingController {
    /// # Errors
    ///
    /// Returns error if `config` fails [`DispenseConfig::validate`].
    pub fn new(config: DispenseConfig, titrant: TitrantSpec) -> SimResult<Self> {
        config.validate()?;
        let mut titrant = titrant;
        let clamped = titrant.volume_added().min(config.max_volume_l);
        titrant.set_volume_added(clamped);
        Ok(Self {
            config,
            titrant,
            phase: DispensePhase::Idle,
        })
    }

    pub fn config(&self) -> &DispenseConfig {
        &self.config
    }

    pub fn titrant(&self) -> &TitrantSpec {
        &self.titrant
    }

    pub fn phase(&self) -> DispensePhase {
        self.phase
    }

    pub fn is_dispensing(&self) -> bool {
        matches!(self.phase, DispensePhase::Dispensing(_))
    }

    pub fn volume_added(&self) -> f64 {
        self.titrant.volume_added()
    }

    pub fn is_at_capacity(&self) -> bool {
        self.titrant.volume_added() >= self.config.max_volume_l
    }

    /// Fraction of the burette still full, in `[0, 1]`.
    pub fn fill_fraction(&self) -> f64 {
        (1.0 - self.titrant.volume_added() / self.config.max_volume_l).clamp(0.0, 1.0)
    }

    /// Enter `Dispensing`, restarting the integration clock at `now_ms`.
    pub fn start(&mut self, now_ms: f64) -> StartOutcome {
        if self.is_dispensing() {
            return StartOutcome::AlreadyDispensing;
        }
        if self.is_at_capacity() {
            return StartOutcome::AtCapacity;
        }
        self.phase = DispensePhase::Dispensing(DispensingSession {
            last_tick_ms: now_ms,
            flow_rate_l_per_s: self.config.flow_rate_l_per_s,
        });
        tracing::debug!(
            volume_added_l = self.titrant.volume_added(),
            "dispensing started"
        );
        StartOutcome::Started
    }

    /// Return to `Idle`. Any interval since the last tick is discarded.
    ///
    /// Returns `true` if a run was active.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_dispensing();
        self.phase = DispensePhase::Idle;
        if was_running {
            tracing::debug!(
                volume_added_l = self.titrant.volume_added(),
                "dispensing stopped"
            );
        }
        was_running
    }

    /// Integrate flow up to `now_ms` and recompute pH.
    pub fn tick(&mut self, now_ms: f64, analyte: &ReactantSpec) -> TickOutcome {
        let DispensePhase::Dispensing(mut session) = self.phase else {
            return TickOutcome::Idle;
        };

        // A clock that steps backwards contributes no flow.
        let delta_s = in_seconds(millis((now_ms - session.last_tick_ms).max(0.0)));
        let volume = (self.titrant.volume_added() + session.flow_rate_l_per_s * delta_s)
            .clamp(0.0, self.config.max_volume_l);
        self.titrant.set_volume_added(volume);
        session.last_tick_ms = now_ms;

        let point = TitrationPoint {
            volume_added: volume,
            ph: compute_ph(analyte, &self.titrant),
            timestamp: now_ms,
        };

        if self.is_at_capacity() {
            self.phase = DispensePhase::Idle;
            tracing::info!(volume_added_l = volume, "burette capacity reached");
            TickOutcome::Completed(point)
        } else {
            self.phase = DispensePhase::Dispensing(session);
            TickOutcome::Advanced(point)
        }
    }

    /// Back to an untouched burette: idle, nothing dispensed.
    pub fn reset(&mut self) {
        self.phase = DispensePhase::Idle;
        self.titrant.set_volume_added(0.0);
    }

    /// Swap in a new titrant. Stops any run and zeroes the dispensed volume.
    pub fn replace_titrant(&mut self, titrant: TitrantSpec) {
        self.titrant = titrant;
        self.reset();
    }
}
